use futures::StreamExt;
use grid_client::domain::NormalizedFacilityRow;

use crate::pipeline::{admit, Envelope, FacilityRows, PipelineError, Sink};

/// Collects every normalized row, in record order, for the caller to keep.
#[derive(Debug, Clone, Copy, Default)]
pub struct MemorySink;

#[async_trait::async_trait]
impl Sink<FacilityRows> for MemorySink {
    type Output = Vec<NormalizedFacilityRow>;

    async fn run<S>(&self, mut input: S) -> Result<Self::Output, PipelineError>
    where
        S: futures::Stream<Item = Result<Envelope<FacilityRows>, PipelineError>> + Send + Unpin + 'static,
    {
        let mut rows = Vec::new();

        while let Some(item) = input.next().await {
            if let Some(env) = admit(item)? {
                rows.extend(env.payload);
            }
        }

        Ok(rows)
    }
}
