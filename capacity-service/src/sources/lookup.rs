use std::sync::Arc;

use async_stream::try_stream;
use grid_client::{domain::RawFacilityRecord, GridDataSource, LookupQuery};

use crate::pipeline::{Envelope, EnvelopeStream, PipelineError, Source};

/// Runs one capacity lookup and streams the records it returned.
///
/// A failed lookup surfaces as a single `PipelineError::Source` item.
pub struct LookupSource {
    grid: Arc<dyn GridDataSource>,
    query: LookupQuery,
}

impl LookupSource {
    pub fn new(grid: Arc<dyn GridDataSource>, query: LookupQuery) -> Self {
        Self { grid, query }
    }
}

#[async_trait::async_trait]
impl Source<RawFacilityRecord> for LookupSource {
    async fn stream(&self) -> EnvelopeStream<RawFacilityRecord> {
        let grid = self.grid.clone();
        let query = self.query.clone();
        let s = try_stream! {
            let records = grid.lookup(&query).await.map_err(PipelineError::from)?;
            if records.is_empty() {
                tracing::info!(query = %query, "no data found");
            }

            for (seq, record) in records.into_iter().enumerate() {
                yield Envelope::new(seq, record);
            }
        };

        Box::pin(s)
    }
}
