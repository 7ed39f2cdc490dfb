use futures::StreamExt;
use grid_client::{domain::CapacitySummary, summarize};
use tokio::{
    io::{AsyncWrite, AsyncWriteExt},
    sync::Mutex,
};

use crate::pipeline::{admit, Envelope, FacilityRows, PipelineError, Sink};

/// Writes one JSON line per normalized row and returns the chain summary.
pub struct NdjsonSink<W> {
    writer: Mutex<W>,
}

impl<W> NdjsonSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }
}

#[async_trait::async_trait]
impl<W> Sink<FacilityRows> for NdjsonSink<W>
where
    W: AsyncWrite + Unpin + Send,
{
    type Output = CapacitySummary;

    async fn run<S>(&self, mut input: S) -> Result<Self::Output, PipelineError>
    where
        S: futures::Stream<Item = Result<Envelope<FacilityRows>, PipelineError>> + Send + Unpin + 'static,
    {
        let mut writer = self.writer.lock().await;
        let mut written = Vec::new();

        while let Some(item) = input.next().await {
            let Some(env) = admit(item)? else {
                continue;
            };

            for row in env.payload {
                let mut line = serde_json::to_vec(&row)
                    .map_err(|e| PipelineError::Sink(format!("failed to encode row: {e}")))?;
                line.push(b'\n');
                writer
                    .write_all(&line)
                    .await
                    .map_err(|e| PipelineError::Sink(format!("failed to write row: {e}")))?;
                written.push(row);
            }
        }

        writer
            .flush()
            .await
            .map_err(|e| PipelineError::Sink(format!("failed to flush output: {e}")))?;

        Ok(summarize(&written))
    }
}
