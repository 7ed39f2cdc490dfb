use std::{pin::Pin, sync::Arc, time::SystemTime};

use futures::{Stream, StreamExt};
use grid_client::{
    domain::{NormalizedFacilityRow, RawFacilityRecord},
    CapacityNormalizer, SourceError,
};

#[derive(Debug, Clone)]
pub struct Envelope<T> {
    pub payload: T,
    /// Position of the originating record within its lookup.
    pub seq: usize,
    pub received_at: SystemTime,
}

impl<T> Envelope<T> {
    pub fn new(seq: usize, payload: T) -> Self {
        Self {
            payload,
            seq,
            received_at: SystemTime::now(),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Envelope<U> {
        Envelope {
            payload: f(self.payload),
            seq: self.seq,
            received_at: self.received_at,
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    #[error("source error: {0}")]
    Source(#[from] SourceError),
    #[error("input error: {0}")]
    Input(String),
    #[error("transform error: {0}")]
    Transform(String),
    #[error("sink error: {0}")]
    Sink(String),
}

/// Rows produced from one facility record.
pub type FacilityRows = Vec<NormalizedFacilityRow>;

pub type EnvelopeStream<T> = Pin<Box<dyn Stream<Item = Result<Envelope<T>, PipelineError>> + Send>>;

#[async_trait::async_trait]
pub trait Source<T>: Send + Sync {
    async fn stream(&self) -> EnvelopeStream<T>;
}

#[async_trait::async_trait]
pub trait Transform<I, O>: Send + Sync {
    async fn apply(&self, input: Envelope<I>) -> Result<Envelope<O>, PipelineError>;
}

#[async_trait::async_trait]
pub trait Sink<T>: Send + Sync {
    type Output: Send;

    async fn run<S>(&self, input: S) -> Result<Self::Output, PipelineError>
    where
        S: Stream<Item = Result<Envelope<T>, PipelineError>> + Send + Unpin + 'static;
}

/// Sorts an upstream item for a sink.
///
/// Transform rejections drop that one record; anything else aborts the run.
pub fn admit<T>(item: Result<Envelope<T>, PipelineError>) -> Result<Option<Envelope<T>>, PipelineError> {
    match item {
        Ok(env) => Ok(Some(env)),
        Err(PipelineError::Transform(reason)) => {
            tracing::warn!(reason = %reason, "facility record rejected, skipping");
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

/// Source → record transforms → normalizer → sink.
pub struct Pipeline<S, K> {
    pub source: S,
    pub transforms: Vec<Arc<dyn Transform<RawFacilityRecord, RawFacilityRecord> + Send + Sync>>, // same-type transforms chain
    pub normalizer: CapacityNormalizer,
    pub sink: K,
}

impl<S, K> Pipeline<S, K>
where
    S: Source<RawFacilityRecord> + Send + Sync + 'static,
    K: Sink<FacilityRows> + Send + Sync + 'static,
{
    pub async fn run(self) -> Result<K::Output, PipelineError> {
        let mut stream = self.source.stream().await;

        // Apply transforms in sequence (if any).
        for t in self.transforms {
            let t_arc = t.clone();
            stream = Box::pin(stream.then(move |item| {
                let t_inner = t_arc.clone();
                async move {
                    match item {
                        Ok(env) => t_inner.apply(env).await,
                        Err(e) => Err(e),
                    }
                }
            }));
        }

        let normalizer = self.normalizer;
        let rows = stream.map(move |item| {
            item.map(|env| {
                let seq = env.seq;
                env.map(|record| normalizer.normalize_record(seq, &record))
            })
        });

        self.sink.run(rows).await
    }
}
