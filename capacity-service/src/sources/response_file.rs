use std::path::PathBuf;

use async_stream::try_stream;
use grid_client::{domain::RawFacilityRecord, source::extract_result_list};
use serde_json::Value;

use crate::pipeline::{Envelope, EnvelopeStream, PipelineError, Source};

/// Replays a saved capacity response from disk.
///
/// The file holds either a full response body (the result list is located
/// the same way as for live lookups) or a bare JSON array of records.
pub struct ResponseFileSource {
    path: PathBuf,
}

impl ResponseFileSource {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }
}

fn records_from_body(body: Value) -> Vec<RawFacilityRecord> {
    match body {
        Value::Array(items) => items.into_iter().filter_map(RawFacilityRecord::from_value).collect(),
        other => extract_result_list(&other)
            .into_iter()
            .map(RawFacilityRecord::new)
            .collect(),
    }
}

#[async_trait::async_trait]
impl Source<RawFacilityRecord> for ResponseFileSource {
    async fn stream(&self) -> EnvelopeStream<RawFacilityRecord> {
        let path = self.path.clone();
        let s = try_stream! {
            let contents = tokio::fs::read_to_string(&path).await.map_err(|e| {
                PipelineError::Input(format!("failed to read response file {}: {e}", path.display()))
            })?;

            let body: Value = match serde_json::from_str(&contents) {
                Ok(v) => v,
                Err(e) => {
                    metrics::counter!("replay_response_parse_errors_total").increment(1);
                    Err(PipelineError::Input(format!("failed to parse response file: {e}")))?
                }
            };

            let records = records_from_body(body);
            tracing::info!(path = %path.display(), records = records.len(), "replaying saved response");

            for (seq, record) in records.into_iter().enumerate() {
                yield Envelope::new(seq, record);
            }
        };

        Box::pin(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use serde_json::json;

    #[test]
    fn bare_arrays_and_wrapped_bodies_are_both_read() {
        let bare = records_from_body(json!([{ "SUBST_CAPA": 1 }, 5, { "DL_CAPA": 2 }]));
        assert_eq!(bare.len(), 2);

        let wrapped = records_from_body(json!({ "resultList": [{ "SUBST_CAPA": 1 }] }));
        assert_eq!(wrapped.len(), 1);

        assert!(records_from_body(json!({ "message": "none" })).is_empty());
    }

    #[tokio::test]
    async fn missing_file_is_an_input_error() {
        let source = ResponseFileSource::new("/nonexistent/capacity-response.json");
        let items: Vec<_> = source.stream().await.collect().await;
        assert_eq!(items.len(), 1);
        assert!(matches!(items[0], Err(PipelineError::Input(_))));
    }

    #[tokio::test]
    async fn saved_response_is_streamed() {
        let path = std::env::temp_dir().join(format!("capacity-replay-{}.json", std::process::id()));
        let body = json!({ "dlt_resultList": [{ "SUBST_CAPA": 100 }, { "SUBST_CAPA": 200 }] });
        tokio::fs::write(&path, body.to_string()).await.unwrap();

        let items: Vec<_> = ResponseFileSource::new(&path).stream().await.collect().await;
        tokio::fs::remove_file(&path).await.unwrap();

        let seqs: Vec<usize> = items.into_iter().map(|i| i.unwrap().seq).collect();
        assert_eq!(seqs, vec![0, 1]);
    }
}
