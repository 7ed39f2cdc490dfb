use std::time::{Duration, Instant};

use reqwest::{
    header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE, ORIGIN, REFERER},
    StatusCode,
};
use serde_json::{json, Map, Value};

use super::{extract_result_list, substation_address, AddressQuery, GridDataSource, LookupQuery, SourceError};
use crate::{
    domain::{ApplicationStatus, RawFacilityRecord},
    identifier::ChainIdentifier,
};

pub const CAPACITY_PATH: &str = "/ew/cpct/retrieveMeshNo";
pub const STATUS_PATH: &str = "/ew/status/pwtr/search";

const JSON_UTF8: &str = "application/json; charset=UTF-8";

#[derive(Debug, Clone)]
pub struct HttpSourceSettings {
    pub base_url: String,
    pub user_agent: String,
    pub origin: Option<String>,
    pub referer: Option<String>,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    /// Office used when the identifier does not carry one (customer numbers).
    pub default_office_code: String,
}

impl Default for HttpSourceSettings {
    fn default() -> Self {
        Self {
            base_url: "https://online.kepco.co.kr".to_string(),
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36".to_string(),
            origin: Some("https://online.kepco.co.kr".to_string()),
            referer: Some("https://online.kepco.co.kr/EWM092D00".to_string()),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(15),
            default_office_code: "4830".to_string(),
        }
    }
}

/// `GridDataSource` backed by the utility's public JSON endpoints.
///
/// One POST per lookup, no retries. Non-200 responses and empty bodies are
/// reported as "no result".
#[derive(Clone)]
pub struct KepcoHttpSource {
    client: reqwest::Client,
    settings: HttpSourceSettings,
}

impl KepcoHttpSource {
    pub fn new(settings: HttpSourceSettings) -> Result<Self, SourceError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        if let Some(origin) = &settings.origin {
            headers.insert(ORIGIN, header_value(origin)?);
        }
        if let Some(referer) = &settings.referer {
            headers.insert(REFERER, header_value(referer)?);
        }

        let client = reqwest::Client::builder()
            .user_agent(settings.user_agent.clone())
            .default_headers(headers)
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|e| SourceError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client, settings })
    }

    pub fn settings(&self) -> &HttpSourceSettings {
        &self.settings
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.settings.base_url.trim_end_matches('/'), path)
    }

    async fn post(&self, path: &str, payload: &Value) -> Result<Option<Value>, SourceError> {
        let url = self.url(path);
        metrics::counter!("grid_lookup_requests_total").increment(1);
        let started = Instant::now();

        let response = self
            .client
            .post(&url)
            .header(CONTENT_TYPE, JSON_UTF8)
            .body(payload.to_string())
            .send()
            .await
            .map_err(|e| {
                metrics::counter!("grid_lookup_failed_total").increment(1);
                tracing::warn!(error = %e, url = %url, timeout = e.is_timeout(), "grid lookup request failed");
                SourceError::from(e)
            })?;

        metrics::histogram!("grid_lookup_latency_seconds").record(started.elapsed().as_secs_f64());

        let status = response.status();
        if status != StatusCode::OK {
            tracing::warn!(status = status.as_u16(), url = %url, "grid lookup returned non-200, treating as no result");
            return Ok(None);
        }

        let body = response.text().await?;
        parse_body(&body)
    }
}

fn header_value(raw: &str) -> Result<HeaderValue, SourceError> {
    HeaderValue::from_str(raw).map_err(|e| SourceError::Config(format!("invalid header value '{raw}': {e}")))
}

/// `None` for an empty body; malformed JSON is an error carrying a preview.
pub(crate) fn parse_body(body: &str) -> Result<Option<Value>, SourceError> {
    if body.trim().is_empty() {
        return Ok(None);
    }
    serde_json::from_str(body)
        .map(Some)
        .map_err(|e| SourceError::malformed(e, body))
}

/// Request body for a capacity lookup.
pub fn capacity_payload(query: &LookupQuery, default_office: &str) -> Value {
    match query {
        LookupQuery::Address(a) => address_payload(a),
        LookupQuery::Substation { name, .. } => address_payload(&substation_address(name)),
        LookupQuery::Chain { identifier } => {
            let key = identifier.wire_key();
            let mut param = Map::new();
            param.insert("searchCondition".to_string(), Value::from(key));
            param.insert(key.to_string(), Value::from(identifier.digits()));
            param.insert(
                "jurisOfficecd".to_string(),
                Value::from(identifier.office_code_or(default_office)),
            );
            json!({ "dma_reqParam": param })
        }
    }
}

fn address_payload(a: &AddressQuery) -> Value {
    json!({
        "dma_reqParam": {
            "searchCondition": "address",
            "do": a.province,
            "si": a.city,
            "gu": a.district,
            "lidong": a.town,
            "li": a.village,
            "jibun": a.lot_number,
        }
    })
}

/// Request body for a receipt-status lookup.
pub fn status_payload(identifier: &ChainIdentifier, default_office: &str) -> Value {
    json!({
        "dma_param": {
            "jurisOfficecd": identifier.office_code_or(default_office),
            "acptNo": identifier.digits(),
        }
    })
}

pub(crate) fn facility_records(body: Option<&Value>) -> Vec<RawFacilityRecord> {
    let records: Vec<RawFacilityRecord> = body
        .map(extract_result_list)
        .unwrap_or_default()
        .into_iter()
        .map(RawFacilityRecord::new)
        .collect();

    if records.is_empty() {
        metrics::counter!("grid_lookup_empty_total").increment(1);
    }
    records
}

pub(crate) fn status_rows(body: Option<&Value>) -> Vec<ApplicationStatus> {
    body.map(extract_result_list)
        .unwrap_or_default()
        .iter()
        .map(ApplicationStatus::from_fields)
        .collect()
}

#[async_trait::async_trait]
impl GridDataSource for KepcoHttpSource {
    async fn lookup(&self, query: &LookupQuery) -> Result<Vec<RawFacilityRecord>, SourceError> {
        query.validate()?;

        let payload = capacity_payload(query, &self.settings.default_office_code);
        let body = self.post(CAPACITY_PATH, &payload).await?;
        let records = facility_records(body.as_ref());

        tracing::info!(query = %query, records = records.len(), "capacity lookup complete");
        Ok(records)
    }

    async fn application_status(
        &self,
        identifier: &ChainIdentifier,
    ) -> Result<Vec<ApplicationStatus>, SourceError> {
        let payload = status_payload(identifier, &self.settings.default_office_code);
        let body = self.post(STATUS_PATH, &payload).await?;
        let rows = status_rows(body.as_ref());

        tracing::info!(identifier = %identifier, rows = rows.len(), "status lookup complete");
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_payload_uses_address_condition() {
        let q = LookupQuery::Address(AddressQuery {
            province: "전북특별자치도".into(),
            city: "전주시".into(),
            district: "덕진구".into(),
            town: "강흥동".into(),
            village: "춘포리".into(),
            lot_number: "553-5".into(),
        });
        let p = capacity_payload(&q, "4830");
        assert_eq!(p["dma_reqParam"]["searchCondition"], "address");
        assert_eq!(p["dma_reqParam"]["lidong"], "강흥동");
        assert_eq!(p["dma_reqParam"]["jibun"], "553-5");
    }

    #[test]
    fn chain_payload_carries_identifier_and_office() {
        let receipt = ChainIdentifier::parse("1234-20231115-010412").unwrap();
        let p = capacity_payload(&LookupQuery::Chain { identifier: receipt }, "4830");
        assert_eq!(p["dma_reqParam"]["searchCondition"], "acptNo");
        assert_eq!(p["dma_reqParam"]["acptNo"], "123420231115010412");
        assert_eq!(p["dma_reqParam"]["jurisOfficecd"], "1234");

        let customer = ChainIdentifier::parse("12-2945-7459").unwrap();
        let p = capacity_payload(&LookupQuery::Chain { identifier: customer }, "4830");
        assert_eq!(p["dma_reqParam"]["custNo"], "1229457459");
        assert_eq!(p["dma_reqParam"]["jurisOfficecd"], "4830");
    }

    #[test]
    fn substation_payload_searches_by_site_address() {
        let q = LookupQuery::Substation {
            region: "서울본부".into(),
            name: "용산".into(),
        };
        let p = capacity_payload(&q, "4830");
        assert_eq!(p["dma_reqParam"]["searchCondition"], "address");
        assert_eq!(p["dma_reqParam"]["lidong"], "한강로동");
        assert_eq!(p["dma_reqParam"]["jibun"], "500");

        let unmapped = LookupQuery::Substation {
            region: "제주본부".into(),
            name: "한림변전소".into(),
        };
        let p = capacity_payload(&unmapped, "4830");
        assert_eq!(p["dma_reqParam"]["si"], "전주시");
        assert_eq!(p["dma_reqParam"]["li"], "춘포리");
    }

    #[test]
    fn status_payload_matches_search_shape() {
        let id = ChainIdentifier::parse("12-2945-7459").unwrap();
        let p = status_payload(&id, "4830");
        assert_eq!(p, json!({ "dma_param": { "jurisOfficecd": "4830", "acptNo": "1229457459" } }));
    }

    #[test]
    fn empty_body_is_no_result_and_garbage_is_malformed() {
        assert!(parse_body("  \n").unwrap().is_none());
        let err = parse_body("<html>maintenance</html>").unwrap_err();
        match err {
            SourceError::MalformedBody { preview, .. } => assert_eq!(preview, "<html>maintenance</html>"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn records_come_from_first_matching_list() {
        let body = json!({ "list": [{ "SUBST_CAPA": 10 }], "data": { "list": [{}, {}] } });
        assert_eq!(facility_records(Some(&body)).len(), 1);
        assert!(facility_records(None).is_empty());
    }

    async fn upstream(status: axum::http::StatusCode, body: &'static str) -> String {
        let app = axum::Router::new().fallback(move || async move { (status, body) });
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
        format!("http://{addr}")
    }

    fn source_at(base_url: String) -> KepcoHttpSource {
        KepcoHttpSource::new(HttpSourceSettings {
            base_url,
            connect_timeout: Duration::from_secs(2),
            request_timeout: Duration::from_secs(5),
            ..HttpSourceSettings::default()
        })
        .unwrap()
    }

    fn receipt() -> LookupQuery {
        LookupQuery::Chain {
            identifier: ChainIdentifier::parse("4830-20231115-010412").unwrap(),
        }
    }

    #[tokio::test]
    async fn non_200_response_is_no_result() {
        let base = upstream(axum::http::StatusCode::INTERNAL_SERVER_ERROR, r#"{"list":[{"SUBST_CAPA":1}]}"#).await;
        let source = source_at(base);
        assert!(source.lookup(&receipt()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn empty_200_body_is_no_result() {
        let base = upstream(axum::http::StatusCode::OK, "").await;
        let source = source_at(base);
        assert!(source.lookup(&receipt()).await.unwrap().is_empty());

        let id = ChainIdentifier::parse("4830-20231115-010412").unwrap();
        assert!(source.application_status(&id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn html_200_body_is_malformed_and_not_retryable() {
        let base = upstream(axum::http::StatusCode::OK, "<html>점검 중</html>").await;
        let err = source_at(base).lookup(&receipt()).await.unwrap_err();
        assert!(matches!(err, SourceError::MalformedBody { .. }));
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn served_records_are_extracted() {
        let base = upstream(
            axum::http::StatusCode::OK,
            r#"{"dlt_resultList":[{"SUBST_NM":"전주","SUBST_CAPA":200000}]}"#,
        )
        .await;
        let records = source_at(base).lookup(&receipt()).await.unwrap();
        assert_eq!(records.len(), 1);
        assert!(records[0].has_stage(crate::domain::StageKind::Substation));
    }

    #[tokio::test]
    async fn refused_connection_is_retryable_network_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = source_at(format!("http://{addr}")).lookup(&receipt()).await.unwrap_err();
        assert!(matches!(err, SourceError::Network(_)));
        assert!(err.is_retryable());
    }

    #[test]
    fn client_builds_with_default_settings() {
        let source = KepcoHttpSource::new(HttpSourceSettings::default()).unwrap();
        assert_eq!(source.url(CAPACITY_PATH), "https://online.kepco.co.kr/ew/cpct/retrieveMeshNo");
    }
}
