pub mod error;

use std::sync::Arc;

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use grid_client::{
    domain::{ApplicationStatus, CapacitySummary, NormalizedFacilityRow},
    summarize, AddressQuery, CapacityNormalizer, ChainIdentifier, GridDataSource, LookupQuery,
};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::{
    history::{HistoryEntry, QueryHistory},
    pipeline::Pipeline,
    sinks::MemorySink,
    sources::LookupSource,
    transform::FacilityRecordValidation,
};

pub use error::ApiError;

#[derive(Clone)]
pub struct AppState {
    pub grid: Arc<dyn GridDataSource>,
    pub normalizer: CapacityNormalizer,
    pub history: Arc<Mutex<QueryHistory>>,
}

impl AppState {
    pub fn new(grid: Arc<dyn GridDataSource>, normalizer: CapacityNormalizer, history: QueryHistory) -> Self {
        Self {
            grid,
            normalizer,
            history: Arc::new(Mutex::new(history)),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CapacityResponse {
    pub rows: Vec<NormalizedFacilityRow>,
    pub summary: CapacitySummary,
}

#[derive(Debug, Deserialize)]
pub struct IdentifierRequest {
    pub identifier: String,
}

#[derive(Debug, Deserialize)]
pub struct SubstationRequest {
    pub region: String,
    pub name: String,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/lookup/address", post(lookup_address))
        .route("/lookup/chain", post(lookup_chain))
        .route("/lookup/substation", post(lookup_substation))
        .route("/lookup/status", post(lookup_status))
        .route("/history", get(history))
        .route("/health", get(health))
        .with_state(state)
}

pub async fn lookup_address(
    State(state): State<AppState>,
    Json(query): Json<AddressQuery>,
) -> Result<Json<CapacityResponse>, ApiError> {
    metrics::counter!("api_requests_total", "route" => "address").increment(1);
    capacity_lookup(&state, LookupQuery::Address(query)).await.map(Json)
}

pub async fn lookup_chain(
    State(state): State<AppState>,
    Json(req): Json<IdentifierRequest>,
) -> Result<Json<CapacityResponse>, ApiError> {
    metrics::counter!("api_requests_total", "route" => "chain").increment(1);
    let identifier = ChainIdentifier::parse(&req.identifier)?;
    capacity_lookup(&state, LookupQuery::Chain { identifier }).await.map(Json)
}

pub async fn lookup_substation(
    State(state): State<AppState>,
    Json(req): Json<SubstationRequest>,
) -> Result<Json<CapacityResponse>, ApiError> {
    metrics::counter!("api_requests_total", "route" => "substation").increment(1);
    let query = LookupQuery::Substation {
        region: req.region,
        name: req.name,
    };
    capacity_lookup(&state, query).await.map(Json)
}

pub async fn lookup_status(
    State(state): State<AppState>,
    Json(req): Json<IdentifierRequest>,
) -> Result<Json<Vec<ApplicationStatus>>, ApiError> {
    metrics::counter!("api_requests_total", "route" => "status").increment(1);
    let identifier = ChainIdentifier::parse(&req.identifier)?;
    let rows = state.grid.application_status(&identifier).await?;

    state
        .history
        .lock()
        .await
        .record(HistoryEntry::status(&identifier, rows.len()));
    Ok(Json(rows))
}

pub async fn history(State(state): State<AppState>) -> Json<Vec<HistoryEntry>> {
    let history = state.history.lock().await;
    Json(history.recent().cloned().collect())
}

async fn health() -> &'static str {
    "ok"
}

async fn capacity_lookup(state: &AppState, query: LookupQuery) -> Result<CapacityResponse, ApiError> {
    let pipeline = Pipeline {
        source: LookupSource::new(state.grid.clone(), query.clone()),
        transforms: vec![Arc::new(FacilityRecordValidation)],
        normalizer: state.normalizer,
        sink: MemorySink,
    };

    let rows = pipeline.run().await?;
    let summary = summarize(&rows);
    tracing::info!(
        query = %query,
        facilities = summary.facility_count,
        available_kw = summary.total_available_capacity,
        status = %summary.overall_status,
        "capacity lookup served"
    );

    state
        .history
        .lock()
        .await
        .record(HistoryEntry::capacity(&query, rows.len(), &summary));
    Ok(CapacityResponse { rows, summary })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use grid_client::{domain::CapacityStatus, source::FixtureGridSource};
    use serde_json::json;

    fn state_with(grid: FixtureGridSource) -> AppState {
        AppState::new(Arc::new(grid), CapacityNormalizer::default(), QueryHistory::default())
    }

    fn jeonju_address() -> AddressQuery {
        serde_json::from_value(json!({
            "do": "전북특별자치도", "si": "전주시", "gu": "덕진구", "lidong": "강흥동"
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn address_lookup_returns_rows_and_summary() {
        let state = state_with(FixtureGridSource::jeonju());
        let Json(resp) = lookup_address(State(state.clone()), Json(jeonju_address()))
            .await
            .unwrap();

        assert_eq!(resp.rows.len(), 3);
        assert_eq!(resp.summary.facility_count, 1);
        assert_eq!(resp.summary.overall_status, CapacityStatus::Saturated);

        let Json(recent) = history(State(state)).await;
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].kind, "address");
        assert_eq!(recent[0].results, 3);
    }

    #[tokio::test]
    async fn chain_lookup_rejects_unusable_identifier() {
        let state = state_with(FixtureGridSource::jeonju());
        let err = lookup_chain(
            State(state.clone()),
            Json(IdentifierRequest {
                identifier: "123".into(),
            }),
        )
        .await
        .unwrap_err();

        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert!(state.history.lock().await.is_empty());
    }

    #[tokio::test]
    async fn no_data_is_an_empty_success() {
        let state = state_with(FixtureGridSource::new(json!({ "list": [] }), json!({})));
        let Json(resp) = lookup_chain(
            State(state),
            Json(IdentifierRequest {
                identifier: "12-2945-7459".into(),
            }),
        )
        .await
        .unwrap();

        assert!(resp.rows.is_empty());
        assert_eq!(resp.summary, CapacitySummary::default());
    }

    #[tokio::test]
    async fn status_lookup_is_recorded_in_history() {
        let state = state_with(FixtureGridSource::jeonju());
        let Json(rows) = lookup_status(
            State(state.clone()),
            Json(IdentifierRequest {
                identifier: "4830-20231115-010412".into(),
            }),
        )
        .await
        .unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].progress, "공용망보강");
        let Json(recent) = history(State(state)).await;
        assert_eq!(recent[0].kind, "status");
        assert!(recent[0].summary.is_none());
    }

    #[tokio::test]
    async fn substation_lookup_is_served_and_recorded() {
        let state = state_with(FixtureGridSource::jeonju());
        let Json(resp) = lookup_substation(
            State(state.clone()),
            Json(SubstationRequest {
                region: "전북본부".into(),
                name: "전주변전소".into(),
            }),
        )
        .await
        .unwrap();
        assert_eq!(resp.rows.len(), 3);

        let Json(recent) = history(State(state.clone())).await;
        assert_eq!(recent[0].kind, "substation");
        assert_eq!(recent[0].query, "substation 전북본부 전주변전소");

        let err = lookup_substation(
            State(state),
            Json(SubstationRequest {
                region: String::new(),
                name: "전주변전소".into(),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn invalid_address_is_bad_request() {
        let state = state_with(FixtureGridSource::jeonju());
        let err = lookup_address(State(state), Json(AddressQuery::default()))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }
}
