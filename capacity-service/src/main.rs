use anyhow::Result;
use capacity_service::{
    api::{self, AppState},
    config::{AppConfig, SourceKind},
    history::QueryHistory,
    metrics_server, observability,
};
use grid_client::{
    source::{FixtureGridSource, KepcoHttpSource},
    CapacityNormalizer, GridDataSource,
};
use std::{net::SocketAddr, sync::Arc};

#[tokio::main]
async fn main() -> Result<()> {
    observability::init_tracing();

    // Load configuration
    let cfg = AppConfig::load()?;

    // Start metrics server if configured
    if let Some(metrics_cfg) = &cfg.metrics {
        metrics_server::init(&metrics_cfg.bind_addr)?;
    }

    let grid: Arc<dyn GridDataSource> = match cfg.source.kind {
        SourceKind::Http => Arc::new(KepcoHttpSource::new(cfg.source.http_settings())?),
        SourceKind::Fixture => {
            tracing::warn!("serving built-in fixture data; no requests reach the utility endpoint");
            Arc::new(FixtureGridSource::default())
        }
    };

    let normalizer = CapacityNormalizer::new(cfg.normalizer.bottleneck_policy);
    let history = QueryHistory::with_capacity(cfg.api.history_capacity);
    let app = api::router(AppState::new(grid, normalizer, history));

    let addr: SocketAddr = cfg
        .api
        .bind_addr
        .parse()
        .map_err(|e| anyhow::anyhow!("invalid api.bind_addr: {e}"))?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(
        addr = %addr,
        policy = ?normalizer.policy(),
        source = ?cfg.source.kind,
        "capacity API listening"
    );

    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}
