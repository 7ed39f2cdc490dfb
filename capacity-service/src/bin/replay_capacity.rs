use anyhow::{bail, Result};
use capacity_service::{
    config::AppConfig,
    observability,
    pipeline::Pipeline,
    sinks::NdjsonSink,
    sources::ResponseFileSource,
    transform,
};
use grid_client::{BottleneckPolicy, CapacityNormalizer};
use std::{env, sync::Arc};

#[tokio::main]
async fn main() -> Result<()> {
    observability::init_tracing();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        bail!("usage: replay_capacity <response_json_path>");
    }
    let file_path = &args[1];

    // The config file is optional here; only the bottleneck policy is used.
    let policy = match AppConfig::load() {
        Ok(cfg) => cfg.normalizer.bottleneck_policy,
        Err(e) => {
            tracing::warn!(error = %e, "no usable config, using default bottleneck policy");
            BottleneckPolicy::default()
        }
    };

    let pipeline = Pipeline {
        source: ResponseFileSource::new(file_path),
        transforms: vec![Arc::new(transform::FacilityRecordValidation)],
        normalizer: CapacityNormalizer::new(policy),
        sink: NdjsonSink::new(tokio::io::stdout()),
    };

    let summary = pipeline.run().await?;
    tracing::info!(
        facilities = summary.facility_count,
        available_kw = summary.total_available_capacity,
        status = %summary.overall_status,
        "replay complete"
    );

    Ok(())
}
