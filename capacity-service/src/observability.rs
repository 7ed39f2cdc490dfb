use tracing_subscriber::{filter::Directive, EnvFilter};

fn directive(raw: &str) -> Option<Directive> {
    raw.parse().ok()
}

/// Installs the fmt subscriber. `RUST_LOG` adds to the default directives.
///
/// Logs go to stderr; stdout carries data (the replay tool's NDJSON rows).
pub fn init_tracing() {
    let filter = ["capacity_service=info", "grid_client=info"]
        .into_iter()
        .filter_map(directive)
        .fold(EnvFilter::from_default_env(), EnvFilter::add_directive);

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
