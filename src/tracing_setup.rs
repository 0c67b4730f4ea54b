use eyre::{Result, WrapErr};
use tracing_subscriber::{EnvFilter, Registry, layer::SubscriberExt, util::SubscriberInitExt};

/// Default verbosity when `RUST_LOG` is not set.
fn default_filter(development: bool) -> &'static str {
    if development {
        "debug,hyper=info,hyper_util=info,reqwest=info"
    } else {
        "info"
    }
}

/// Initialize logging for the given environment.
///
/// Development environments get human-readable output at debug level; every
/// other environment gets one JSON object per line at info level. `RUST_LOG`
/// overrides the level either way.
pub fn init_tracing(development: bool) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(development)));

    if development {
        Registry::default()
            .with(env_filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .pretty()
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true),
            )
            .try_init()
            .wrap_err("Failed to install console logging")?;
    } else {
        Registry::default()
            .with(env_filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(false)
                    .with_span_list(true)
                    .with_target(true)
                    .with_thread_ids(true),
            )
            .try_init()
            .wrap_err("Failed to install JSON logging")?;
    }

    tracing::info!(
        "Logging initialized ({})",
        if development { "console" } else { "json" }
    );
    Ok(())
}

/// Create a request-scoped tracing span
pub fn create_request_span(method: &str, path: &str, track_id: &str) -> tracing::Span {
    tracing::info_span!(
        "request",
        http.method = method,
        http.path = path,
        track_id = track_id,
        http.status_code = tracing::field::Empty,
    )
}

/// Create a backend request span
pub fn create_backend_span(backend_url: &str, method: &str, path: &str) -> tracing::Span {
    tracing::info_span!(
        "backend_request",
        backend.url = backend_url,
        http.method = method,
        http.path = path,
        http.status_code = tracing::field::Empty,
    )
}
