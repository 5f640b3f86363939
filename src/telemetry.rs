//! Telemetry initialization (tracing/tracing-subscriber).
//!
//! LOG_LEVEL controls the filter, either a bare level ("debug") or full
//! directives ("info,session=debug,tutor=debug,coach_backend=debug").
//! LOG_FORMAT selects "pretty" (default) or "json" structured logs.
//!
//! Targets are included in the output to disambiguate sources; the tower-http
//! TraceLayer adds per-request spans on top of this.

use tracing_subscriber::EnvFilter;

const DEFAULT_DIRECTIVES: &str =
    "info,session=debug,tutor=debug,coach_backend=debug,tower_http=info,axum=info";

pub fn init_tracing() {
    let filter = EnvFilter::try_from_env("LOG_LEVEL")
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVES));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(true)
        .with_line_number(true);

    // JSON and pretty builders are different types, so init inside each arm.
    if matches!(std::env::var("LOG_FORMAT").as_deref(), Ok("json")) {
        builder.json().init();
    } else {
        builder.init();
    }
}
