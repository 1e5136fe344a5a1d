//! On-demand CPU profiling in the pprof protobuf format.
//!
//! - `GET /debug/pprof/` - index
//! - `GET /debug/pprof/cmdline` - NUL-separated command line
//! - `GET /debug/pprof/profile?seconds=N` - CPU profile sampled for N seconds
//!
//! Read the result with `go tool pprof` or any pprof viewer.

use std::time::Duration;

use axum::Router;
use axum::extract::Query;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use pprof::protos::Message;
use serde::Deserialize;
use tracing::{info, warn};

const DEFAULT_SECONDS: u64 = 30;
const MAX_SECONDS: u64 = 60;
const SAMPLE_FREQUENCY: i32 = 100;

const INDEX: &str = "/debug/pprof/\n\n\
    cmdline   The command line invocation of the current program\n\
    profile   CPU profile, ?seconds=N (default 30, max 60)\n";

#[derive(Debug, Deserialize)]
struct ProfileParams {
    seconds: Option<u64>,
}

/// Routes under `/debug/pprof/`.
pub fn router() -> Router {
    Router::new()
        .route("/debug/pprof/", get(index))
        .route("/debug/pprof/cmdline", get(cmdline))
        .route("/debug/pprof/profile", get(profile))
}

async fn index() -> &'static str {
    INDEX
}

async fn cmdline() -> String {
    std::env::args().collect::<Vec<_>>().join("\0")
}

async fn profile(Query(params): Query<ProfileParams>) -> Response {
    let seconds = params.seconds.unwrap_or(DEFAULT_SECONDS);
    if seconds == 0 || seconds > MAX_SECONDS {
        return (
            StatusCode::BAD_REQUEST,
            format!("seconds must be between 1 and {MAX_SECONDS}"),
        )
            .into_response();
    }

    info!(seconds, "CPU profile requested");

    let result =
        tokio::task::spawn_blocking(move || cpu_profile(Duration::from_secs(seconds))).await;

    match result {
        Ok(Ok(body)) => (
            [
                (header::CONTENT_TYPE, "application/octet-stream"),
                (header::CONTENT_DISPOSITION, "attachment; filename=\"profile\""),
            ],
            body,
        )
            .into_response(),
        Ok(Err(e)) => {
            warn!(error = %e, "CPU profile failed");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
        Err(e) => {
            warn!(error = %e, "CPU profile task failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Sample the whole process for `duration` and encode the report.
fn cpu_profile(duration: Duration) -> Result<Vec<u8>, pprof::Error> {
    let guard = pprof::ProfilerGuardBuilder::default()
        .frequency(SAMPLE_FREQUENCY)
        .blocklist(&["libc", "libgcc", "pthread", "vdso"])
        .build()?;

    std::thread::sleep(duration);

    let profile = guard.report().build()?.pprof()?;
    Ok(profile.encode_to_vec())
}
