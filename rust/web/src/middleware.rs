use crate::metrics::{MetricsCollector, RequestTimer};
use warp::http::{Method, StatusCode};
use warp::path::FullPath;
use warp::reject::Rejection;
use warp::reply::{Reply, Response};
use warp::Filter;

struct InFlight {
    path: String,
    method: Method,
    timer: RequestTimer,
}

/// Wraps a route so every reply is logged and counted in `metrics`.
pub fn with_request_logging<F, T>(
    filter: F,
    metrics: MetricsCollector,
) -> impl Filter<Extract = (Response,), Error = Rejection> + Clone
where
    F: Filter<Extract = (T,), Error = Rejection> + Clone + Send + Sync + 'static,
    T: Reply,
{
    warp::any()
        .and(warp::path::full())
        .and(warp::method())
        .map(move |path: FullPath, method: Method| {
            tracing::debug!(path = %path.as_str(), method = %method, "incoming request");
            InFlight {
                path: path.as_str().to_string(),
                method,
                timer: RequestTimer::new(metrics.clone()),
            }
        })
        .and(filter)
        .map(|request: InFlight, reply: T| {
            let response = reply.into_response();
            let status = response.status();
            let success = !status.is_client_error() && !status.is_server_error();
            let duration_ms = request.timer.finish(success);
            log_response(status, &request.path, request.method.as_str(), duration_ms);
            RequestMetrics::new(request.path, request.method.to_string(), status.as_u16(), duration_ms)
                .log();
            response
        })
}

pub fn log_response(status: StatusCode, path: &str, method: &str, duration_ms: u64) {
    if status.is_server_error() {
        tracing::error!(
            status = %status.as_u16(),
            path = %path,
            method = %method,
            duration_ms = duration_ms,
            "server error"
        );
    } else if status.is_client_error() {
        tracing::warn!(
            status = %status.as_u16(),
            path = %path,
            method = %method,
            duration_ms = duration_ms,
            "client error"
        );
    } else {
        tracing::info!(
            status = %status.as_u16(),
            path = %path,
            method = %method,
            duration_ms = duration_ms,
            "response sent"
        );
    }
}

#[derive(Debug, Clone)]
pub struct RequestMetrics {
    pub path: String,
    pub method: String,
    pub status: u16,
    pub duration_ms: u64,
}

impl RequestMetrics {
    pub fn new(path: String, method: String, status: u16, duration_ms: u64) -> Self {
        Self {
            path,
            method,
            status,
            duration_ms,
        }
    }

    pub fn log(&self) {
        tracing::debug!(
            path = %self.path,
            method = %self.method,
            status = self.status,
            duration_ms = self.duration_ms,
            "request metrics"
        );
    }
}
