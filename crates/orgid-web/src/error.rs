use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::warn;

use orgid_core::OrgIdError;

#[expect(
    clippy::needless_pass_by_value,
    reason = "handlers naturally own error values from `Result` and pass them through"
)]
pub fn orgid_error_response(err: OrgIdError, operation: &str) -> Response {
    let status = status_for_orgid_error(&err);
    let payload = err.to_payload(operation);
    if status.is_server_error() {
        warn!(
            operation,
            code = %payload.code,
            trace_id = %payload.trace_id,
            error = %payload.message,
            "request failed"
        );
    }
    (status, Json(payload)).into_response()
}

fn status_for_orgid_error(err: &OrgIdError) -> StatusCode {
    match err {
        OrgIdError::Validation(_) => StatusCode::BAD_REQUEST,
        OrgIdError::Dataset(_) | OrgIdError::Http(_) => StatusCode::BAD_GATEWAY,
        OrgIdError::Boot(_) => StatusCode::SERVICE_UNAVAILABLE,
        OrgIdError::Toml(_) | OrgIdError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
