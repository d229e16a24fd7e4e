use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use labdash_core::DashboardError;

#[expect(
    clippy::needless_pass_by_value,
    reason = "handlers naturally own error values from `Result` and pass them through"
)]
pub fn dashboard_error_response(
    err: DashboardError,
    operation: &str,
    target: Option<String>,
) -> Response {
    let status = status_for_dashboard_error(&err);
    let payload = err.to_payload(operation.to_string(), target);
    (status, Json(payload)).into_response()
}

fn status_for_dashboard_error(err: &DashboardError) -> StatusCode {
    match err {
        DashboardError::Validation(_) => StatusCode::BAD_REQUEST,
        DashboardError::NotFound(_) => StatusCode::NOT_FOUND,
        DashboardError::Io(io_err) if io_err.kind() == std::io::ErrorKind::NotFound => {
            StatusCode::NOT_FOUND
        }
        DashboardError::InvalidArchive(_)
        | DashboardError::Io(_)
        | DashboardError::Json(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
