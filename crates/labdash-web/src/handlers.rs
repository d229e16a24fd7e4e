use std::collections::HashMap;

use axum::{
    Json,
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
};

use labdash_core::DashboardError;
use labdash_core::models::{BucketKey, TrendRange};
use labdash_core::test_log::PREVIEW_CHARS;

use crate::WebState;
use crate::dto::{SaveNoteRequest, SaveNoteResponse, TestLogQuery, TrendQuery};
use crate::error::dashboard_error_response;

pub async fn list_dates(State(state): State<WebState>, Path(platform): Path<String>) -> Response {
    match state.dashboard.list_dates(&platform) {
        Ok(dates) => Json(dates).into_response(),
        Err(err) => dashboard_error_response(err, "dashboard.dates", Some(platform)),
    }
}

pub async fn current_platform(State(state): State<WebState>) -> Response {
    match state.dashboard.current_platform() {
        Ok(current) => Json(current).into_response(),
        Err(err) => dashboard_error_response(err, "dashboard.current_platform", None),
    }
}

pub async fn summary(
    State(state): State<WebState>,
    Path((platform, date)): Path<(String, String)>,
) -> Response {
    let target = format!("{platform}/{date}");
    match state.dashboard.summary(&platform, &date) {
        Ok(Some(summary)) => Json(summary).into_response(),
        Ok(None) => dashboard_error_response(
            DashboardError::NotFound(format!("report {target}")),
            "dashboard.summary",
            Some(target),
        ),
        Err(err) => dashboard_error_response(err, "dashboard.summary", Some(target)),
    }
}

/// Serves all three trend routes; `end_date`, `category` and `level` are
/// optional path segments.
pub async fn trend(
    State(state): State<WebState>,
    Path(params): Path<HashMap<String, String>>,
    Query(query): Query<TrendQuery>,
) -> Response {
    let platform = params.get("platform").cloned().unwrap_or_default();
    let end_date = params.get("end_date").map(String::as_str);
    let bucket = match (params.get("category"), params.get("level")) {
        (Some(category), Some(level)) => match BucketKey::parse(category, level) {
            Ok(key) => Some(key),
            Err(message) => {
                return dashboard_error_response(
                    DashboardError::Validation(message),
                    "dashboard.trend",
                    Some(platform),
                );
            }
        },
        _ => None,
    };
    let range = TrendRange::from_query(query.range.as_deref());

    match state.dashboard.trend(&platform, end_date, bucket, range) {
        Ok(points) => Json(points).into_response(),
        Err(err) => dashboard_error_response(err, "dashboard.trend", Some(platform)),
    }
}

pub async fn diff(
    State(state): State<WebState>,
    Path((platform, date_curr, date_prev)): Path<(String, String, String)>,
) -> Response {
    match state.dashboard.diff(&platform, &date_curr, &date_prev) {
        Ok(report) => Json(report).into_response(),
        Err(err) => dashboard_error_response(err, "dashboard.diff", Some(platform)),
    }
}

pub async fn test_log_detail(
    State(state): State<WebState>,
    Path((platform, date, category, level, test_name)): Path<(
        String,
        String,
        String,
        String,
        String,
    )>,
    Query(query): Query<TestLogQuery>,
) -> Response {
    let bucket = match BucketKey::parse(&category, &level) {
        Ok(bucket) => bucket,
        Err(message) => {
            return dashboard_error_response(
                DashboardError::Validation(message),
                "dashboard.test_log_detail",
                Some(platform),
            );
        }
    };
    match state
        .dashboard
        .test_log_detail(&platform, &date, bucket, &test_name)
    {
        Ok(detail) if query.preview => Json(detail.preview(PREVIEW_CHARS)).into_response(),
        Ok(detail) => Json(detail).into_response(),
        Err(err) => dashboard_error_response(err, "dashboard.test_log_detail", Some(platform)),
    }
}

pub async fn load_notes(
    State(state): State<WebState>,
    Path((platform, date)): Path<(String, String)>,
) -> Response {
    match state.dashboard.notes(&platform, &date) {
        Ok(notes) => Json(notes).into_response(),
        Err(err) => dashboard_error_response(err, "notes.load", Some(format!("{platform}/{date}"))),
    }
}

pub async fn save_note(
    State(state): State<WebState>,
    Path((platform, date)): Path<(String, String)>,
    Json(req): Json<SaveNoteRequest>,
) -> Response {
    match state
        .dashboard
        .save_note(&platform, &date, &req.key, req.value)
    {
        Ok(()) => Json(SaveNoteResponse {
            status: "success",
            key: req.key.trim().to_string(),
        })
        .into_response(),
        Err(err) => dashboard_error_response(err, "notes.save", Some(format!("{platform}/{date}"))),
    }
}
