use axum::http::StatusCode;
use serde_json::Value;

use super::harness::{DATE, PLATFORM, PREV_DATE, TestHarness, decode_json};

#[tokio::test]
async fn dates_are_listed_newest_first() {
    let harness = TestHarness::setup();
    let response = harness.get(&format!("/api/dashboard/dates/{PLATFORM}")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let dates: Vec<String> = decode_json(response).await;
    assert_eq!(dates, vec![DATE.to_string(), PREV_DATE.to_string()]);

    let unknown = harness.get("/api/dashboard/dates/WEDGE800CACT").await;
    let dates: Vec<String> = decode_json(unknown).await;
    assert!(dates.is_empty());
}

#[tokio::test]
async fn summary_returns_buckets_and_writes_cache() {
    let harness = TestHarness::setup();
    let response = harness
        .get(&format!("/api/dashboard/summary/{PLATFORM}/{DATE}"))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = decode_json(response).await;
    assert_eq!(body["platform"], PLATFORM);
    assert_eq!(body["tests"]["sai"]["t0"]["passed"], 1);
    assert_eq!(body["tests"]["sai"]["t0"]["failed"], 1);
    assert_eq!(body["tests"]["link"]["ev_copper"]["passed"], 1);
    assert_eq!(body["all_tests"]["total"], 3);
    assert!(body["notes"].is_object());
    assert!(harness.run_dir(DATE).join("_dashboard_cache.json").is_file());
}

#[tokio::test]
async fn missing_summary_is_404_with_error_payload() {
    let harness = TestHarness::setup();
    let response = harness
        .get(&format!("/api/dashboard/summary/{PLATFORM}/2025-06-01"))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: Value = decode_json(response).await;
    assert_eq!(body["code"], "NOT_FOUND");
    assert_eq!(body["operation"], "dashboard.summary");
    assert!(body["trace_id"].as_str().is_some_and(|id| !id.is_empty()));
}

#[tokio::test]
async fn traversal_in_path_is_rejected() {
    let harness = TestHarness::setup();
    let response = harness
        .get(&format!("/api/dashboard/summary/{PLATFORM}/..%2F..%2Fetc"))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = decode_json(response).await;
    assert_eq!(body["code"], "VALIDATION_FAILED");
}

#[tokio::test]
async fn bucket_trend_has_one_point_per_day() {
    let harness = TestHarness::setup();
    let response = harness
        .get(&format!("/api/dashboard/trend/{PLATFORM}/{DATE}/sai/t0"))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let points: Vec<Value> = decode_json(response).await;
    assert_eq!(points.len(), 7);
    assert_eq!(points[6]["date"], DATE);
    assert_eq!(points[6]["total"], 2);
    assert_eq!(points[5]["failed"], 1);
    assert_eq!(points[0]["total"], 0);
    assert!(points[0]["duration"].is_null());
}

#[tokio::test]
async fn overall_trend_honours_range_query() {
    let harness = TestHarness::setup();
    let response = harness
        .get(&format!("/api/dashboard/trend/{PLATFORM}/{DATE}?range=month"))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let points: Vec<Value> = decode_json(response).await;
    assert_eq!(points.len(), 30);
    assert_eq!(points[29]["all_tests"]["total"], 3);
    assert_eq!(points[0]["tests"], serde_json::json!({}));
}

#[tokio::test]
async fn trend_rejects_unknown_bucket() {
    let harness = TestHarness::setup();
    let response = harness
        .get(&format!("/api/dashboard/trend/{PLATFORM}/{DATE}/sai/ev_10g"))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn diff_reports_regressions_and_fixes() {
    let harness = TestHarness::setup();
    let response = harness
        .get(&format!("/api/dashboard/diff/{PLATFORM}/{DATE}/{PREV_DATE}"))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = decode_json(response).await;
    assert_eq!(body["new_failures"][0]["name"], "AclTest");
    assert_eq!(body["new_failures"][0]["prev_result"], "PASS");
    assert_eq!(body["fixed"][0]["name"], "VlanTest");
    assert_eq!(body["added_tests"][0]["prev_result"], "N/A");
    assert_eq!(body["stats"]["new_failures_count"], 1);
    assert_eq!(body["stats"]["fixed_count"], 1);
    assert_eq!(body["stats"]["added_count"], 1);
    assert_eq!(body["stats"]["removed_count"], 0);
}

#[tokio::test]
async fn current_platform_picks_newest_data() {
    let harness = TestHarness::setup();
    let response = harness.get("/api/dashboard/current_platform").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = decode_json(response).await;
    assert_eq!(body["platform"], PLATFORM);
    assert_eq!(body["has_data"], true);
    assert_eq!(body["source"], "test_data");
}

const RUN_LOG: &str = "\
########## Running test: warm_boot.HwVlanTest.addPorts
[  PASSED  ] 1 test.
########## Running test: HwAclTest/0.match
[  FAILED  ] HwAclTest/0.match
Running all tests took 12s
";

#[tokio::test]
async fn test_log_detail_returns_the_test_section() {
    let harness = TestHarness::setup();
    harness.seed_log_archive(DATE, "SAI_t0_MINIPACK3N_2026-01-10", RUN_LOG);

    let response = harness
        .get(&format!(
            "/api/dashboard/test_log_detail/{PLATFORM}/{DATE}/sai/t0/HwAclTest/0.match"
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = decode_json(response).await;
    assert_eq!(body["status"], "FAIL");
    let content = body["log_content"].as_str().expect("log content");
    assert!(content.ends_with("[  FAILED  ] HwAclTest/0.match"));
    assert_eq!(body["log_size"], content.chars().count());

    let preview = harness
        .get(&format!(
            "/api/dashboard/test_log_detail/{PLATFORM}/{DATE}/sai/t0/HwVlanTest.addPorts?preview=true"
        ))
        .await;
    let body: Value = decode_json(preview).await;
    assert_eq!(body["status"], "PASS");
    assert!(body["log_preview"].as_str().is_some());
    assert!(body.get("log_content").is_none());
}

#[tokio::test]
async fn test_log_detail_errors_map_to_status_codes() {
    let harness = TestHarness::setup();
    harness.seed_log_archive(DATE, "SAI_t0_MINIPACK3N_2026-01-10", RUN_LOG);

    let missing_test = harness
        .get(&format!(
            "/api/dashboard/test_log_detail/{PLATFORM}/{DATE}/sai/t0/HwNoSuchTest"
        ))
        .await;
    assert_eq!(missing_test.status(), StatusCode::NOT_FOUND);
    let body: Value = decode_json(missing_test).await;
    assert_eq!(body["operation"], "dashboard.test_log_detail");

    let missing_archive = harness
        .get(&format!(
            "/api/dashboard/test_log_detail/{PLATFORM}/{DATE}/agent_hw/t2/HwVlanTest.addPorts"
        ))
        .await;
    assert_eq!(missing_archive.status(), StatusCode::NOT_FOUND);

    let bad_bucket = harness
        .get(&format!(
            "/api/dashboard/test_log_detail/{PLATFORM}/{DATE}/sai/t9/HwVlanTest.addPorts"
        ))
        .await;
    assert_eq!(bad_bucket.status(), StatusCode::BAD_REQUEST);
}
