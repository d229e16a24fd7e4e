use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use flate2::Compression;
use flate2::write::GzEncoder;
use labdash_core::cache::cache_path;
use labdash_core::models::{BucketKey, Category, Level, Summary, TrendPoint, TrendRange};
use labdash_core::{Dashboard, DashboardConfig};
use serde_json::{Value, json};
use tar::{Builder, Header};
use tempfile::{TempDir, tempdir};

const PLATFORM: &str = "MINIPACK3BA";
const DATE: &str = "2026-01-10";
const RESULTS_CSV: &str = "Test1,PASS,Msg\nTest2,PASS,Msg";

const ARCHIVES: [&str; 4] = [
    "SAI_t0_MINIPACK3BA_fboss_bins_varFBOSSsai_SAI_13_3_0_GA_tar.zst_2026-01-09.tar.gz",
    "AGENT_HW_t0_MINIPACK3BA_fboss_bins_varFBOSSsai_SAI_13_3_0_GA_tar.zst_2026-01-09.tar.gz",
    "LINK_T0_MINIPACK3BA_fboss_bins_varFBOSSsai_SAI_13_3_0_GA_tar.zst_2026-01-09.tar.gz",
    "ExitEVT_MINIPACK3BA_fboss_bins_varFBOSSsai_SAI_13_3_0_GA_tar.zst_2026-01-09.tar.gz",
];

fn write_archive(path: &Path, files: &[(&str, &str)]) {
    let file = fs::File::create(path).expect("create archive");
    let mut builder = Builder::new(GzEncoder::new(file, Compression::default()));
    for (name, content) in files {
        let mut header = Header::new_gnu();
        header.set_size(content.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder
            .append_data(&mut header, name, content.as_bytes())
            .expect("append member");
    }
    builder
        .into_inner()
        .expect("finish tar")
        .finish()
        .expect("finish gzip");
}

fn scenario() -> (TempDir, PathBuf, Dashboard) {
    let temp = tempdir().expect("tempdir");
    let run_dir = temp.path().join(PLATFORM).join(format!("all_test_{DATE}"));
    fs::create_dir_all(&run_dir).expect("mkdir run dir");

    for (idx, name) in ARCHIVES.iter().enumerate() {
        let mut files = vec![("common_results.csv", RESULTS_CSV)];
        if idx == 0 {
            files.push((
                "Version_Info.txt",
                "FBOSS_BINARY: fboss_bins_varFBOSSsai\nBCM SAI_VERSION: 13.3.0 GA\n",
            ));
        }
        write_archive(&run_dir.join(name), &files);
    }

    let dashboard = Dashboard::new(DashboardConfig::new(temp.path()));
    (temp, run_dir, dashboard)
}

fn load(dashboard: &Dashboard) -> Summary {
    dashboard
        .summary(PLATFORM, DATE)
        .expect("summary call")
        .expect("run directory exists")
}

fn passed(summary: &Summary, category: Category, level: Level) -> u64 {
    summary
        .bucket(BucketKey::new(category, level))
        .map_or(0, |stats| stats.passed)
}

fn touch_forward(path: &Path) {
    let later = SystemTime::now() + Duration::from_secs(5);
    fs::File::open(path)
        .expect("open for touch")
        .set_modified(later)
        .expect("set mtime");
}

fn without_debug_logs(summary: &Summary) -> Value {
    let mut value = serde_json::to_value(summary).expect("serialize summary");
    value
        .as_object_mut()
        .expect("summary object")
        .remove("debug_logs");
    value
}

#[test]
fn four_archive_run_aggregates_every_bucket() {
    let (_temp, _run_dir, dashboard) = scenario();
    let summary = load(&dashboard);

    assert_eq!(passed(&summary, Category::Sai, Level::T0), 2);
    assert_eq!(passed(&summary, Category::AgentHw, Level::T0), 2);
    assert_eq!(passed(&summary, Category::Link, Level::T0), 2);
    assert_eq!(passed(&summary, Category::Link, Level::EvDefault), 2);
    assert_eq!(passed(&summary, Category::Link, Level::Ev), 2);
    assert_eq!(summary.all_tests.passed, 8);
    assert_eq!(summary.all_tests.failed, 0);
    assert_eq!(summary.version_info["BCM_SAI_VERSION"], "13.3.0 GA");

    let link_t0 = summary
        .bucket(BucketKey::new(Category::Link, Level::T0))
        .expect("link t0");
    assert_eq!(link_t0.topology.as_deref(), Some("default"));
}

#[test]
fn all_tests_equals_sum_of_buckets_excluding_alias() {
    let (_temp, _run_dir, dashboard) = scenario();
    let summary = load(&dashboard);

    let bucket_sum: u64 = summary
        .buckets()
        .filter(|(key, _)| key.level != Level::Ev)
        .map(|(_, stats)| stats.passed + stats.failed)
        .sum();
    assert_eq!(summary.all_tests.total, bucket_sum);
    assert_eq!(
        summary.all_tests.total,
        summary.all_tests.passed + summary.all_tests.failed
    );
    assert!(summary.buckets().all(|(_, s)| s.total == s.passed + s.failed));
}

#[test]
fn second_call_is_served_from_cache() {
    let (_temp, run_dir, dashboard) = scenario();
    let first = load(&dashboard);
    let cache_before = fs::read_to_string(cache_path(&run_dir)).expect("cache written");

    let second = load(&dashboard);
    let cache_after = fs::read_to_string(cache_path(&run_dir)).expect("cache still there");

    assert_eq!(without_debug_logs(&first), without_debug_logs(&second));
    assert_eq!(first.debug_logs, second.debug_logs);
    assert_eq!(cache_before, cache_after);
}

#[test]
fn touching_an_archive_forces_a_rewalk() {
    let (_temp, run_dir, dashboard) = scenario();
    load(&dashboard);
    let cache_mtime = fs::metadata(cache_path(&run_dir))
        .and_then(|meta| meta.modified())
        .expect("cache mtime");

    touch_forward(&run_dir.join(ARCHIVES[2]));
    let rebuilt = load(&dashboard);
    let rebuilt_mtime = fs::metadata(cache_path(&run_dir))
        .and_then(|meta| meta.modified())
        .expect("rebuilt cache mtime");

    assert!(rebuilt_mtime > cache_mtime);
    assert_eq!(rebuilt.all_tests.passed, 8);
}

#[test]
fn notes_survive_cache_regeneration() {
    let (_temp, run_dir, dashboard) = scenario();
    load(&dashboard);
    dashboard
        .save_note(PLATFORM, DATE, "owner", json!("bringup-team"))
        .expect("save note");

    let extracted = run_dir.join("SAI_t1_MINIPACK3BA_extracted");
    fs::create_dir_all(&extracted).expect("mkdir extracted");
    fs::write(extracted.join("results.csv"), "Test9,FAIL,boom\n").expect("write csv");
    touch_forward(&extracted);

    let regenerated = load(&dashboard);
    assert_eq!(regenerated.notes["owner"], json!("bringup-team"));
    assert_eq!(regenerated.all_tests.failed, 1);

    let on_disk: Value =
        serde_json::from_str(&fs::read_to_string(cache_path(&run_dir)).expect("read cache"))
            .expect("parse cache");
    assert_eq!(on_disk["notes"]["owner"], json!("bringup-team"));
}

#[test]
fn trend_and_diff_read_through_the_cache() {
    let (temp, _run_dir, dashboard) = scenario();
    let prev_dir = temp.path().join(PLATFORM).join("all_test_2026-01-09");
    fs::create_dir_all(&prev_dir).expect("mkdir prev");
    write_archive(
        &prev_dir.join("SAI_t0_MINIPACK3BA_2026-01-09.tar.gz"),
        &[("common_results.csv", "Test1,FAIL,Msg\nTest3,PASS,Msg")],
    );

    let points = dashboard
        .trend(
            PLATFORM,
            Some(DATE),
            Some(BucketKey::new(Category::Sai, Level::T0)),
            TrendRange::Week,
        )
        .expect("trend");
    assert_eq!(points.len(), 7);
    let totals: Vec<u64> = points.iter().map(TrendPoint::total).collect();
    assert_eq!(totals, vec![0, 0, 0, 0, 0, 2, 2]);

    let diff = dashboard.diff(PLATFORM, DATE, "2026-01-09").expect("diff");
    assert_eq!(diff.fixed.len(), 1);
    assert_eq!(diff.fixed[0].name, "Test1");
    assert!(diff.added_tests.iter().any(|entry| entry.name == "Test2"));
    assert!(diff.removed_tests.iter().any(|entry| entry.name == "Test3"));

    let empty = dashboard.diff(PLATFORM, DATE, "2025-01-01").expect("diff");
    assert!(empty.is_empty());
}
