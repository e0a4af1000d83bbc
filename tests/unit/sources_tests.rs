use super::*;
use crate::error::ReportError;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

static TEMP_DIR_COUNTER: AtomicU64 = AtomicU64::new(0);

struct TempDirGuard {
    path: PathBuf,
}

impl TempDirGuard {
    fn new(prefix: &str) -> Self {
        let counter = TEMP_DIR_COUNTER.fetch_add(1, Ordering::Relaxed);
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        let path = std::env::temp_dir().join(format!("gametester-{prefix}-{nanos}-{counter}"));
        fs::create_dir_all(&path).expect("create temp dir");
        Self { path }
    }
}

impl Drop for TempDirGuard {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.path);
    }
}

#[test]
fn mock_generation_respects_case_limit() {
    let config = GenerationConfig {
        max_test_cases: 3,
        ..GenerationConfig::default()
    };
    let cases = MockGameBackend.generate(&config).expect("generate");
    let ids: Vec<&str> = cases.iter().map(|case| case.id.as_str()).collect();
    assert_eq!(ids, vec!["tc-001", "tc-002", "tc-003"]);
    assert!(cases.iter().all(|case| !case.generated && !case.selected));
}

#[test]
fn mock_generation_rejects_invalid_config() {
    let config = GenerationConfig {
        max_test_cases: 0,
        ..GenerationConfig::default()
    };
    assert!(matches!(
        MockGameBackend.generate(&config),
        Err(SourceError::Generation(_))
    ));
}

#[test]
fn mock_execution_returns_one_result_per_case_in_order() {
    let cases = catalogue_test_cases();
    let results = MockGameBackend.execute(&cases[1..4]).expect("execute");
    let ids: Vec<&str> = results.iter().map(|result| result.id.as_str()).collect();
    assert_eq!(ids, vec!["tc-002", "tc-003", "tc-004"]);
    assert_eq!(results[1].status, ResultStatus::Warning);
    assert!(!results[1].validations.cross_agent_check);
}

#[test]
fn mock_report_store_serves_report_001() {
    let store = MockReportStore::default();
    let report = store.fetch("report-001").expect("fetch");
    assert_eq!(report.total_tests(), 5);
    assert_eq!(report.passed(), 2);
    assert_eq!(report.failed(), 2);
    assert_eq!(report.warnings(), 1);
    assert_eq!(report.total_duration(), 313);
    assert!(now_epoch_secs() - report.timestamp_epoch_secs() < 60);
    assert!(matches!(
        store.fetch("missing"),
        Err(SourceError::ReportNotFound(id)) if id == "missing"
    ));
}

#[test]
fn json_store_lists_newest_first_and_skips_bad_files() {
    let dir = TempDirGuard::new("reports");
    let older = ExecutionReport::from_results("older", 100, 50, Vec::new());
    let newer = ExecutionReport::from_results("newer", 200, 70, Vec::new());
    fs::write(
        dir.path.join("a.json"),
        serde_json::to_string(&older).expect("serialize"),
    )
    .expect("write");
    fs::write(
        dir.path.join("b.json"),
        serde_json::to_string(&newer).expect("serialize"),
    )
    .expect("write");
    fs::write(dir.path.join("broken.json"), "{not json").expect("write");
    fs::write(dir.path.join("notes.txt"), "ignored").expect("write");

    let store = JsonReportStore::new(&dir.path);
    let ids: Vec<String> = store
        .list()
        .expect("list")
        .iter()
        .map(|report| report.id().to_string())
        .collect();

    assert_eq!(ids, vec!["newer", "older"]);
    assert_eq!(store.fetch("older").expect("fetch").coverage(), 50);
}

#[test]
fn json_store_reports_missing_directory() {
    let store = JsonReportStore::new("/definitely-not-a-real-report-dir");
    assert!(matches!(store.list(), Err(SourceError::Io { .. })));
}

#[test]
fn json_store_skips_reports_that_contradict_their_results() {
    let dir = TempDirGuard::new("inconsistent");
    let good = ExecutionReport::from_results("good", 10, 40, Vec::new());
    fs::write(
        dir.path.join("good.json"),
        serde_json::to_string(&good).expect("serialize"),
    )
    .expect("write");
    fs::write(
        dir.path.join("inflated.json"),
        r#"{"id":"inflated","timestampEpochSecs":20,"totalTests":1,"passed":5,"failed":0,"warnings":0,"totalDuration":61,"coverage":250,
"results":[{"id":"t1","name":"Smoke","status":"passed","duration":61,"artifacts":[],
"validations":{"repeatCheck":true,"crossAgentCheck":true,"confidence":3.5},"details":""}]}"#,
    )
    .expect("write");

    assert!(matches!(
        JsonReportStore::read_report(&dir.path.join("inflated.json")),
        Err(SourceError::InvalidReport {
            source: ReportError::CoverageOutOfRange(250),
            ..
        })
    ));

    let store = JsonReportStore::new(&dir.path);
    let ids: Vec<String> = store
        .list()
        .expect("list")
        .iter()
        .map(|report| report.id().to_string())
        .collect();
    assert_eq!(ids, vec!["good"]);
    assert!(matches!(
        store.fetch("inflated"),
        Err(SourceError::ReportNotFound(id)) if id == "inflated"
    ));
}

#[test]
fn json_store_rejects_out_of_range_confidence() {
    let dir = TempDirGuard::new("confidence");
    fs::write(
        dir.path.join("r.json"),
        r#"{"id":"r","timestampEpochSecs":0,"totalTests":1,"passed":1,"failed":0,"warnings":0,"totalDuration":5,"coverage":50,
"results":[{"id":"t1","name":"Smoke","status":"passed","duration":5,"artifacts":[],
"validations":{"repeatCheck":true,"crossAgentCheck":true,"confidence":3.5},"details":""}]}"#,
    )
    .expect("write");

    assert!(matches!(
        JsonReportStore::read_report(&dir.path.join("r.json")),
        Err(SourceError::InvalidReport {
            source: ReportError::ConfidenceOutOfRange { .. },
            ..
        })
    ));
}
