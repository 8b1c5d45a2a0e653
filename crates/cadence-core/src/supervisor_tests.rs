use super::*;
use crate::settings::Settings;
use cadence_runloop::{CommandLauncher, ExecutionKind, JobError};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::Instant;
use tempfile::TempDir;

fn counting_job(name: &str, interval: Duration) -> (JobDescriptor, Arc<AtomicU32>) {
    let calls = Arc::new(AtomicU32::new(0));
    let counter = calls.clone();
    let job = JobDescriptor::blocking(name, interval, move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(())
    });
    (job, calls)
}

fn supervisor(dir: &TempDir, jobs: Vec<JobDescriptor>) -> Supervisor {
    let registry = JobRegistry::new();
    for job in jobs {
        registry.register(job).unwrap();
    }
    let settings = Arc::new(SettingsStore::open(
        dir.path().join("worker_settings.json"),
        Settings::new(),
    ));
    Supervisor::new(registry, settings).with_grace_period(Duration::from_millis(500))
}

#[tokio::test]
async fn test_start_twice_reports_already_running() {
    let dir = TempDir::new().unwrap();
    let (job, _) = counting_job("google_alerts", Duration::from_secs(60));
    let sup = supervisor(&dir, vec![job]);

    assert_eq!(sup.start("google_alerts").await.unwrap(), StartOutcome::Started);
    assert_eq!(sup.start("google_alerts").await.unwrap(), StartOutcome::AlreadyRunning);
    assert!(sup.job_status("google_alerts").await.unwrap().running);

    sup.stop("google_alerts").await.unwrap();
}

#[tokio::test]
async fn test_stop_never_started() {
    let dir = TempDir::new().unwrap();
    let (job, _) = counting_job("scraping_news", Duration::from_secs(60));
    let sup = supervisor(&dir, vec![job]);

    assert_eq!(sup.stop("scraping_news").await.unwrap(), StopOutcome::NotRunning);
    assert!(!sup.job_status("scraping_news").await.unwrap().running);
}

#[tokio::test]
async fn test_unknown_job_is_not_found() {
    let dir = TempDir::new().unwrap();
    let sup = supervisor(&dir, vec![]);

    assert!(matches!(sup.start("ghost").await, Err(SupervisorError::NotFound(_))));
    assert!(matches!(sup.stop("ghost").await, Err(SupervisorError::NotFound(_))));
    assert!(matches!(sup.disable("ghost").await, Err(SupervisorError::NotFound(_))));
    assert!(matches!(sup.job_status("ghost").await, Err(SupervisorError::NotFound(_))));
}

#[tokio::test]
async fn test_start_then_stop_prevents_second_cycle() {
    let dir = TempDir::new().unwrap();
    let (job, calls) = counting_job("scraping_feeds", Duration::from_millis(50));
    let sup = supervisor(&dir, vec![job]);

    sup.start("scraping_feeds").await.unwrap();
    assert_eq!(sup.stop("scraping_feeds").await.unwrap(), StopOutcome::Stopped);
    assert!(!sup.job_status("scraping_feeds").await.unwrap().running);

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(calls.load(Ordering::SeqCst) <= 1);
}

#[tokio::test]
async fn test_start_and_stop_persist_intent() {
    let dir = TempDir::new().unwrap();
    let (job, _) = counting_job("llm_updater", Duration::from_secs(60));
    let sup = supervisor(&dir, vec![job]);
    assert!(!sup.settings().is_enabled("llm_updater"));

    sup.start("llm_updater").await.unwrap();
    assert!(sup.settings().load()["llm_updater"]);

    sup.stop("llm_updater").await.unwrap();
    assert!(!sup.settings().load()["llm_updater"]);
}

#[tokio::test]
async fn test_precondition_failure_keeps_job_stopped() {
    let dir = TempDir::new().unwrap();
    let (job, calls) = counting_job("spacy_nlp", Duration::from_secs(60));
    let sup = supervisor(&dir, vec![job.with_precondition(|| false)]);

    assert_eq!(sup.start("spacy_nlp").await.unwrap(), StartOutcome::PreconditionFailed);
    let status = sup.job_status("spacy_nlp").await.unwrap();
    assert!(!status.running);
    assert!(!status.enabled);
    assert!(!sup.settings().load()["spacy_nlp"]);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_disable_persists_even_when_not_running() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("worker_settings.json");
    std::fs::write(&path, r#"{"rss_extractor": true}"#).unwrap();

    let registry = JobRegistry::new();
    registry.register(counting_job("rss_extractor", Duration::from_secs(60)).0).unwrap();
    let settings = Arc::new(SettingsStore::open(&path, Settings::new()));
    let sup = Supervisor::new(registry, settings);

    assert_eq!(sup.disable("rss_extractor").await.unwrap(), StopOutcome::NotRunning);
    assert!(!sup.settings().load()["rss_extractor"]);
    assert!(!sup.job_status("rss_extractor").await.unwrap().enabled);
}

#[tokio::test]
async fn test_stuck_body_does_not_block_stop() {
    let dir = TempDir::new().unwrap();
    let job = JobDescriptor::blocking("stubborn", Duration::from_secs(60), |_| {
        std::thread::sleep(Duration::from_millis(800));
        Ok(())
    });
    let sup = supervisor(&dir, vec![job]).with_grace_period(Duration::from_millis(50));

    sup.start("stubborn").await.unwrap();
    tokio::time::sleep(Duration::from_millis(20)).await;

    let started = Instant::now();
    assert_eq!(sup.stop("stubborn").await.unwrap(), StopOutcome::Stopped);
    assert!(started.elapsed() < Duration::from_millis(600));
    assert!(!sup.job_status("stubborn").await.unwrap().running);
}

#[tokio::test]
async fn test_restart_waits_for_unit_that_outlived_stop() {
    let dir = TempDir::new().unwrap();
    let active = Arc::new(AtomicU32::new(0));
    let peak = Arc::new(AtomicU32::new(0));
    let (body_active, body_peak) = (active.clone(), peak.clone());
    let job = JobDescriptor::blocking("stubborn", Duration::from_secs(60), move |_| {
        let now = body_active.fetch_add(1, Ordering::SeqCst) + 1;
        body_peak.fetch_max(now, Ordering::SeqCst);
        std::thread::sleep(Duration::from_millis(400));
        body_active.fetch_sub(1, Ordering::SeqCst);
        Ok(())
    });
    let sup = supervisor(&dir, vec![job]).with_grace_period(Duration::from_millis(50));

    sup.start("stubborn").await.unwrap();
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(sup.stop("stubborn").await.unwrap(), StopOutcome::Stopped);

    assert!(matches!(
        sup.start("stubborn").await,
        Err(SupervisorError::StillStopping(_))
    ));
    assert!(!sup.job_status("stubborn").await.unwrap().running);

    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(sup.start("stubborn").await.unwrap(), StartOutcome::Started);
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(peak.load(Ordering::SeqCst), 1);

    sup.stop("stubborn").await.unwrap();
}

#[tokio::test]
async fn test_enable_persists_intent_when_precondition_fails() {
    let dir = TempDir::new().unwrap();
    let ready = Arc::new(AtomicBool::new(false));
    let check = ready.clone();
    let (job, calls) = counting_job("spacy_nlp", Duration::from_secs(60));
    let sup = supervisor(
        &dir,
        vec![job.with_precondition(move || check.load(Ordering::SeqCst))],
    );

    assert_eq!(sup.enable("spacy_nlp").await.unwrap(), StartOutcome::PreconditionFailed);
    let status = sup.job_status("spacy_nlp").await.unwrap();
    assert!(status.enabled);
    assert!(!status.running);
    assert!(sup.settings().load()["spacy_nlp"]);

    ready.store(true, Ordering::SeqCst);
    let report = sup.reconcile().await;
    assert_eq!(report.started, vec!["spacy_nlp".to_string()]);
    assert!(sup.is_running("spacy_nlp").await.unwrap());

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    sup.stop("spacy_nlp").await.unwrap();
}

#[tokio::test]
async fn test_enable_running_job_reports_already_running() {
    let dir = TempDir::new().unwrap();
    let (job, _) = counting_job("google_alerts", Duration::from_secs(60));
    let sup = supervisor(&dir, vec![job]);

    assert_eq!(sup.enable("google_alerts").await.unwrap(), StartOutcome::Started);
    assert_eq!(sup.enable("google_alerts").await.unwrap(), StartOutcome::AlreadyRunning);
    assert!(matches!(sup.enable("ghost").await, Err(SupervisorError::NotFound(_))));

    sup.stop("google_alerts").await.unwrap();
}

#[tokio::test]
async fn test_task_kind_job() {
    let dir = TempDir::new().unwrap();
    let calls = Arc::new(AtomicU32::new(0));
    let counter = calls.clone();
    let job = JobDescriptor::asynchronous("db_poller", Duration::from_secs(60), move |_| {
        let counter = counter.clone();
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok::<(), JobError>(())
        }
    });
    let sup = supervisor(&dir, vec![job]);

    sup.start("db_poller").await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    let status = sup.job_status("db_poller").await.unwrap();
    assert!(status.running);
    assert_eq!(status.kind.as_deref(), Some("task"));

    sup.stop("db_poller").await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_process_kind_without_launcher_is_spawn_error() {
    let dir = TempDir::new().unwrap();
    let (job, _) = counting_job("dynamic_spider", Duration::from_secs(60));
    let sup = supervisor(&dir, vec![job.with_kind(ExecutionKind::Process)]);

    let err = sup.start("dynamic_spider").await.unwrap_err();
    assert!(matches!(err, SupervisorError::Spawn { .. }));
    assert!(!sup.job_status("dynamic_spider").await.unwrap().running);
    assert!(!sup.settings().is_enabled("dynamic_spider"));
}

#[cfg(unix)]
#[tokio::test]
async fn test_process_kind_job_is_terminated() {
    let dir = TempDir::new().unwrap();
    let (job, _) = counting_job("dynamic_spider", Duration::from_secs(60));
    let launcher = Arc::new(CommandLauncher::new("sleep").with_args(["30"]));
    let sup = supervisor(&dir, vec![job.with_kind(ExecutionKind::Process)]).with_launcher(launcher);

    assert_eq!(sup.start("dynamic_spider").await.unwrap(), StartOutcome::Started);
    assert!(sup.is_running("dynamic_spider").await.unwrap());

    let started = Instant::now();
    assert_eq!(sup.stop("dynamic_spider").await.unwrap(), StopOutcome::Stopped);
    assert!(started.elapsed() < Duration::from_secs(3));
    assert!(!sup.is_running("dynamic_spider").await.unwrap());
}

#[cfg(unix)]
#[tokio::test]
async fn test_exited_process_is_restarted() {
    let dir = TempDir::new().unwrap();
    let (job, _) = counting_job("crashy", Duration::from_secs(60));
    let launcher = Arc::new(CommandLauncher::new("sh").with_args(["-c", "exit 3"]));
    let sup = supervisor(&dir, vec![job.with_kind(ExecutionKind::Process)]).with_launcher(launcher);

    assert_eq!(sup.start("crashy").await.unwrap(), StartOutcome::Started);
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(!sup.job_status("crashy").await.unwrap().running);

    assert_eq!(sup.start("crashy").await.unwrap(), StartOutcome::Started);
}

#[tokio::test]
async fn test_status_includes_settings_only_names() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("worker_settings.json");
    std::fs::write(&path, r#"{"retired_job": true}"#).unwrap();

    let registry = JobRegistry::new();
    registry.register(counting_job("google_alerts", Duration::from_secs(60)).0).unwrap();
    let sup = Supervisor::new(registry, Arc::new(SettingsStore::open(&path, Settings::new())));

    let status = sup.status().await;
    assert_eq!(status.len(), 2);
    let retired = &status["retired_job"];
    assert!(retired.enabled);
    assert!(!retired.running);
    assert!(retired.kind.is_none());
    assert_eq!(status["google_alerts"].interval_secs, Some(60));
}

#[tokio::test]
async fn test_register_job_after_construction() {
    let dir = TempDir::new().unwrap();
    let sup = supervisor(&dir, vec![]);
    let (job, _) = counting_job("late", Duration::from_secs(60));

    sup.register_job(job.with_default_enabled(true)).unwrap();
    assert!(sup.registry().contains("late"));
    assert!(sup.settings().default_settings()["late"]);
    assert!(sup.job_status("late").await.unwrap().enabled);

    let (dup, _) = counting_job("late", Duration::from_secs(60));
    assert!(matches!(
        sup.register_job(dup),
        Err(SupervisorError::AlreadyRegistered(_))
    ));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_different_jobs_stop_in_parallel() {
    let dir = TempDir::new().unwrap();
    let slow = |name: &str| {
        JobDescriptor::blocking(name, Duration::from_secs(60), |_| {
            std::thread::sleep(Duration::from_millis(300));
            Ok(())
        })
    };
    let sup = Arc::new(supervisor(&dir, vec![slow("a"), slow("b")]));
    sup.start("a").await.unwrap();
    sup.start("b").await.unwrap();
    tokio::time::sleep(Duration::from_millis(20)).await;

    let started = Instant::now();
    let (a, b) = tokio::join!(sup.stop("a"), sup.stop("b"));
    assert_eq!(a.unwrap(), StopOutcome::Stopped);
    assert_eq!(b.unwrap(), StopOutcome::Stopped);
    assert!(started.elapsed() < Duration::from_millis(550));
}

#[test]
fn test_outcome_serialization() {
    assert_eq!(
        serde_json::to_string(&StartOutcome::PreconditionFailed).unwrap(),
        "\"precondition_failed\""
    );
    assert_eq!(serde_json::to_string(&StopOutcome::NotRunning).unwrap(), "\"not_running\"");
    assert_eq!(StartOutcome::AlreadyRunning.as_str(), "already_running");
    assert_eq!(StopOutcome::Stopped.as_str(), "stopped");
}
