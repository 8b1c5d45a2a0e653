//! Execution handle behaviour across the thread and task kinds.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use cadence_runloop::{
    spawn_execution, CancellationToken, CommandLauncher, ExecutionKind, JobDescriptor, JobError,
    TaskHandle, ThreadHandle, ExecutionHandle,
};

fn counting_blocking(counter: Arc<AtomicU32>, interval: Duration) -> JobDescriptor {
    JobDescriptor::blocking("counting", interval, move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(())
    })
}

#[tokio::test]
async fn test_thread_handle_stops_on_cancel() {
    let counter = Arc::new(AtomicU32::new(0));
    let token = CancellationToken::new();
    let handle =
        ThreadHandle::spawn(counting_blocking(counter.clone(), Duration::from_secs(60)), token.clone())
            .unwrap();

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(handle.is_alive());
    assert_eq!(counter.load(Ordering::SeqCst), 1);

    token.cancel();
    handle.force_stop();
    assert!(handle.join(Duration::from_secs(2)).await);
    assert!(!handle.is_alive());
    assert_eq!(counter.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_thread_handle_join_times_out_on_stuck_body() {
    let token = CancellationToken::new();
    let job = JobDescriptor::blocking("stuck", Duration::from_secs(60), |_| {
        std::thread::sleep(Duration::from_millis(500));
        Ok(())
    });
    let handle = ThreadHandle::spawn(job, token.clone()).unwrap();
    tokio::time::sleep(Duration::from_millis(20)).await;

    token.cancel();
    assert!(!handle.join(Duration::from_millis(50)).await);
    assert!(handle.is_alive());
    // The body finishes its cycle and the loop observes cancellation.
    assert!(handle.join(Duration::from_secs(2)).await);
}

#[tokio::test]
async fn test_task_handle_stops_on_cancel() {
    let counter = Arc::new(AtomicU32::new(0));
    let seen = counter.clone();
    let job = JobDescriptor::asynchronous("task_counting", Duration::from_secs(60), move |_| {
        let seen = seen.clone();
        async move {
            seen.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    });
    let token = CancellationToken::new();
    let handle = TaskHandle::spawn(job, token.clone()).unwrap();
    assert_eq!(handle.kind(), ExecutionKind::Task);

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(handle.is_alive());

    token.cancel();
    assert!(handle.join(Duration::from_secs(2)).await);
    assert_eq!(counter.load(Ordering::SeqCst), 1);
}

#[test]
fn test_task_handle_requires_runtime() {
    let job = JobDescriptor::asynchronous("no_runtime", Duration::from_secs(1), |_| async { Ok(()) });
    let result = TaskHandle::spawn(job, CancellationToken::new());
    assert!(matches!(result, Err(JobError::Spawn(_))));
}

#[tokio::test]
async fn test_spawn_execution_dispatches_on_kind() {
    let token = CancellationToken::new();
    let thread_job = counting_blocking(Arc::new(AtomicU32::new(0)), Duration::from_secs(60));
    let task_job = thread_job.clone().with_kind(ExecutionKind::Task);

    let thread = spawn_execution(&thread_job, token.clone(), None).unwrap();
    let task = spawn_execution(&task_job, token.clone(), None).unwrap();
    assert_eq!(thread.kind(), ExecutionKind::Thread);
    assert_eq!(task.kind(), ExecutionKind::Task);

    token.cancel();
    assert!(thread.join(Duration::from_secs(2)).await);
    assert!(task.join(Duration::from_secs(2)).await);
}

#[tokio::test]
async fn test_process_kind_without_launcher_fails() {
    let job = counting_blocking(Arc::new(AtomicU32::new(0)), Duration::from_secs(1))
        .with_kind(ExecutionKind::Process);
    let result = spawn_execution(&job, CancellationToken::new(), None);
    assert!(matches!(result, Err(JobError::Spawn(_))));
}

#[cfg(unix)]
#[tokio::test]
async fn test_spawn_execution_process_kind() {
    let job = counting_blocking(Arc::new(AtomicU32::new(0)), Duration::from_secs(1))
        .with_kind(ExecutionKind::Process);
    let launcher = CommandLauncher::new("sleep").with_args(["30"]);
    let handle = spawn_execution(&job, CancellationToken::new(), Some(&launcher)).unwrap();
    assert_eq!(handle.kind(), ExecutionKind::Process);
    assert!(handle.is_alive());

    handle.force_stop();
    assert!(handle.join(Duration::from_secs(5)).await);
}
