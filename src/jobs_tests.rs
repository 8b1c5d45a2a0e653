use super::*;
use std::time::Instant;

#[test]
fn test_blocking_success() {
    let cmd = ShellCommand::new("ok", "true");
    assert!(cmd.run_blocking(&CancellationToken::new()).is_ok());
}

#[test]
fn test_blocking_nonzero_exit_fails() {
    let cmd = ShellCommand::new("bad", "exit 3");
    let err = cmd.run_blocking(&CancellationToken::new()).unwrap_err();
    assert!(matches!(err, JobError::Failed(_)));
    assert!(err.to_string().contains("exit 3"));
}

#[test]
fn test_blocking_runs_in_working_dir() {
    let dir = tempfile::tempdir().unwrap();
    let cmd = ShellCommand::new("touch", "touch marker")
        .with_working_dir(Some(dir.path().to_path_buf()));
    cmd.run_blocking(&CancellationToken::new()).unwrap();
    assert!(dir.path().join("marker").exists());
}

#[test]
fn test_blocking_cancel_kills_child() {
    let cmd = ShellCommand::new("slow", "sleep 30");
    let token = CancellationToken::new();
    let canceller = token.clone();
    let started = Instant::now();
    std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(100));
        canceller.cancel();
    });

    let err = cmd.run_blocking(&token).unwrap_err();
    assert!(err.is_cancelled());
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn test_async_success_and_failure() {
    let ok = ShellCommand::new("ok", "true");
    assert!(ok.run_async(CancellationToken::new()).await.is_ok());

    let bad = ShellCommand::new("bad", "false");
    let err = bad.run_async(CancellationToken::new()).await.unwrap_err();
    assert!(matches!(err, JobError::Failed(_)));
}

#[tokio::test]
async fn test_async_cancel_kills_child() {
    let cmd = ShellCommand::new("slow", "sleep 30");
    let token = CancellationToken::new();
    let canceller = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        canceller.cancel();
    });

    let started = Instant::now();
    let err = cmd.run_async(token).await.unwrap_err();
    assert!(err.is_cancelled());
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[test]
fn test_missing_working_dir_is_io_error() {
    let cmd = ShellCommand::new("nowhere", "true")
        .with_working_dir(Some(PathBuf::from("/definitely/not/here")));
    let err = cmd.run_blocking(&CancellationToken::new()).unwrap_err();
    assert!(matches!(err, JobError::Io(_)));
}
