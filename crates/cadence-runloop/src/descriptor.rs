//! Job descriptors.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use futures::FutureExt;

use crate::error::JobError;
use crate::token::CancellationToken;

/// Body run on a plain thread. Receives the token by reference.
pub type BlockingBody = Arc<dyn Fn(&CancellationToken) -> Result<(), JobError> + Send + Sync>;

/// Body run as a future.
pub type AsyncBody =
    Arc<dyn Fn(CancellationToken) -> BoxFuture<'static, Result<(), JobError>> + Send + Sync>;

/// Check evaluated before every start.
pub type Precondition = Arc<dyn Fn() -> bool + Send + Sync>;

/// What a single cycle of a job runs.
#[derive(Clone)]
pub enum JobBody {
    Blocking(BlockingBody),
    Async(AsyncBody),
}

/// Execution unit the scheduling loop is hosted on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ExecutionKind {
    #[default]
    Thread,
    Process,
    Task,
}

impl std::fmt::Display for ExecutionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExecutionKind::Thread => write!(f, "thread"),
            ExecutionKind::Process => write!(f, "process"),
            ExecutionKind::Task => write!(f, "task"),
        }
    }
}

/// Immutable description of a recurring job.
#[derive(Clone)]
pub struct JobDescriptor {
    name: String,
    interval: Duration,
    kind: ExecutionKind,
    body: JobBody,
    precondition: Option<Precondition>,
    default_enabled: bool,
}

impl JobDescriptor {
    /// A job whose body blocks. Runs on a thread unless told otherwise.
    pub fn blocking<F>(name: impl Into<String>, interval: Duration, body: F) -> Self
    where
        F: Fn(&CancellationToken) -> Result<(), JobError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            interval,
            kind: ExecutionKind::Thread,
            body: JobBody::Blocking(Arc::new(body)),
            precondition: None,
            default_enabled: false,
        }
    }

    /// A job whose body is async. Runs as a runtime task unless told otherwise.
    pub fn asynchronous<F, Fut>(name: impl Into<String>, interval: Duration, body: F) -> Self
    where
        F: Fn(CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), JobError>> + Send + 'static,
    {
        let body: AsyncBody = Arc::new(move |token| body(token).boxed());
        Self {
            name: name.into(),
            interval,
            kind: ExecutionKind::Task,
            body: JobBody::Async(body),
            precondition: None,
            default_enabled: false,
        }
    }

    pub fn with_kind(mut self, kind: ExecutionKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_precondition<F>(mut self, check: F) -> Self
    where
        F: Fn() -> bool + Send + Sync + 'static,
    {
        self.precondition = Some(Arc::new(check));
        self
    }

    pub fn with_default_enabled(mut self, enabled: bool) -> Self {
        self.default_enabled = enabled;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn kind(&self) -> ExecutionKind {
        self.kind
    }

    pub fn body(&self) -> &JobBody {
        &self.body
    }

    pub fn default_enabled(&self) -> bool {
        self.default_enabled
    }

    /// Evaluate the precondition. Jobs without one may always start.
    pub fn precondition_holds(&self) -> bool {
        self.precondition.as_ref().is_none_or(|check| check())
    }
}

impl std::fmt::Debug for JobDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let body = match self.body {
            JobBody::Blocking(_) => "blocking",
            JobBody::Async(_) => "async",
        };
        f.debug_struct("JobDescriptor")
            .field("name", &self.name)
            .field("interval", &self.interval)
            .field("kind", &self.kind)
            .field("body", &body)
            .field("has_precondition", &self.precondition.is_some())
            .field("default_enabled", &self.default_enabled)
            .finish()
    }
}
