//! Process supervisor for long-running services with graceful shutdown.
//!
//! App processes run concurrently until one fails or an interrupt signal
//! arrives; every process receives the shared cancellation token and is
//! expected to unwind cooperatively. In-flight work gets a bounded drain
//! window after cancellation, then is aborted. Closers run afterward,
//! regardless of outcome.
//!
//! # Example
//!
//! ```no_run
//! use edgelog_runner::Runner;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() {
//!     let runner = Runner::new()
//!         .with_process(|ctx| async move {
//!             ctx.cancelled().await;
//!             tracing::info!("process stopping gracefully");
//!             Ok(())
//!         })
//!         .with_closer(|| async move {
//!             tracing::info!("flushing");
//!             Ok(())
//!         })
//!         .with_drain_timeout(Duration::from_secs(20));
//!
//!     runner.run().await;
//! }
//! ```

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

type BoxedFuture = Pin<Box<dyn Future<Output = Result<(), anyhow::Error>> + Send>>;

/// An app process: receives the shutdown token, runs until done or cancelled.
type Process = Box<dyn FnOnce(CancellationToken) -> BoxedFuture + Send>;

/// A cleanup function executed after all processes have stopped.
type Closer = Box<dyn FnOnce() -> BoxedFuture + Send>;

pub struct Runner {
    processes: Vec<Process>,
    closers: Vec<Closer>,
    drain_timeout: Duration,
    closer_timeout: Duration,
    shutdown_token: CancellationToken,
}

impl Default for Runner {
    fn default() -> Self {
        Self::new()
    }
}

impl Runner {
    pub fn new() -> Self {
        Self {
            processes: Vec::new(),
            closers: Vec::new(),
            drain_timeout: Duration::from_secs(20),
            closer_timeout: Duration::from_secs(10),
            shutdown_token: CancellationToken::new(),
        }
    }

    /// Add an app process. If any process returns an error, the token is
    /// cancelled so the remaining processes can drain.
    pub fn with_process<F, Fut>(mut self, process: F) -> Self
    where
        F: FnOnce(CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), anyhow::Error>> + Send + 'static,
    {
        self.processes
            .push(Box::new(|token| Box::pin(process(token))));
        self
    }

    /// Add a closer, executed after every process has stopped.
    pub fn with_closer<F, Fut>(mut self, closer: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), anyhow::Error>> + Send + 'static,
    {
        self.closers.push(Box::new(|| Box::pin(closer())));
        self
    }

    /// Bound on how long in-flight processes may take to unwind after
    /// cancellation before being aborted.
    pub fn with_drain_timeout(mut self, timeout: Duration) -> Self {
        self.drain_timeout = timeout;
        self
    }

    /// Bound on closer execution.
    pub fn with_closer_timeout(mut self, timeout: Duration) -> Self {
        self.closer_timeout = timeout;
        self
    }

    /// Use an externally controlled shutdown token instead of a fresh one.
    pub fn with_shutdown_token(mut self, token: CancellationToken) -> Self {
        self.shutdown_token = token;
        self
    }

    /// Run to completion and exit the process: status 0 on clean
    /// shutdown, 1 when any process failed (a listener that cannot bind
    /// surfaces here as a failed process).
    pub async fn run(self) -> ! {
        let code = self.execute().await;
        if code == 0 {
            info!("Application exiting normally");
        }
        std::process::exit(code);
    }

    /// The testable body of [`run`]: returns the process exit code
    /// instead of exiting.
    pub async fn execute(self) -> i32 {
        let token = self.shutdown_token;
        let mut join_set = JoinSet::new();

        for process in self.processes {
            let process_token = token.clone();
            join_set.spawn(async move { process(process_token).await });
        }

        spawn_signal_listener(token.clone());

        // Wait until every process finishes, or until the first failure
        // or shutdown signal triggers cancellation
        let mut first_error: Option<anyhow::Error> = None;
        while let Some(result) = join_set.join_next().await {
            match result {
                Ok(Ok(())) => debug!("app process completed"),
                Ok(Err(err)) => {
                    error!("App process error: {:#}", err);
                    if first_error.is_none() {
                        first_error = Some(err);
                    }
                    token.cancel();
                }
                Err(join_err) => {
                    error!("App process panicked: {}", join_err);
                    if first_error.is_none() {
                        first_error = Some(anyhow::anyhow!("app process panicked: {join_err}"));
                    }
                    token.cancel();
                }
            }

            if token.is_cancelled() {
                break;
            }
        }

        // Bounded drain: give in-flight processes a chance to observe the
        // token and unwind, then abort whatever is left
        let drained = tokio::time::timeout(self.drain_timeout, async {
            while let Some(result) = join_set.join_next().await {
                match result {
                    Ok(Ok(())) => debug!("app process drained"),
                    Ok(Err(err)) => warn!("App process error during drain: {:#}", err),
                    Err(join_err) => warn!("App process panicked during drain: {}", join_err),
                }
            }
        })
        .await;

        if drained.is_err() {
            warn!(
                timeout_secs = self.drain_timeout.as_secs(),
                "Drain deadline exceeded, aborting remaining processes"
            );
            join_set.shutdown().await;
        }

        if !self.closers.is_empty() {
            info!("Running closers");
            match tokio::time::timeout(self.closer_timeout, run_closers(self.closers)).await {
                Ok(()) => info!("All closers completed"),
                Err(_) => error!(
                    timeout_secs = self.closer_timeout.as_secs(),
                    "Closers timed out"
                ),
            }
        }

        match first_error {
            Some(err) => {
                error!("Application exiting with error: {:#}", err);
                1
            }
            None => 0,
        }
    }
}

fn spawn_signal_listener(token: CancellationToken) {
    tokio::spawn(async move {
        let interrupt = tokio::signal::ctrl_c();

        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};
            let mut sigterm = match signal(SignalKind::terminate()) {
                Ok(sigterm) => sigterm,
                Err(err) => {
                    error!("Error setting up SIGTERM handler: {}", err);
                    return;
                }
            };
            tokio::select! {
                result = interrupt => {
                    if let Err(err) = result {
                        error!("Error setting up interrupt handler: {}", err);
                        return;
                    }
                    info!("Received interrupt signal");
                }
                _ = sigterm.recv() => info!("Received SIGTERM signal"),
            }
        }

        #[cfg(not(unix))]
        {
            if let Err(err) = interrupt.await {
                error!("Error setting up interrupt handler: {}", err);
                return;
            }
            info!("Received interrupt signal");
        }

        token.cancel();
    });
}

/// Run all closers concurrently; every closer attempts to execute even if
/// some fail.
async fn run_closers(closers: Vec<Closer>) {
    let mut closer_set = JoinSet::new();

    for closer in closers {
        closer_set.spawn(async move { closer().await });
    }

    while let Some(result) = closer_set.join_next().await {
        match result {
            Ok(Ok(())) => debug!("closer completed"),
            Ok(Err(err)) => error!("Closer error: {:#}", err),
            Err(join_err) => error!("Closer panicked: {}", join_err),
        }
    }
}
