//! Case Execution Engine
//!
//! **Core Responsibility:**
//! Invoke the solution once per test case and measure what the call cost.
//!
//! **Per-case sequence:**
//! 1. Sample CPU ticks, then start the wall clock
//! 2. Invoke the solution on a dedicated worker thread with stdout captured
//! 3. Stop the wall clock, sample CPU ticks and the peak-memory mark
//! 4. Classify the outcome
//!
//! **Critical Architectural Boundary:**
//! - Engine measures; it never enforces limits
//! - Engine does NOT shape report records (report.rs does)
//! - A failing case never fails the batch
//!
//! Tick deltas are process-wide, so cases run strictly one at a time.
//!
//! **Worker stack:**
//! Each invocation gets a fresh thread whose stack size is configurable, so
//! deeply recursive solutions do not take the harness down. Panics are
//! contained; a stack overflow beyond the configured size is a process abort
//! and still ends the run.

use std::any::Any;
use std::io;
use std::sync::Arc;
use std::thread;
use std::time::Instant;

use caseprobe_common::solution::{Solution, SolutionResult};
use caseprobe_common::types::{CaseStatus, ExecutionOutcome, InputVector, ResourceUsage};
use thiserror::Error;
use tokio::sync::oneshot;
use tracing::{debug, warn};

use crate::capture::{with_captured_output, CaptureError, Captured};
use crate::procfs::{MetricsSource, ProcfsReader};
use crate::report::CaseExecution;

/// Stack reserved for each solution thread unless configured otherwise
pub const DEFAULT_SOLUTION_STACK_BYTES: usize = 256 * 1024 * 1024;

const SOLUTION_THREAD_NAME: &str = "caseprobe-solution";

#[derive(Debug, Error)]
enum WorkerError {
    #[error("failed to start solution thread: {0}")]
    Spawn(#[source] io::Error),

    #[error("solution thread exited without reporting")]
    Vanished,
}

pub struct CaseExecutor {
    solution: Arc<dyn Solution>,
    metrics: Arc<dyn MetricsSource>,
    stack_size: usize,
}

impl CaseExecutor {
    /// Executor measuring the current process through procfs
    pub fn new(solution: Arc<dyn Solution>) -> Self {
        Self::with_metrics(solution, Arc::new(ProcfsReader::current_process()))
    }

    pub fn with_metrics(solution: Arc<dyn Solution>, metrics: Arc<dyn MetricsSource>) -> Self {
        Self {
            solution,
            metrics,
            stack_size: DEFAULT_SOLUTION_STACK_BYTES,
        }
    }

    /// Stack size in bytes for each solution thread
    pub fn with_stack_size(mut self, bytes: usize) -> Self {
        self.stack_size = bytes;
        self
    }

    pub fn solution_name(&self) -> &str {
        self.solution.name()
    }

    /// Run one case
    ///
    /// ## Arguments
    /// * `key` - Case key, used for diagnostics only
    /// * `input` - Positional arguments for the solution
    ///
    /// ## Returns
    /// Outcome, resource usage and captured stdout. Never an error: every
    /// failure mode of the solution is folded into the outcome.
    #[tracing::instrument(skip(self, key, input), fields(case = %key, args = input.len()))]
    pub async fn execute(&self, key: &str, input: InputVector) -> CaseExecution {
        debug!(status = %CaseStatus::Pending, "Case queued");

        let solution = Arc::clone(&self.solution);

        let ticks_before = self.metrics.cpu_ticks();
        let start = Instant::now();
        debug!(status = %CaseStatus::Running, "Invoking solution");

        let joined = self.run_isolated(move || {
            with_captured_output(|| solution.solve(&input))
        })
        .await;

        let realtime = start.elapsed().as_secs_f64();
        let ticks = self.metrics.cpu_ticks().since(&ticks_before);
        let max_memory = self.metrics.peak_memory();

        let (outcome, stdout) = classify(joined);

        let status = outcome.status();
        debug!(
            %status,
            utime = ticks.user,
            stime = ticks.system,
            realtime_ms = realtime * 1000.0,
            max_memory,
            stdout_bytes = stdout.len(),
            "Case finished"
        );

        CaseExecution {
            outcome,
            usage: ResourceUsage {
                utime: ticks.user,
                stime: ticks.system,
                realtime,
                max_memory,
            },
            stdout,
        }
    }
}

impl CaseExecutor {
    /// Run `f` on its own thread and wait for it without blocking the runtime
    async fn run_isolated<F, R>(&self, f: F) -> Result<R, WorkerError>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        let (tx, rx) = oneshot::channel();

        thread::Builder::new()
            .name(SOLUTION_THREAD_NAME.to_string())
            .stack_size(self.stack_size)
            .spawn(move || {
                let _ = tx.send(f());
            })
            .map_err(WorkerError::Spawn)?;

        rx.await.map_err(|_| WorkerError::Vanished)
    }
}

type Joined = Result<Result<Captured<SolutionResult>, CaptureError>, WorkerError>;

/// Fold every way a call can end into an outcome plus whatever stdout exists
fn classify(joined: Joined) -> (ExecutionOutcome, String) {
    match joined {
        Ok(Ok(Captured {
            outcome: Ok(result),
            stdout,
        })) => {
            if let Err(e) = &result {
                debug!(error = %e, "Solution reported failure");
            }
            (ExecutionOutcome::from(result), stdout)
        }
        Ok(Ok(Captured {
            outcome: Err(payload),
            stdout,
        })) => {
            warn!(
                panic = panic_message(payload.as_ref()).unwrap_or("<non-string payload>"),
                "Solution panicked"
            );
            (ExecutionOutcome::unknown_failure(), stdout)
        }
        Ok(Err(e)) => {
            warn!(error = %e, "Output capture failed");
            (
                ExecutionOutcome::Failure(format!("output capture failed: {}", e)),
                String::new(),
            )
        }
        Err(e @ WorkerError::Spawn(_)) => {
            warn!(error = %e, "Solution was not run");
            (ExecutionOutcome::Failure(e.to_string()), String::new())
        }
        Err(e @ WorkerError::Vanished) => {
            warn!(error = %e, "Solution worker terminated abnormally");
            (ExecutionOutcome::unknown_failure(), String::new())
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> Option<&str> {
    payload
        .downcast_ref::<&'static str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
}
