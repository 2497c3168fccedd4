use std::time::Instant;

use serde_json::Value;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Child;

use crate::config::WorkerConfig;
use crate::error::{Result, RunnerError};
use crate::job::{JobRequest, JobStatus};
use crate::runner::extract::{excerpt, extract_result, STDERR_EXCERPT_CHARS, STDOUT_EXCERPT_CHARS};
use crate::runner::invocation::{CapturedOutput, JobInvocation};
use crate::runner::resolve::resolve_interpreter;

/// Runs one external worker per request and converts its raw console output
/// into a structured result or a classified error.
#[derive(Debug, Clone)]
pub struct JobRunner {
    config: WorkerConfig,
}

impl JobRunner {
    pub fn new(config: WorkerConfig) -> Self {
        Self { config }
    }

    /// Run the worker to completion for `goal`.
    ///
    /// Validates the goal, resolves the interpreter, checks the script
    /// exists, then spawns one child with stdin closed and both streams
    /// piped. Both streams are fully drained before the exit status is
    /// classified. Every failure comes back as a [`RunnerError`] value;
    /// nothing is retried.
    pub async fn run(&self, goal: &str) -> Result<Value> {
        let request = JobRequest::new(goal)?;
        self.run_request(&request).await
    }

    /// Run a previously validated request.
    pub async fn run_request(&self, request: &JobRequest) -> Result<Value> {
        let config = self
            .config
            .absolute()
            .map_err(|e| RunnerError::Internal(format!("cannot resolve worker paths: {}", e)))?;

        let interpreter = match resolve_interpreter(&config.interpreters) {
            Some(path) => path,
            None => {
                let tried = config
                    .interpreters
                    .iter()
                    .map(|candidate| candidate.to_string())
                    .collect::<Vec<_>>()
                    .join(", ");
                tracing::error!(job_id = %request.id, tried = %tried, "No worker interpreter available");
                return Err(RunnerError::EnvironmentUnavailable { tried });
            }
        };

        let script = config.script_path();
        if !script.is_file() {
            tracing::error!(job_id = %request.id, script = %script.display(), "Worker script missing");
            return Err(RunnerError::ScriptNotFound { path: script });
        }

        let goal_json = serde_json::to_string(&request.goal)
            .map_err(|e| RunnerError::Internal(format!("goal encoding failed: {}", e)))?;

        let mut invocation = JobInvocation::new(
            request.id,
            interpreter,
            script,
            goal_json,
            config.worker_dir.clone(),
        );

        tracing::info!(
            job_id = %request.id,
            program = %invocation.program().display(),
            workdir = %config.worker_dir.display(),
            "Starting worker"
        );
        let started = Instant::now();

        let mut child = match invocation.spawn() {
            Ok(child) => child,
            Err(e) => {
                tracing::error!(job_id = %request.id, error = %e, "Worker failed to start");
                invocation.deliver(Err(e));
                return invocation.into_result();
            }
        };

        let stdout_task = tokio::spawn(drain(child.stdout.take()));
        let stderr_task = tokio::spawn(drain(child.stderr.take()));

        let status = match config.timeout {
            None => child.wait().await,
            Some(limit) => match tokio::time::timeout(limit, child.wait()).await {
                Ok(status) => status,
                Err(_) => {
                    tracing::warn!(
                        job_id = %request.id,
                        limit_secs = limit.as_secs_f64(),
                        "Worker exceeded time limit, killing"
                    );
                    invocation.deliver(Err(RunnerError::Timeout { limit }));
                    terminate(&mut child).await;
                    let _ = child.wait().await;
                    // Orphaned grandchildren can hold the pipes open past the
                    // kill; drop the drains rather than wait on their EOF.
                    stdout_task.abort();
                    stderr_task.abort();
                    return invocation.into_result();
                }
            },
        };

        // Both streams hit EOF once the child is gone; join before classifying
        // so the final buffers are complete.
        let stdout_buf = stdout_task.await.unwrap_or_default();
        let stderr_buf = stderr_task.await.unwrap_or_default();
        let output = CapturedOutput::from_bytes(stdout_buf, stderr_buf);

        let outcome = match status {
            Err(e) => Err(RunnerError::Internal(format!("worker wait failed: {}", e))),
            Ok(status) if status.success() => match extract_result(&output.stdout) {
                Some(payload) => Ok(payload),
                None => Err(RunnerError::Parse {
                    stdout_excerpt: excerpt(&output.stdout, STDOUT_EXCERPT_CHARS),
                }),
            },
            Ok(status) => Err(RunnerError::WorkerExit {
                code: status.code().unwrap_or(-1),
                stderr_excerpt: excerpt(&output.stderr, STDERR_EXCERPT_CHARS),
            }),
        };

        invocation.deliver(outcome);
        let result = invocation.into_result();

        let job_status = match &result {
            Ok(_) => JobStatus::Completed,
            Err(_) => JobStatus::Failed,
        };
        tracing::info!(
            job_id = %request.id,
            status = %job_status,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Worker finished"
        );

        result
    }
}

/// Read a piped stream to EOF, keeping whatever arrived if the read fails.
async fn drain<R>(stream: Option<R>) -> Vec<u8>
where
    R: AsyncRead + Unpin,
{
    let mut buf = Vec::new();
    if let Some(mut stream) = stream {
        if let Err(e) = stream.read_to_end(&mut buf).await {
            tracing::warn!(error = %e, "Worker output stream closed with error");
        }
    }
    buf
}

/// Kill the child if it is still running. Killing an already-exited child
/// is a no-op, so cleanup stays idempotent under exit/timeout races.
async fn terminate(child: &mut Child) {
    if let Ok(Some(_)) = child.try_wait() {
        return;
    }
    if let Err(e) = child.start_kill() {
        tracing::debug!(error = %e, "Kill signal not delivered, worker already gone");
    }
}
