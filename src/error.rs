use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RunnerError {
    #[error("Goal must be a non-empty string")]
    InvalidRequest,

    #[error("No usable worker interpreter found (tried: {tried})")]
    EnvironmentUnavailable { tried: String },

    #[error("Worker script not found: {}", path.display())]
    ScriptNotFound { path: PathBuf },

    #[error("Failed to start worker process: {source}")]
    Spawn { source: std::io::Error },

    #[error("Worker exited with code {code}: {stderr_excerpt}")]
    WorkerExit { code: i32, stderr_excerpt: String },

    #[error("No parseable result in worker output: {stdout_excerpt}")]
    Parse { stdout_excerpt: String },

    #[error("Worker timed out after {:.1}s", limit.as_secs_f64())]
    Timeout { limit: Duration },

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, RunnerError>;
