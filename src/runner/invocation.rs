use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use serde_json::Value;
use tokio::process::{Child, Command};
use uuid::Uuid;

use crate::error::{Result, RunnerError};

/// Environment overlay applied to every worker process: unbuffered output,
/// UTF-8 text, no terminal color. Captured text stays plain and parseable.
pub const WORKER_ENV: &[(&str, &str)] = &[
    ("PYTHONUNBUFFERED", "1"),
    ("PYTHONIOENCODING", "utf-8"),
    ("NO_COLOR", "1"),
    ("TERM", "dumb"),
];

/// Interpreter flag forcing unbuffered stdio, passed before the script path.
pub const UNBUFFERED_FLAG: &str = "-u";

/// One worker process invocation: resolved program, argument vector, working
/// directory, and the delivery cell that guarantees the caller sees exactly
/// one result. Created per job, never reused.
#[derive(Debug)]
pub struct JobInvocation {
    job_id: Uuid,
    program: PathBuf,
    args: Vec<OsString>,
    workdir: PathBuf,
    delivered: Option<Result<Value>>,
}

impl JobInvocation {
    pub fn new(
        job_id: Uuid,
        program: PathBuf,
        script: PathBuf,
        goal_json: String,
        workdir: PathBuf,
    ) -> Self {
        let args = vec![
            OsString::from(UNBUFFERED_FLAG),
            script.into_os_string(),
            OsString::from(goal_json),
        ];
        Self {
            job_id,
            program,
            args,
            workdir,
            delivered: None,
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Spawn the worker with stdin closed and both output streams piped.
    ///
    /// The streams are never merged; stderr stays a pure diagnostic channel
    /// while stdout carries the result. `kill_on_drop` keeps an abandoned
    /// run from leaking the child.
    pub fn spawn(&self) -> Result<Child> {
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .current_dir(&self.workdir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        for (key, value) in WORKER_ENV {
            command.env(key, value);
        }
        command
            .spawn()
            .map_err(|source| RunnerError::Spawn { source })
    }

    /// Record the job's result. The first writer wins; later completion
    /// signals for the same invocation are dropped. Returns whether this
    /// call was the winning write.
    pub fn deliver(&mut self, result: Result<Value>) -> bool {
        if self.delivered.is_some() {
            tracing::debug!(job_id = %self.job_id, "Result already delivered, dropping duplicate");
            return false;
        }
        self.delivered = Some(result);
        true
    }

    /// Consume the invocation, yielding the single delivered result.
    pub fn into_result(self) -> Result<Value> {
        self.delivered.unwrap_or_else(|| {
            Err(RunnerError::Internal(
                "invocation finished without a result".to_string(),
            ))
        })
    }
}

/// Output buffers owned by one invocation. stdout and stderr are drained
/// concurrently and never intermixed.
#[derive(Debug, Default)]
pub struct CapturedOutput {
    pub stdout: String,
    pub stderr: String,
}

impl CapturedOutput {
    pub fn from_bytes(stdout: Vec<u8>, stderr: Vec<u8>) -> Self {
        Self {
            stdout: String::from_utf8_lossy(&stdout).into_owned(),
            stderr: String::from_utf8_lossy(&stderr).into_owned(),
        }
    }
}
