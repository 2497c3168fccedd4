use std::path::PathBuf;
use std::time::Duration;

/// One strategy for locating the worker interpreter.
///
/// Candidates are tried in order; the first that resolves wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InterpreterCandidate {
    /// Interpreter at a fixed path, typically inside a project virtualenv.
    /// Resolves when the file exists on disk.
    Bundled(PathBuf),
    /// Command looked up through the `PATH` search, which-style.
    System(String),
}

impl std::fmt::Display for InterpreterCandidate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InterpreterCandidate::Bundled(path) => write!(f, "{}", path.display()),
            InterpreterCandidate::System(command) => write!(f, "{}", command),
        }
    }
}

/// Configuration for the external worker process.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Directory the worker runs in; also the base for relative script paths
    /// and the default virtualenv candidates. May itself be relative to the
    /// process working directory; see [`WorkerConfig::absolute`].
    pub worker_dir: PathBuf,
    /// Worker script, relative to `worker_dir` unless absolute.
    pub script: PathBuf,
    /// Interpreter candidates, tried in order.
    pub interpreters: Vec<InterpreterCandidate>,
    /// Upper bound on worker runtime. `None` means unbounded; pipeline runs
    /// can legitimately take tens of minutes.
    pub timeout: Option<Duration>,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self::new("backend")
    }
}

impl WorkerConfig {
    /// Config for a worker rooted at `worker_dir`, with the default script
    /// and interpreter candidates: the virtualenv `python3`, the virtualenv
    /// `python`, then the system `python3`.
    pub fn new(worker_dir: impl Into<PathBuf>) -> Self {
        let worker_dir = worker_dir.into();
        let interpreters = vec![
            InterpreterCandidate::Bundled(worker_dir.join("venv/bin/python3")),
            InterpreterCandidate::Bundled(worker_dir.join("venv/bin/python")),
            InterpreterCandidate::System("python3".to_string()),
        ];
        Self {
            worker_dir,
            script: PathBuf::from("run_demo_cli.py"),
            interpreters,
            timeout: None,
        }
    }

    pub fn with_script(mut self, script: impl Into<PathBuf>) -> Self {
        self.script = script.into();
        self
    }

    pub fn with_interpreters(mut self, interpreters: Vec<InterpreterCandidate>) -> Self {
        self.interpreters = interpreters;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Path to the worker script. Absolute `script` values are used as-is.
    pub fn script_path(&self) -> PathBuf {
        self.worker_dir.join(&self.script)
    }

    /// Copy of this config with `worker_dir` and bundled interpreter paths
    /// made absolute, resolved against the process working directory.
    ///
    /// The worker is spawned with its cwd set to `worker_dir`, so a relative
    /// launch path would be re-resolved from inside that directory by the
    /// child. Launching always goes through this view.
    pub fn absolute(&self) -> std::io::Result<Self> {
        let interpreters = self
            .interpreters
            .iter()
            .map(|candidate| match candidate {
                InterpreterCandidate::Bundled(path) => {
                    std::path::absolute(path).map(InterpreterCandidate::Bundled)
                }
                InterpreterCandidate::System(command) => {
                    Ok(InterpreterCandidate::System(command.clone()))
                }
            })
            .collect::<std::io::Result<Vec<_>>>()?;
        Ok(Self {
            worker_dir: std::path::absolute(&self.worker_dir)?,
            script: self.script.clone(),
            interpreters,
            timeout: self.timeout,
        })
    }
}
