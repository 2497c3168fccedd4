use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use crate::config::InterpreterCandidate;

/// Resolve the worker interpreter from an ordered candidate list.
///
/// Bundled candidates are a plain file-existence check; system candidates
/// are a which-style lookup through `PATH`. Returns the first candidate that
/// resolves. Nothing is spawned here, so resolution can be tested without
/// touching the process table.
pub fn resolve_interpreter(candidates: &[InterpreterCandidate]) -> Option<PathBuf> {
    candidates.iter().find_map(|candidate| match candidate {
        InterpreterCandidate::Bundled(path) => path.is_file().then(|| path.clone()),
        InterpreterCandidate::System(command) => {
            let path_var = std::env::var_os("PATH")?;
            find_in_path(command, &path_var)
        }
    })
}

/// Search each entry of `path_var` for an executable file named `command`.
pub fn find_in_path(command: &str, path_var: &OsStr) -> Option<PathBuf> {
    std::env::split_paths(path_var)
        .filter(|dir| !dir.as_os_str().is_empty())
        .map(|dir| dir.join(command))
        .find(|candidate| is_executable(candidate))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
