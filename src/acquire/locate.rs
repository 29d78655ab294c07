use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::acquire::platform::Platform;
use crate::constants::VERSION_PROBE_ARG;

/// Finds a directory + file combination that is both present and launchable.
///
/// Search order, first match wins: the running executable's own directory,
/// the per-user binary directory, then every `PATH` hit. Returning `None` is
/// not an error, it signals "must fetch".
pub struct Locator {
    platform: Platform,
    base_name: String,
    bin_dir_override: Option<PathBuf>,
}

impl Locator {
    pub fn new(platform: Platform, base_name: &str, bin_dir_override: Option<PathBuf>) -> Self {
        Self {
            platform,
            base_name: base_name.to_string(),
            bin_dir_override,
        }
    }

    /// Directory new binaries are installed to.
    pub fn user_bin_dir(&self) -> PathBuf {
        self.bin_dir_override
            .clone()
            .unwrap_or_else(|| self.platform.user_bin_dir())
    }

    pub fn locate(&self) -> Option<PathBuf> {
        for name in self.platform.candidate_names(&self.base_name) {
            let candidate = Platform::exec_dir().join(&name);
            if is_valid_executable(&candidate) {
                return Some(candidate);
            }

            let candidate = self.user_bin_dir().join(&name);
            if is_valid_executable(&candidate) {
                return Some(candidate);
            }

            for candidate in which::which_all(&name).into_iter().flatten() {
                if is_valid_executable(&candidate) {
                    return Some(candidate);
                }
            }
        }
        None
    }
}

/// A candidate is valid only if it exists, is a regular file, and a version
/// probe invocation exits successfully with its output suppressed.
pub fn is_valid_executable(path: &Path) -> bool {
    match std::fs::metadata(path) {
        Ok(meta) if meta.is_file() => {}
        _ => return false,
    }
    Command::new(path)
        .arg(VERSION_PROBE_ARG)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}
