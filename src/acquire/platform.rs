use std::path::PathBuf;

/// Host platform identity, captured once per process.
///
/// Built from [`std::env::consts`] in production, or from explicit strings in
/// tests so every row of the alias table can be exercised regardless of the
/// machine running the suite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Platform {
    os: String,
    arch: String,
}

impl Platform {
    pub fn current() -> Self {
        Self::new(std::env::consts::OS, std::env::consts::ARCH)
    }

    pub fn new(os: &str, arch: &str) -> Self {
        Self {
            os: os.to_string(),
            arch: arch.to_string(),
        }
    }

    pub fn os(&self) -> &str {
        &self.os
    }

    /// Remaps the runtime architecture name to the release-naming
    /// convention. Unrecognized architectures pass through unchanged.
    fn arch_alias(&self) -> &str {
        match self.arch.as_str() {
            "x86_64" => "x86_64",
            "x86" => "i686",
            "arm" => {
                if self.os == "android" {
                    "armv7a"
                } else {
                    "armhf"
                }
            }
            "aarch64" => "aarch64",
            "loongarch64" => "loongarch64",
            other => other,
        }
    }

    /// Canonical `{os}_{arch}` tag identifying a release build.
    pub fn variant(&self) -> String {
        format!("{}_{}", self.os, self.arch_alias())
    }

    /// File name of the binary, optionally qualified with the variant tag
    /// (release assets are qualified, the installed file is not).
    pub fn executable_name(&self, base: &str, qualified: bool) -> String {
        let mut name = base.to_string();
        if qualified {
            name.push('_');
            name.push_str(&self.variant());
        }
        if self.os == "windows" {
            name.push_str(".exe");
        }
        name
    }

    /// Names the locator should try, in order. Android app bundles ship the
    /// binary under a shared-library name, so that alternate is tried too.
    pub fn candidate_names(&self, base: &str) -> Vec<String> {
        let mut names = vec![self.executable_name(base, false)];
        if self.os == "android" {
            names.push(format!("lib{base}.so"));
        }
        names
    }

    /// Directory containing the currently running executable.
    pub fn exec_dir() -> PathBuf {
        std::env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(|d| d.to_path_buf()))
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// OS-conventional per-user binary directory; falls back to the running
    /// executable's directory when the home directory is unknown.
    pub fn user_bin_dir(&self) -> PathBuf {
        match dirs::home_dir() {
            Some(home) if self.os == "windows" => {
                home.join("AppData").join("Local").join("Programs")
            }
            Some(home) => home.join(".local").join("bin"),
            None => Self::exec_dir(),
        }
    }
}
