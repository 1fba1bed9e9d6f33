//! Go toolchain locations and target platform.

use std::path::{Path, PathBuf};

use tracing::debug;

/// The newest `go1.N` release tag assumed when `$GOROOT/VERSION` is absent.
const DEFAULT_GO_MINOR: u32 = 24;

/// Toolchain environment captured once per run.
///
/// Built from the process environment with [`GoEnv::from_env`], or assembled
/// explicitly in tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoEnv {
    /// `$GOROOT`; the standard library lives in `<goroot>/src`.
    pub goroot: Option<PathBuf>,
    /// `$GOPATH` entries.
    pub gopath: Vec<PathBuf>,
    /// `$GOMODCACHE`, defaulting to `<first gopath>/pkg/mod`.
    pub gomodcache: Option<PathBuf>,
    /// Target operating system.
    pub goos: String,
    /// Target architecture.
    pub goarch: String,
    /// Newest satisfied `go1.N` release tag.
    pub go_minor: u32,
}

impl Default for GoEnv {
    fn default() -> Self {
        Self {
            goroot: None,
            gopath: Vec::new(),
            gomodcache: None,
            goos: host_goos().to_string(),
            goarch: host_goarch().to_string(),
            go_minor: DEFAULT_GO_MINOR,
        }
    }
}

impl GoEnv {
    /// Reads `GOROOT`, `GOPATH`, `GOMODCACHE`, `GOOS` and `GOARCH`.
    ///
    /// `GOPATH` defaults to `~/go`; `GOROOT` falls back to a few common
    /// installation directories.
    #[must_use]
    pub fn from_env() -> Self {
        let var = |name: &str| std::env::var_os(name).filter(|v| !v.is_empty());

        let goroot = var("GOROOT").map(PathBuf::from).or_else(default_goroot);
        let gopath: Vec<PathBuf> = match var("GOPATH") {
            Some(value) => std::env::split_paths(&value).collect(),
            None => home::home_dir()
                .map(|home| vec![home.join("go")])
                .unwrap_or_default(),
        };
        let gomodcache = var("GOMODCACHE")
            .map(PathBuf::from)
            .or_else(|| gopath.first().map(|p| p.join("pkg").join("mod")));

        let mut env = Self {
            go_minor: goroot
                .as_deref()
                .and_then(read_go_minor)
                .unwrap_or(DEFAULT_GO_MINOR),
            goroot,
            gopath,
            gomodcache,
            ..Self::default()
        };
        if let Some(goos) = var("GOOS").and_then(|v| v.into_string().ok()) {
            env.goos = goos;
        }
        if let Some(goarch) = var("GOARCH").and_then(|v| v.into_string().ok()) {
            env.goarch = goarch;
        }
        debug!(
            "Go environment: GOROOT={:?} GOPATH={:?} GOMODCACHE={:?} {}/{} go1.{}",
            env.goroot, env.gopath, env.gomodcache, env.goos, env.goarch, env.go_minor
        );
        env
    }

    /// Sets `GOROOT`.
    #[must_use]
    pub fn with_goroot(mut self, goroot: impl Into<PathBuf>) -> Self {
        self.goroot = Some(goroot.into());
        self
    }

    /// Appends a `GOPATH` entry.
    #[must_use]
    pub fn with_gopath(mut self, gopath: impl Into<PathBuf>) -> Self {
        self.gopath.push(gopath.into());
        self
    }

    /// Sets `GOMODCACHE`.
    #[must_use]
    pub fn with_gomodcache(mut self, dir: impl Into<PathBuf>) -> Self {
        self.gomodcache = Some(dir.into());
        self
    }

    /// `<goroot>/src`, if a root is known.
    #[must_use]
    pub fn goroot_src(&self) -> Option<PathBuf> {
        self.goroot.as_ref().map(|root| root.join("src"))
    }
}

fn default_goroot() -> Option<PathBuf> {
    ["/usr/local/go", "/usr/lib/go", "/opt/homebrew/opt/go/libexec"]
        .into_iter()
        .map(PathBuf::from)
        .find(|p| p.join("src").join("runtime").is_dir())
}

/// Parses the minor version from `$GOROOT/VERSION` (`go1.22.3`).
fn read_go_minor(goroot: &Path) -> Option<u32> {
    let content = std::fs::read_to_string(goroot.join("VERSION")).ok()?;
    parse_go_minor(content.lines().next()?)
}

fn parse_go_minor(version: &str) -> Option<u32> {
    let rest = version.trim().strip_prefix("go1.")?;
    let digits: String = rest.chars().take_while(char::is_ascii_digit).collect();
    digits.parse().ok()
}

/// The GOOS value for the host.
#[must_use]
pub fn host_goos() -> &'static str {
    match std::env::consts::OS {
        "macos" => "darwin",
        other => other,
    }
}

/// The GOARCH value for the host.
#[must_use]
pub fn host_goarch() -> &'static str {
    match std::env::consts::ARCH {
        "x86_64" => "amd64",
        "x86" => "386",
        "aarch64" => "arm64",
        "powerpc64" => "ppc64",
        "loongarch64" => "loong64",
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_version_file_line() {
        assert_eq!(parse_go_minor("go1.22.3"), Some(22));
        assert_eq!(parse_go_minor("go1.21rc2"), Some(21));
        assert_eq!(parse_go_minor("devel +abc"), None);
    }

    #[test]
    fn builders_set_locations() {
        let env = GoEnv::default()
            .with_goroot("/opt/go")
            .with_gopath("/work")
            .with_gomodcache("/cache");
        assert_eq!(env.goroot_src(), Some(PathBuf::from("/opt/go/src")));
        assert_eq!(env.gopath, vec![PathBuf::from("/work")]);
        assert_eq!(env.gomodcache, Some(PathBuf::from("/cache")));
    }

    #[test]
    fn host_names_use_go_spelling() {
        assert_ne!(host_goos(), "macos");
        assert_ne!(host_goarch(), "x86_64");
    }
}
