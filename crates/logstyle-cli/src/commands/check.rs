//! Check command implementation.

use anyhow::{anyhow, Result};
use logstyle_core::{Analyzer, AnalyzerError, LoadError, RunSummary, Severity, TypedAstSource};
use logstyle_go::{has_go_files, GoLoader};
use logstyle_rules::{rules_from_config, select_rules};
use std::io::Write;
use std::path::{Path, PathBuf};

use super::output::Output;
use crate::config_resolver::ConfigSource;
use crate::OutputFormat;

/// Directory names never descended into by `DIR/...`.
const SKIPPED_DIRS: &[&str] = &["vendor", "testdata"];

/// What to analyze.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// The single package in a directory.
    Package(PathBuf),
    /// Every package directory below a root (`DIR/...`).
    Recursive(PathBuf),
}

impl Target {
    /// Parses the positional argument: `DIR/...` (or `...`) is recursive.
    #[must_use]
    pub fn parse(arg: &str) -> Self {
        if arg == "..." {
            return Self::Recursive(PathBuf::from("."));
        }
        match arg.strip_suffix("/...") {
            Some("") => Self::Recursive(PathBuf::from("/")),
            Some(root) => Self::Recursive(PathBuf::from(root)),
            None => Self::Package(PathBuf::from(arg)),
        }
    }

    /// The directory configuration is resolved against.
    #[must_use]
    pub fn root(&self) -> &Path {
        match self {
            Self::Package(dir) | Self::Recursive(dir) => dir,
        }
    }

    /// Package directories to analyze, in name order.
    ///
    /// # Errors
    ///
    /// Returns an error if the tree cannot be walked.
    pub fn package_dirs(&self) -> Result<Vec<PathBuf>> {
        let root = match self {
            Self::Package(dir) => return Ok(vec![dir.clone()]),
            Self::Recursive(root) => root,
        };

        let mut builder = ignore::WalkBuilder::new(root);
        builder
            .hidden(false)
            .git_ignore(true)
            .sort_by_file_name(|a, b| a.cmp(b))
            .filter_entry(|entry| {
                if entry.depth() == 0 || !entry.file_type().is_some_and(|t| t.is_dir()) {
                    return true;
                }
                let name = entry.file_name().to_string_lossy();
                !(name.starts_with('.') || name.starts_with('_') || SKIPPED_DIRS.contains(&&*name))
            });

        let mut dirs = Vec::new();
        for entry in builder.build() {
            let entry = entry?;
            if entry.file_type().is_some_and(|t| t.is_dir()) && has_go_files(entry.path()) {
                dirs.push(entry.into_path());
            }
        }
        tracing::debug!("{} package directories below {}", dirs.len(), root.display());
        Ok(dirs)
    }

    fn is_recursive(&self) -> bool {
        matches!(self, Self::Recursive(_))
    }
}

/// Command-line options of a check run.
#[derive(Debug, Clone, Default)]
pub struct Options {
    /// Output format.
    pub format: OutputFormat,
    /// Comma-separated rule names or codes to keep.
    pub rules: Option<String>,
}

/// Result of a completed run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Outcome {
    /// Totals over every analyzed package.
    pub summary: RunSummary,
    /// A violation reached the configured `fail_on` severity.
    pub failed: bool,
}

/// Runs the check command, writing diagnostics to `out`.
pub fn run<W: Write>(
    target: &Target,
    options: &Options,
    source: &ConfigSource,
    out: W,
) -> Result<Outcome> {
    let config = source.load()?;

    let mut rules = rules_from_config(&config)?;
    if let Some(filter) = &options.rules {
        let names: Vec<String> = filter
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(String::from)
            .collect();
        rules = select_rules(rules, &names)
            .map_err(|unknown| anyhow!("unknown rule(s): {}", unknown.join(", ")))?;
    }

    let loader = GoLoader::from_env().with_config(&config.analyzer);
    let fail_on = config.fail_on;
    let analyzer = Analyzer::builder().rules(rules).config(config).build()?;

    tracing::info!("Analyzing {:?} with {} rules", target.root(), analyzer.rule_count());
    check_with(&analyzer, &loader, target, options.format, fail_on, out)
}

/// Analyzes every package of `target` with an already built analyzer.
pub fn check_with<W: Write>(
    analyzer: &Analyzer,
    loader: &dyn TypedAstSource,
    target: &Target,
    format: OutputFormat,
    fail_on: Option<Severity>,
    out: W,
) -> Result<Outcome> {
    let mut output = Output::new(format, out);
    let mut summary = RunSummary::default();

    for dir in target.package_dirs()? {
        match analyzer.check(loader, &dir, &mut output) {
            Ok(package) => summary += package,
            Err(AnalyzerError::Load(LoadError::NoGoFiles { .. })) if target.is_recursive() => {
                tracing::debug!("{}: no buildable files, skipped", dir.display());
            }
            Err(err) => return Err(err.into()),
        }
    }

    let failed = match (fail_on, output.worst()) {
        (Some(threshold), Some(worst)) => worst >= threshold,
        _ => false,
    };
    output.finish_run(summary)?;
    Ok(Outcome { summary, failed })
}

#[cfg(test)]
mod tests {
    use super::*;
    use logstyle_core::{CheckedPackage, FileSet, SymbolTable};
    use std::cell::RefCell;
    use std::fs;

    #[test]
    fn parses_targets() {
        assert_eq!(Target::parse("."), Target::Package(".".into()));
        assert_eq!(Target::parse("./cmd/app"), Target::Package("./cmd/app".into()));
        assert_eq!(Target::parse("./..."), Target::Recursive(".".into()));
        assert_eq!(Target::parse("..."), Target::Recursive(".".into()));
        assert_eq!(Target::parse("pkg/..."), Target::Recursive("pkg".into()));
    }

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "package x\n").unwrap();
    }

    #[test]
    fn recursive_targets_skip_vendor_testdata_and_hidden() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        touch(root, "main.go");
        touch(root, "b/b.go");
        touch(root, "a/inner/x.go");
        touch(root, "a/readme.md");
        touch(root, "vendor/go.uber.org/zap/logger.go");
        touch(root, "testdata/x.go");
        touch(root, ".git/hooks/x.go");
        touch(root, "_old/x.go");

        let dirs = Target::Recursive(root.to_path_buf()).package_dirs().unwrap();
        let rel: Vec<_> = dirs
            .iter()
            .map(|d| d.strip_prefix(root).unwrap().to_string_lossy().replace('\\', "/"))
            .collect();
        assert_eq!(rel, vec!["", "a/inner", "b"]);
    }

    /// Serves canned results per directory.
    struct Canned {
        loads: RefCell<Vec<PathBuf>>,
    }

    impl TypedAstSource for Canned {
        fn load(&self, dir: &Path) -> Result<CheckedPackage, LoadError> {
            self.loads.borrow_mut().push(dir.to_path_buf());
            if dir.ends_with("tests_only") {
                return Err(LoadError::NoGoFiles {
                    dir: dir.to_path_buf(),
                });
            }
            Ok(CheckedPackage {
                path: "example.com/x".into(),
                name: "x".into(),
                dir: dir.to_path_buf(),
                fset: FileSet::new(),
                files: Vec::new(),
                symbols: SymbolTable::new(),
            })
        }
    }

    #[test]
    fn packages_without_buildable_files_are_skipped_when_recursive() {
        let tmp = tempfile::tempdir().unwrap();
        touch(tmp.path(), "app/main.go");
        touch(tmp.path(), "tests_only/x_test.go");
        let analyzer = Analyzer::builder().build().unwrap();
        let source = Canned {
            loads: RefCell::new(Vec::new()),
        };

        let target = Target::Recursive(tmp.path().to_path_buf());
        let outcome =
            check_with(&analyzer, &source, &target, OutputFormat::Text, None, Vec::new()).unwrap();
        assert_eq!(source.loads.borrow().len(), 2);
        assert!(!outcome.failed);

        let single = Target::Package(tmp.path().join("tests_only"));
        let err = check_with(&analyzer, &source, &single, OutputFormat::Text, None, Vec::new())
            .unwrap_err();
        assert!(err.to_string().starts_with("no buildable Go source files"), "{err}");
    }

    #[test]
    fn unknown_rule_names_are_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let options = Options {
            format: OutputFormat::Text,
            rules: Some("constant-message, nope".into()),
        };
        let err = run(
            &Target::Package(tmp.path().to_path_buf()),
            &options,
            &ConfigSource::Default,
            Vec::new(),
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "unknown rule(s): nope");
    }
}
