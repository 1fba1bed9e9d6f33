//! Package loading: file selection and the [`TypedAstSource`] entry point.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use logstyle_core::{AnalyzerConfig, CheckedPackage, LoadError, Position, TypedAstSource};
use tracing::{debug, info};

use crate::checker::Checker;
use crate::constraints::BuildContext;
use crate::env::GoEnv;
use crate::locator::Locator;

/// Package name used by documentation-only files, which never take part in
/// a build.
const DOCUMENTATION_PACKAGE: &str = "documentation";

/// One selected source file.
#[derive(Debug, Clone)]
pub(crate) struct SourceText {
    /// Name positions are reported under: the directory joined with the
    /// file name.
    pub(crate) display_name: String,
    pub(crate) content: String,
}

/// The buildable files of one directory.
#[derive(Debug, Clone)]
pub(crate) struct PackageSources {
    /// Package clause name shared by the files.
    pub(crate) package: String,
    pub(crate) files: Vec<SourceText>,
}

/// Reads the buildable Go files of `dir`, sorted by name.
///
/// Files starting with `_` or `.`, `_test.go` files (unless
/// `include_tests`), files excluded by build constraints and files of the
/// `documentation` package are skipped. External test packages
/// (`package x_test`) are skipped too.
///
/// # Errors
///
/// Fails when the directory cannot be read, a `//go:build` line is
/// malformed, files disagree on the package name, or nothing is left.
pub(crate) fn read_package(
    dir: &Path,
    build: &BuildContext,
    include_tests: bool,
) -> Result<PackageSources, LoadError> {
    let io_error = |source| LoadError::Io {
        path: dir.to_path_buf(),
        source,
    };
    let names = candidate_names(fs::read_dir(dir).map_err(io_error)?).map_err(io_error)?;

    let mut package: Option<(String, String)> = None;
    let mut files = Vec::new();
    for name in names {
        let is_test = name.ends_with("_test.go");
        if is_test && !include_tests {
            continue;
        }
        let path = dir.join(&name);
        let content = fs::read_to_string(&path).map_err(|source| LoadError::Io {
            path: path.clone(),
            source,
        })?;
        let display_name = path.display().to_string();

        match build.includes(&name, &content) {
            Ok(true) => {}
            Ok(false) => {
                debug!("{display_name}: excluded by build constraints");
                continue;
            }
            Err(err) => {
                return Err(LoadError::Parse {
                    position: build_line_position(&display_name, &content),
                    message: err.to_string(),
                })
            }
        }

        // A file without a package clause is kept so that parsing reports it.
        if let Some(clause) = package_clause(&content) {
            if clause == DOCUMENTATION_PACKAGE || (is_test && clause.ends_with("_test")) {
                continue;
            }
            match &package {
                None => package = Some((clause, name.clone())),
                Some((first, first_file)) if *first != clause => {
                    return Err(LoadError::MultiplePackages {
                        dir: dir.to_path_buf(),
                        first: first.clone(),
                        first_file: first_file.clone(),
                        second: clause,
                        second_file: name,
                    });
                }
                Some(_) => {}
            }
        }
        files.push(SourceText {
            display_name,
            content,
        });
    }

    if files.is_empty() {
        return Err(LoadError::NoGoFiles {
            dir: dir.to_path_buf(),
        });
    }
    Ok(PackageSources {
        package: package.map(|(name, _)| name).unwrap_or_default(),
        files,
    })
}

/// Names of the `*.go` files among `entries`, sorted. An unreadable entry
/// fails the whole listing.
fn candidate_names<I>(entries: I) -> io::Result<Vec<String>>
where
    I: IntoIterator<Item = io::Result<fs::DirEntry>>,
{
    let mut names = Vec::new();
    for entry in entries {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let Ok(name) = entry.file_name().into_string() else {
            continue;
        };
        if name.ends_with(".go") && !name.starts_with('_') && !name.starts_with('.') {
            names.push(name);
        }
    }
    names.sort();
    Ok(names)
}

/// Extracts the package name from a file's package clause, skipping
/// leading comments.
pub(crate) fn package_clause(source: &str) -> Option<String> {
    let mut rest = source;
    loop {
        rest = rest.trim_start();
        if let Some(comment) = rest.strip_prefix("//") {
            rest = comment.split_once('\n').map_or("", |(_, after)| after);
        } else if let Some(comment) = rest.strip_prefix("/*") {
            rest = comment.split_once("*/").map(|(_, after)| after)?;
        } else {
            break;
        }
    }
    let after = rest.strip_prefix("package")?;
    if !after.starts_with(char::is_whitespace) {
        return None;
    }
    let name: String = after
        .trim_start()
        .chars()
        .take_while(|c| c.is_alphanumeric() || *c == '_')
        .collect();
    (!name.is_empty()).then_some(name)
}

fn build_line_position(filename: &str, content: &str) -> Position {
    let mut offset = 0;
    for (index, line) in content.split_inclusive('\n').enumerate() {
        if line.trim_start().starts_with("//go:build") {
            return Position {
                filename: filename.to_string(),
                offset,
                line: index + 1,
                column: 1,
            };
        }
        offset += line.len();
    }
    Position {
        filename: filename.to_string(),
        ..Position::default()
    }
}

/// Loads and type-checks the Go package in a directory.
///
/// # Example
///
/// ```ignore
/// use logstyle_core::TypedAstSource;
/// use logstyle_go::{GoEnv, GoLoader};
///
/// let loader = GoLoader::new(GoEnv::from_env()).build_tags(["integration"]);
/// let package = loader.load(Path::new("./cmd/server"))?;
/// ```
#[derive(Debug, Clone)]
pub struct GoLoader {
    env: GoEnv,
    build_tags: Vec<String>,
    include_tests: bool,
}

impl GoLoader {
    /// Creates a loader for the given toolchain environment.
    #[must_use]
    pub fn new(env: GoEnv) -> Self {
        Self {
            env,
            build_tags: Vec::new(),
            include_tests: false,
        }
    }

    /// Creates a loader configured from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::new(GoEnv::from_env())
    }

    /// Adds build tags that count as satisfied.
    #[must_use]
    pub fn build_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.build_tags.extend(tags.into_iter().map(Into::into));
        self
    }

    /// Includes `_test.go` files of the package itself.
    #[must_use]
    pub fn include_tests(mut self, include: bool) -> Self {
        self.include_tests = include;
        self
    }

    /// Applies the `[analyzer]` section of a configuration.
    #[must_use]
    pub fn with_config(self, config: &AnalyzerConfig) -> Self {
        self.build_tags(config.build_tags.iter().cloned())
            .include_tests(config.include_tests)
    }

    /// The toolchain environment.
    #[must_use]
    pub fn env(&self) -> &GoEnv {
        &self.env
    }
}

impl Default for GoLoader {
    fn default() -> Self {
        Self::from_env()
    }
}

impl TypedAstSource for GoLoader {
    fn load(&self, dir: &Path) -> Result<CheckedPackage, LoadError> {
        let build = BuildContext::new(&self.env, &self.build_tags);
        let sources = read_package(dir, &build, self.include_tests)?;
        let abs: PathBuf = dir.canonicalize().map_err(|source| LoadError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut locator = Locator::new(self.env.clone(), &abs);
        let path = locator.import_path_of(&abs);
        info!(
            "loading package {path} ({} files) from {}",
            sources.files.len(),
            dir.display()
        );

        let mut checker = Checker::new(locator, build)?;
        checker.add_target(&path, &sources.package, &abs, sources.files)?;
        checker.check()?;
        let (fset, symbols, files) = checker.finish();

        Ok(CheckedPackage {
            path,
            name: sources.package,
            dir: dir.to_path_buf(),
            fset,
            files,
            symbols,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> BuildContext {
        let env = GoEnv {
            goos: "linux".into(),
            goarch: "amd64".into(),
            ..GoEnv::default()
        };
        BuildContext::new(&env, &[])
    }

    fn write(dir: &Path, name: &str, content: &str) {
        fs::write(dir.join(name), content).expect("write");
    }

    fn file_names(sources: &PackageSources) -> Vec<String> {
        sources
            .files
            .iter()
            .map(|f| {
                Path::new(&f.display_name)
                    .file_name()
                    .and_then(|n| n.to_str())
                    .unwrap_or_default()
                    .to_string()
            })
            .collect()
    }

    #[test]
    fn sniffs_package_clause() {
        assert_eq!(package_clause("package main\n"), Some("main".into()));
        assert_eq!(
            package_clause("// Package x does things.\n/* more */\npackage x // trailing\n"),
            Some("x".into())
        );
        assert_eq!(package_clause("func main() {}\n"), None);
        assert_eq!(package_clause("packagemain\n"), None);
    }

    #[test]
    fn selects_buildable_files_in_name_order() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let dir = tmp.path();
        write(dir, "b.go", "package app\n");
        write(dir, "a.go", "package app\n");
        write(dir, "a_test.go", "package app\n");
        write(dir, "_skip.go", "package other\n");
        write(dir, ".hidden.go", "package other\n");
        write(dir, "x_windows.go", "package app\n");
        write(dir, "tagged.go", "//go:build ignore\n\npackage app\n");
        write(dir, "doc.go", "package documentation\n");
        write(dir, "notes.txt", "package other\n");

        let sources = read_package(dir, &context(), false).expect("read");
        assert_eq!(sources.package, "app");
        assert_eq!(file_names(&sources), vec!["a.go", "b.go"]);
    }

    #[test]
    fn test_files_when_requested() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let dir = tmp.path();
        write(dir, "a.go", "package app\n");
        write(dir, "a_test.go", "package app\n");
        write(dir, "ext_test.go", "package app_test\n");

        let sources = read_package(dir, &context(), true).expect("read");
        assert_eq!(file_names(&sources), vec!["a.go", "a_test.go"]);
    }

    #[test]
    fn conflicting_package_names() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let dir = tmp.path();
        write(dir, "a.go", "package one\n");
        write(dir, "b.go", "package two\n");

        let err = read_package(dir, &context(), false).expect_err("conflict");
        let LoadError::MultiplePackages {
            first,
            first_file,
            second,
            second_file,
            ..
        } = err
        else {
            panic!("expected MultiplePackages, got {err}");
        };
        assert_eq!(
            (first.as_str(), first_file.as_str()),
            ("one", "a.go")
        );
        assert_eq!(
            (second.as_str(), second_file.as_str()),
            ("two", "b.go")
        );
    }

    #[test]
    fn unreadable_entries_fail_the_listing() {
        let entries: Vec<io::Result<fs::DirEntry>> =
            vec![Err(io::Error::new(io::ErrorKind::PermissionDenied, "denied"))];
        let err = candidate_names(entries).expect_err("entry error");
        assert_eq!(err.kind(), io::ErrorKind::PermissionDenied);
    }

    #[test]
    fn empty_directory_has_no_go_files() {
        let tmp = tempfile::tempdir().expect("tempdir");
        write(tmp.path(), "main_test.go", "package main\n");
        let err = read_package(tmp.path(), &context(), false).expect_err("empty");
        assert!(matches!(err, LoadError::NoGoFiles { .. }));
    }

    #[test]
    fn malformed_build_line() {
        let tmp = tempfile::tempdir().expect("tempdir");
        write(tmp.path(), "a.go", "// comment\n//go:build linux &&\n\npackage a\n");
        let err = read_package(tmp.path(), &context(), false).expect_err("malformed");
        let LoadError::Parse { position, .. } = err else {
            panic!("expected a parse error, got {err}");
        };
        assert_eq!(position.line, 2);
    }
}
