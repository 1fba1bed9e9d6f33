//! The typed-AST source seam: whatever loads, parses and type-checks a
//! package hands the dispatcher a [`CheckedPackage`].

use std::path::{Path, PathBuf};

use crate::ast::File;
use crate::fileset::{FileSet, Position};
use crate::symbols::SymbolTable;

/// One package, parsed and type-checked.
#[derive(Debug, Clone)]
pub struct CheckedPackage {
    /// Import path of the package.
    pub path: String,
    /// Package clause name.
    pub name: String,
    /// Directory the package was loaded from.
    pub dir: PathBuf,
    /// Position decoder for every file that was loaded, dependencies included.
    pub fset: FileSet,
    /// The package's own files, sorted by file name.
    pub files: Vec<File>,
    /// Bindings and types for the whole load.
    pub symbols: SymbolTable,
}

/// Produces type-checked packages from directories.
pub trait TypedAstSource {
    /// Loads, parses and type-checks the package in `dir`.
    ///
    /// # Errors
    ///
    /// Any failure to build or type-check the package is fatal for the run.
    fn load(&self, dir: &Path) -> Result<CheckedPackage, LoadError>;
}

/// Failure to produce a [`CheckedPackage`].
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// Reading a directory or file failed.
    #[error("{path}: {source}")]
    Io {
        /// Path being read.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// The directory holds no buildable Go files.
    #[error("no buildable Go source files in {}", dir.display())]
    NoGoFiles {
        /// Directory that was searched.
        dir: PathBuf,
    },

    /// Files disagree on the package name.
    #[error(
        "found packages {first} ({first_file}) and {second} ({second_file}) in {}",
        dir.display()
    )]
    MultiplePackages {
        /// Directory that was searched.
        dir: PathBuf,
        /// First package name seen.
        first: String,
        /// File declaring `first`.
        first_file: String,
        /// Conflicting package name.
        second: String,
        /// File declaring `second`.
        second_file: String,
    },

    /// A file does not parse.
    #[error("{position}: {message}")]
    Parse {
        /// Where the syntax error starts.
        position: Position,
        /// Description.
        message: String,
    },

    /// The package does not type-check.
    #[error("{position}: {message}")]
    TypeCheck {
        /// Offending position.
        position: Position,
        /// Description.
        message: String,
    },

    /// An import of the analyzed package cannot be located.
    #[error("{position}: could not import {path} (cannot find package)")]
    Import {
        /// Position of the import spec.
        position: Position,
        /// Import path.
        path: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_match_go_tooling() {
        let err = LoadError::MultiplePackages {
            dir: PathBuf::from("pkg"),
            first: "a".into(),
            first_file: "a.go".into(),
            second: "b".into(),
            second_file: "b.go".into(),
        };
        assert_eq!(
            err.to_string(),
            "found packages a (a.go) and b (b.go) in pkg"
        );

        let err = LoadError::TypeCheck {
            position: Position {
                filename: "pkg/main.go".into(),
                offset: 40,
                line: 5,
                column: 2,
            },
            message: "undefined: x".into(),
        };
        assert_eq!(err.to_string(), "pkg/main.go:5:2: undefined: x");
    }
}
