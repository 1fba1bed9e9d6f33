//! # logstyle-go
//!
//! Go frontend for logstyle: loads the package in a directory, parses it
//! with tree-sitter and type-checks it into a [`CheckedPackage`].
//!
//! - [`env`]: `GOROOT`, `GOPATH`, the module cache and the target platform,
//! - [`constraints`]: `//go:build` lines and file-name suffixes,
//! - [`gomod`] and [`locator`]: import path resolution,
//! - [`parser`] and [`lower`]: tree-sitter parsing into the core syntax tree,
//! - [`GoLoader`]: the [`TypedAstSource`] tying them together.
//!
//! Dependencies are loaded lazily and without function bodies; only the
//! analyzed package is checked in full.
//!
//! ## Example
//!
//! ```ignore
//! use logstyle_core::{Analyzer, LineReporter};
//! use logstyle_go::GoLoader;
//!
//! let loader = GoLoader::from_env();
//! let analyzer = Analyzer::builder().rules(logstyle_rules::all_rules()).build()?;
//! let mut out = LineReporter::new(std::io::stdout().lock());
//! analyzer.check(&loader, Path::new("."), &mut out)?;
//! ```
//!
//! [`CheckedPackage`]: logstyle_core::CheckedPackage
//! [`TypedAstSource`]: logstyle_core::TypedAstSource

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod constraints;
pub mod env;
pub mod gomod;
pub mod locator;
pub mod lower;
pub mod parser;

mod checker;
mod loader;

pub use env::GoEnv;
pub use loader::GoLoader;
pub use locator::has_go_files;
