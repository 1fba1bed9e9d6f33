//! # logstyle-core
//!
//! Core framework for type-aware call-site linting of Go packages.
//!
//! This crate provides:
//!
//! - the Go syntax tree ([`ast`]) with a [`Visit`] trait,
//! - the [`FileSet`] position decoder,
//! - the read-only [`SymbolTable`] produced by a [`TypedAstSource`],
//! - the receiver [`matcher`] used by rules,
//! - the [`Linter`] trait and the [`Analyzer`] dispatcher,
//! - [`Reporter`] sinks and [`Violation`] types.
//!
//! ## Example
//!
//! ```ignore
//! use logstyle_core::{Analyzer, LineReporter};
//!
//! let analyzer = Analyzer::builder()
//!     .rule(MyRule::new())
//!     .build()?;
//!
//! let mut out = LineReporter::new(std::io::stdout().lock());
//! let summary = analyzer.check(&loader, dir, &mut out)?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod ast;
pub mod fileset;
pub mod matcher;
pub mod symbols;
pub mod visit;

mod analyzer;
mod config;
mod report;
mod rule;
mod source;
mod types;

/// Utility modules for rule implementations.
pub mod utils;

pub use analyzer::{Analyzer, AnalyzerBuilder, AnalyzerError, RunSummary};
pub use config::{AnalyzerConfig, Config, ConfigError, RuleConfig};
pub use fileset::{FileSet, Pos, Position};
pub use matcher::{is_target_method, strip_vendor, TargetMethod};
pub use report::{LineReporter, Reporter};
pub use rule::{Finding, Linter, LinterBox};
pub use source::{CheckedPackage, LoadError, TypedAstSource};
pub use symbols::{ObjectId, ObjectKind, ResolvedFunc, SymbolTable, TypeId};
pub use types::{LintResult, Location, Severity, Suggestion, Violation, ViolationDiagnostic};
pub use utils::allowance::AllowCheck;
pub use visit::Visit;
