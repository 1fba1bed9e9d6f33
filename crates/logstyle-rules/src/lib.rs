//! # logstyle-rules
//!
//! Built-in call-site rules for logstyle.
//!
//! ## Available Rules
//!
//! | Code | Name | Description |
//! |------|------|-------------|
//! | LS001 | `constant-message` | Logging calls must pass a literal or a constant as the message |
//!
//! ## Usage
//!
//! ```ignore
//! use logstyle_core::Analyzer;
//! use logstyle_rules::ConstantMessage;
//!
//! let analyzer = Analyzer::builder()
//!     .rule(ConstantMessage::new())
//!     .build()?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod constant_message;
mod registry;

pub use constant_message::ConstantMessage;
pub use registry::{all_rules, rules_from_config, select_rules};

/// Re-export core types for convenience.
pub use logstyle_core::{Linter, Severity, Violation};
