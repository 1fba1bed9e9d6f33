//! Comment-based allowance directives.
//!
//! A finding on a call is suppressed by a directive on the call's line or on
//! the line directly above it:
//! ```text
//! // logstyle:allow(constant-message) reason="message built from a fixed table"
//! logger.Info(messages[code])
//! ```
//! `all` in the rule list suppresses every rule.

use std::collections::HashSet;

use crate::fileset::SourceFile;

/// Result of checking for an allow directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllowCheck {
    /// Rule is not allowed.
    Denied,
    /// Rule is allowed with optional reason.
    Allowed {
        /// The reason provided (if any).
        reason: Option<String>,
    },
}

impl AllowCheck {
    /// Returns true if allowed.
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed { .. })
    }

    /// Returns the reason if allowed.
    #[must_use]
    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Allowed { reason } => reason.as_deref(),
            Self::Denied => None,
        }
    }
}

/// Parsed allowance directive.
#[derive(Debug, Clone)]
pub struct AllowDirective {
    /// Rule names that are allowed.
    pub rules: HashSet<String>,
    /// Optional reason for the allowance.
    pub reason: Option<String>,
}

/// Checks `line` (1-indexed) of `file` and the line above for a directive
/// allowing `rule_name`.
#[must_use]
pub fn check_allow(file: &SourceFile, line: usize, rule_name: &str) -> AllowCheck {
    for candidate in [line.saturating_sub(1), line] {
        let Some(text) = file.line_text(candidate) else {
            continue;
        };
        if let Some(directive) = parse_allow_directive(text) {
            if directive.rules.contains(rule_name) || directive.rules.contains("all") {
                return AllowCheck::Allowed {
                    reason: directive.reason,
                };
            }
        }
    }
    AllowCheck::Denied
}

/// Parses the `logstyle:allow(...)` directive in a line, if any.
///
/// The directive may trail code on the same line.
#[must_use]
pub fn parse_allow_directive(line: &str) -> Option<AllowDirective> {
    let comment = &line[line.find("//")? + 2..];
    let directive = comment.trim().strip_prefix("logstyle:")?.trim_start();
    let allow_content = directive.strip_prefix("allow(")?;

    let paren_end = allow_content.find(')')?;
    let rules: HashSet<String> = allow_content[..paren_end]
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    if rules.is_empty() {
        return None;
    }

    let rest = allow_content[paren_end + 1..].trim();
    let reason = rest
        .strip_prefix("reason=")
        .map(str::trim)
        .and_then(|quoted| quoted.strip_prefix('"'))
        .and_then(|quoted| quoted.find('"').map(|end| quoted[..end].to_string()));

    Some(AllowDirective { rules, reason })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fileset::FileSet;

    #[test]
    fn parses_rules_and_reason() {
        let directive = parse_allow_directive(
            "\t// logstyle:allow(constant-message, other) reason=\"fixed table\"",
        )
        .expect("directive");
        assert!(directive.rules.contains("constant-message"));
        assert!(directive.rules.contains("other"));
        assert_eq!(directive.reason.as_deref(), Some("fixed table"));
    }

    #[test]
    fn ignores_other_comments() {
        assert!(parse_allow_directive("// nolint").is_none());
        assert!(parse_allow_directive("// logstyle:allow()").is_none());
        assert!(parse_allow_directive("logger.Info(msg)").is_none());
    }

    #[test]
    fn checks_same_and_previous_line() {
        let mut fset = FileSet::new();
        let file = fset.add_file(
            "main.go",
            "func f() {\n\t// logstyle:allow(constant-message)\n\tlogger.Info(msg)\n\tlogger.Info(msg) // logstyle:allow(all) reason=\"x\"\n\tlogger.Info(msg)\n}\n",
        );

        assert!(check_allow(file, 3, "constant-message").is_allowed());
        assert!(!check_allow(file, 3, "other-rule").is_allowed());

        let trailing = check_allow(file, 4, "anything");
        assert!(trailing.is_allowed());
        assert_eq!(trailing.reason(), Some("x"));

        assert_eq!(check_allow(file, 5, "constant-message"), AllowCheck::Allowed { reason: Some("x".into()) });
        assert_eq!(check_allow(file, 6, "constant-message"), AllowCheck::Denied);
    }
}
