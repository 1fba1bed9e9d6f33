//! Rule construction: the full catalogue and config-driven instantiation.

use crate::ConstantMessage;
use logstyle_core::{Config, ConfigError, LinterBox};

/// Returns every built-in rule with default settings, in registration order.
#[must_use]
pub fn all_rules() -> Vec<LinterBox> {
    vec![Box::new(ConstantMessage::new())]
}

/// Returns every built-in rule configured from `config`.
///
/// Disabled rules are still returned; the analyzer filters them so that
/// `list-rules` can show their state.
///
/// # Errors
///
/// Returns an error if a rule's options are malformed.
pub fn rules_from_config(config: &Config) -> Result<Vec<LinterBox>, ConfigError> {
    let constant_message = match config.rule(crate::constant_message::NAME) {
        Some(rule_config) => ConstantMessage::from_config(rule_config)?,
        None => ConstantMessage::new(),
    };
    Ok(vec![Box::new(constant_message)])
}

/// Keeps only the rules whose name is in `names`, preserving order.
///
/// Returns the unknown names as the error.
///
/// # Errors
///
/// Returns the list of names that match no rule.
pub fn select_rules(rules: Vec<LinterBox>, names: &[String]) -> Result<Vec<LinterBox>, Vec<String>> {
    let unknown: Vec<String> = names
        .iter()
        .filter(|name| !rules.iter().any(|r| r.name() == name.as_str() || r.code() == name.as_str()))
        .cloned()
        .collect();
    if !unknown.is_empty() {
        return Err(unknown);
    }
    Ok(rules
        .into_iter()
        .filter(|r| names.iter().any(|n| n == r.name() || n == r.code()))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalogue_has_constant_message() {
        let names: Vec<_> = all_rules().iter().map(|r| r.name()).collect();
        assert_eq!(names, vec!["constant-message"]);
    }

    #[test]
    fn config_errors_propagate() {
        let config =
            Config::parse("[rules.constant-message]\ntargets = \"zap\"\n").expect("parse");
        assert!(rules_from_config(&config).is_err());
        assert_eq!(rules_from_config(&Config::default()).map(|r| r.len()).ok(), Some(1));
    }

    #[test]
    fn select_by_name_or_code() {
        let selected = select_rules(all_rules(), &["LS001".to_string()]).expect("known");
        assert_eq!(selected.len(), 1);

        let unknown = select_rules(all_rules(), &["nope".to_string()]).err();
        assert_eq!(unknown, Some(vec!["nope".to_string()]));
    }
}
