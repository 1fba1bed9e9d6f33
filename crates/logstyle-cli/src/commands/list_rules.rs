//! List rules command implementation.

use anyhow::Result;
use logstyle_core::Config;
use logstyle_rules::{constant_message, rules_from_config, ConstantMessage};
use std::io::{self, Write};

use crate::config_resolver::ConfigSource;

/// Runs the list-rules command.
pub fn run(source: &ConfigSource) -> Result<()> {
    let config = source.load()?;
    render(&config, &mut io::stdout().lock())
}

fn render(config: &Config, out: &mut impl Write) -> Result<()> {
    let rules = rules_from_config(config)?;

    writeln!(out, "Available rules:\n")?;
    writeln!(
        out,
        "{:<8} {:<20} {:<10} {:<8} Description",
        "Code", "Name", "Severity", "Enabled"
    )?;
    writeln!(out, "{}", "-".repeat(80))?;

    for rule in &rules {
        let severity = config
            .rule_severity(rule.name())
            .unwrap_or_else(|| rule.default_severity());
        let enabled = if config.is_rule_enabled(rule.name()) {
            "yes"
        } else {
            "no"
        };
        writeln!(
            out,
            "{:<8} {:<20} {:<10} {:<8} {}",
            rule.code(),
            rule.name(),
            severity.to_string(),
            enabled,
            rule.description()
        )?;
    }

    let message_rule = match config.rule(constant_message::NAME) {
        Some(rule_config) => ConstantMessage::from_config(rule_config)?,
        None => ConstantMessage::new(),
    };
    writeln!(out, "\nChecked receivers ({}):", constant_message::NAME)?;
    for target in message_rule.target_methods() {
        writeln!(
            out,
            "  {}.{}: {}",
            target.package,
            target.type_name,
            target.methods.join(", ")
        )?;
    }

    writeln!(out, "\nUse --rules to filter specific rules, e.g.:")?;
    writeln!(out, "  logstyle --rules constant-message ./...")?;
    writeln!(out, "  logstyle --rules LS001 ./cmd/server")?;
    Ok(())
}
