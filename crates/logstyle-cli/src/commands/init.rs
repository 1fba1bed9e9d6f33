//! Init command implementation.

use anyhow::{bail, Context, Result};
use std::path::Path;

const CONFIG_NAME: &str = "logstyle.toml";

const DEFAULT_CONFIG: &str = r#"# logstyle configuration

# Exit with status 1 when a violation at or above this severity is reported.
# Without it logstyle only reports.
# fail_on = "error"

[analyzer]
# Extra build tags satisfied by //go:build lines
build_tags = []

# Also analyze in-package _test.go files
include_tests = false

# Rule configurations
# Each rule can be enabled/disabled and have its severity overridden

[rules.constant-message]
enabled = true
# severity = "warning"

# Receivers whose first argument must be a literal or a constant.
[[rules.constant-message.targets]]
package = "go.uber.org/zap"
type = "Logger"
methods = ["Debug", "Info", "Warn", "Error"]
"#;

/// Runs the init command.
pub fn run(force: bool) -> Result<()> {
    write_config(Path::new(CONFIG_NAME), force)?;

    println!("Created {CONFIG_NAME}");
    println!("\nNext steps:");
    println!("  1. Edit {CONFIG_NAME} to configure rules");
    println!("  2. Run: logstyle ./...");

    Ok(())
}

fn write_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!(
            "configuration file already exists at {}, use --force to overwrite",
            path.display()
        );
    }
    std::fs::write(path, DEFAULT_CONFIG)
        .with_context(|| format!("failed to write {}", path.display()))
}
