//! Diagnostic sink shared by every output format.

use anyhow::Result;
use logstyle_core::{LintResult, Reporter, RunSummary, Severity, Violation, ViolationDiagnostic};
use std::collections::HashMap;
use std::io::{self, Write};
use std::path::PathBuf;

use crate::OutputFormat;

/// Writes violations in the chosen format and remembers the most severe
/// one seen.
///
/// `text` and `pretty` stream each violation as it arrives; `json` collects
/// them into one document written by [`Output::finish_run`].
pub struct Output<W: Write> {
    format: OutputFormat,
    out: W,
    collected: LintResult,
    sources: HashMap<PathBuf, String>,
    worst: Option<Severity>,
}

impl<W: Write> Output<W> {
    /// Creates a sink writing to `out`.
    pub fn new(format: OutputFormat, out: W) -> Self {
        Self {
            format,
            out,
            collected: LintResult::new(),
            sources: HashMap::new(),
            worst: None,
        }
    }

    /// The highest severity reported so far.
    #[must_use]
    pub fn worst(&self) -> Option<Severity> {
        self.worst
    }

    /// Ends the run: writes the JSON document if needed and returns the
    /// writer.
    pub fn finish_run(mut self, summary: RunSummary) -> Result<W> {
        if self.format == OutputFormat::Json {
            self.collected.files_checked = summary.files_checked;
            serde_json::to_writer_pretty(&mut self.out, &self.collected)?;
            writeln!(self.out)?;
        }
        self.out.flush()?;
        Ok(self.out)
    }

    fn render_pretty(&mut self, violation: &Violation) -> io::Result<()> {
        let file = &violation.location.file;
        if !self.sources.contains_key(file) {
            match std::fs::read_to_string(file) {
                Ok(source) => {
                    self.sources.insert(file.clone(), source);
                }
                Err(err) => {
                    tracing::debug!("{}: no source for rendering: {err}", file.display());
                    return writeln!(self.out, "{violation}");
                }
            }
        }
        let source = self.sources.get(file).cloned().unwrap_or_default();
        let report = miette::Report::new(ViolationDiagnostic::new(violation, source));
        writeln!(self.out, "{report:?}")
    }
}

impl<W: Write> Reporter for Output<W> {
    fn report(&mut self, violation: &Violation) -> io::Result<()> {
        self.worst = self.worst.max(Some(violation.severity));
        match self.format {
            OutputFormat::Text => writeln!(self.out, "{violation}"),
            OutputFormat::Json => {
                self.collected.violations.push(violation.clone());
                Ok(())
            }
            OutputFormat::Pretty => self.render_pretty(violation),
        }
    }

    fn finish(&mut self) -> io::Result<()> {
        self.out.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use logstyle_core::Location;

    fn violation(line: usize, severity: Severity) -> Violation {
        Violation::new(
            "LS001",
            "constant-message",
            severity,
            Location::new("main.go", line, 2),
            "call must use a string literal or a constant",
        )
    }

    fn summary(violations: usize) -> RunSummary {
        RunSummary {
            files_checked: 1,
            violations,
            suppressed: 0,
        }
    }

    #[test]
    fn text_streams_diagnostic_lines() {
        let mut output = Output::new(OutputFormat::Text, Vec::new());
        output.report(&violation(8, Severity::Error)).unwrap();
        output.report(&violation(11, Severity::Error)).unwrap();
        let out = String::from_utf8(output.finish_run(summary(2)).unwrap()).unwrap();
        insta::assert_snapshot!(out, @r"
        main.go:8:2: call must use a string literal or a constant
        main.go:11:2: call must use a string literal or a constant
        ");
    }

    #[test]
    fn json_is_one_document() {
        let mut output = Output::new(OutputFormat::Json, Vec::new());
        output.report(&violation(8, Severity::Warning)).unwrap();
        output.finish().unwrap();
        let bytes = output.finish_run(summary(1)).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value["files_checked"], 1);
        assert_eq!(value["violations"][0]["code"], "LS001");
        assert_eq!(value["violations"][0]["severity"], "warning");
        assert_eq!(value["violations"][0]["location"]["line"], 8);
    }

    #[test]
    fn pretty_falls_back_to_lines_without_source() {
        let mut output = Output::new(OutputFormat::Pretty, Vec::new());
        output.report(&violation(8, Severity::Error)).unwrap();
        let out = String::from_utf8(output.finish_run(summary(1)).unwrap()).unwrap();
        assert_eq!(out, "main.go:8:2: call must use a string literal or a constant\n");
    }

    #[test]
    fn pretty_labels_the_call() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("main.go");
        std::fs::write(&file, "package main\n\nfunc main() {\n\tlog.Info(msg)\n}\n").unwrap();
        let location = Location::new(&file, 4, 2).with_span(29, 13);
        let v = Violation::new(
            "LS001",
            "constant-message",
            Severity::Error,
            location,
            "call must use a string literal or a constant",
        );

        let mut output = Output::new(OutputFormat::Pretty, Vec::new());
        output.report(&v).unwrap();
        let out = String::from_utf8(output.finish_run(summary(1)).unwrap()).unwrap();
        assert!(out.contains("[LS001] call must use a string literal or a constant"), "{out}");
        assert!(out.contains("log.Info(msg)"), "{out}");
    }

    #[test]
    fn tracks_the_worst_severity() {
        let mut output = Output::new(OutputFormat::Text, io::sink());
        assert_eq!(output.worst(), None);
        output.report(&violation(1, Severity::Info)).unwrap();
        output.report(&violation(2, Severity::Warning)).unwrap();
        output.report(&violation(3, Severity::Info)).unwrap();
        assert_eq!(output.worst(), Some(Severity::Warning));
    }
}
