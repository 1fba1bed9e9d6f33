//! Diagnostic sinks.

use std::io::{self, Write};

use crate::types::{LintResult, Violation};

/// Receives violations as the dispatcher produces them, in traversal order.
pub trait Reporter {
    /// Emits one violation.
    ///
    /// # Errors
    ///
    /// Returns an error if the sink cannot be written.
    fn report(&mut self, violation: &Violation) -> io::Result<()>;

    /// Called once after the last violation of a run.
    ///
    /// # Errors
    ///
    /// Returns an error if the sink cannot be flushed.
    fn finish(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Writes `<file>:<line>:<column>: <message>` lines as violations arrive.
#[derive(Debug)]
pub struct LineReporter<W: Write> {
    out: W,
}

impl<W: Write> LineReporter<W> {
    /// Creates a reporter writing to `out`.
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Returns the underlying writer.
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Reporter for LineReporter<W> {
    fn report(&mut self, violation: &Violation) -> io::Result<()> {
        writeln!(self.out, "{violation}")
    }

    fn finish(&mut self) -> io::Result<()> {
        self.out.flush()
    }
}

impl Reporter for LintResult {
    fn report(&mut self, violation: &Violation) -> io::Result<()> {
        self.violations.push(violation.clone());
        Ok(())
    }
}

impl<R: Reporter + ?Sized> Reporter for &mut R {
    fn report(&mut self, violation: &Violation) -> io::Result<()> {
        (**self).report(violation)
    }

    fn finish(&mut self) -> io::Result<()> {
        (**self).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Location, Severity};

    fn violation(line: usize) -> Violation {
        Violation::new(
            "LS001",
            "constant-message",
            Severity::Error,
            Location::new("main.go", line, 2),
            "call must use a string literal or a constant",
        )
    }

    #[test]
    fn line_reporter_writes_one_line_per_violation() {
        let mut reporter = LineReporter::new(Vec::new());
        reporter.report(&violation(8)).expect("write");
        reporter.report(&violation(11)).expect("write");
        reporter.finish().expect("flush");

        let out = String::from_utf8(reporter.into_inner()).expect("utf8");
        assert_eq!(
            out,
            "main.go:8:2: call must use a string literal or a constant\n\
             main.go:11:2: call must use a string literal or a constant\n"
        );
    }

    #[test]
    fn lint_result_collects_in_order() {
        let mut result = LintResult::new();
        result.report(&violation(11)).expect("collect");
        result.report(&violation(8)).expect("collect");
        let lines: Vec<_> = result.violations.iter().map(|v| v.location.line).collect();
        assert_eq!(lines, vec![11, 8]);
    }
}
