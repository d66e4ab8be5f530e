//! The host's default, dot-per-test progress display.

use super::events::{Outcome, Phase, Style, TestReport};
use super::stats::{write_summary, TerminalStats};
use super::ResultPrinter;
use std::io::{self, Write};
use std::time::Duration;

pub struct ProgressPrinter<W: Write> {
    out: W,
    stats: TerminalStats,
    /// File whose progress line is currently open
    current_fspath: Option<String>,
    colors: bool,
}

impl<W: Write> ProgressPrinter<W> {
    pub fn new(out: W, colors: bool) -> Self {
        Self {
            out,
            stats: TerminalStats::new(),
            current_fspath: None,
            colors,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn end_line(&mut self) -> io::Result<()> {
        if self.current_fspath.take().is_some() {
            writeln!(self.out)?;
        }
        Ok(())
    }
}

/// Progress character for a report, if the report shows one
fn progress_char(report: &TestReport) -> Option<(char, Style)> {
    match (report.when, report.outcome) {
        (Phase::Call, Outcome::Passed) => Some(('.', Style::Green)),
        (Phase::Call, Outcome::Failed) => Some(('F', Style::Red)),
        (_, Outcome::Skipped) => Some(('s', Style::Yellow)),
        (_, Outcome::XFailed) => Some(('x', Style::Yellow)),
        (_, Outcome::XPassed) => Some(('X', Style::Yellow)),
        (_, Outcome::Failed) => Some(('E', Style::Red)),
        (_, Outcome::Passed) => None,
    }
}

impl<W: Write> ResultPrinter for ProgressPrinter<W> {
    fn run_start(&mut self, _collected: usize) -> io::Result<()> {
        writeln!(self.out)
    }

    fn log_start(&mut self, _nodeid: &str, fspath: &str) -> io::Result<()> {
        if self.current_fspath.as_deref() == Some(fspath) {
            return Ok(());
        }
        self.end_line()?;
        write!(self.out, "{fspath} ")?;
        self.current_fspath = Some(fspath.to_string());
        Ok(())
    }

    fn log_report(&mut self, report: &TestReport) -> io::Result<()> {
        self.stats.record(report);

        let Some((letter, default_style)) = progress_char(report) else {
            return Ok(());
        };
        if self.colors {
            let style = report.style.unwrap_or(default_style);
            write!(self.out, "{}", style.paint(&letter.to_string()))?;
        } else {
            write!(self.out, "{letter}")?;
        }
        self.out.flush()
    }

    fn log_passthrough(&mut self, line: &str) -> io::Result<()> {
        self.end_line()?;
        writeln!(self.out, "{line}")
    }

    fn run_end(&mut self, duration: Duration) -> io::Result<()> {
        self.end_line()?;
        writeln!(self.out)?;
        write_summary(&mut self.out, &self.stats, duration, self.colors)
    }

    fn stats(&self) -> &TerminalStats {
        &self.stats
    }
}
