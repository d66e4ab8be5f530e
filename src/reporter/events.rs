//! Per-test report events received from the host engine.

use super::display::NODEID_SEPARATOR;

/// Phase of a test run a report belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Setup,
    Call,
    Teardown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    Passed,
    Failed,
    Skipped,
    /// Expected failure that failed
    XFailed,
    /// Expected failure that passed
    XPassed,
}

/// Terminal styling for a report line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
    Green,
    Red,
    Yellow,
}

impl Style {
    pub const RESET: &'static str = "\x1b[0m";

    pub fn ansi(self) -> &'static str {
        match self {
            Style::Green => "\x1b[32m",
            Style::Red => "\x1b[31m",
            Style::Yellow => "\x1b[33m",
        }
    }

    /// Wrap `text` in this style's escape codes
    pub fn paint(self, text: &str) -> String {
        format!("{}{text}{}", self.ansi(), Self::RESET)
    }
}

impl From<Outcome> for Style {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Passed => Style::Green,
            Outcome::Failed => Style::Red,
            Outcome::Skipped | Outcome::XFailed | Outcome::XPassed => Style::Yellow,
        }
    }
}

/// Completion of one phase of one test
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestReport {
    pub nodeid: String,
    pub when: Phase,
    pub outcome: Outcome,
    /// Styling requested by the host, overriding the outcome color
    pub style: Option<Style>,
    /// Failure representation, when the host supplied one
    pub longrepr: Option<String>,
}

impl TestReport {
    /// A report for the main call phase
    pub fn call(nodeid: impl Into<String>, outcome: Outcome) -> Self {
        Self {
            nodeid: nodeid.into(),
            when: Phase::Call,
            outcome,
            style: None,
            longrepr: None,
        }
    }

    pub fn with_phase(mut self, when: Phase) -> Self {
        self.when = when;
        self
    }

    pub fn with_style(mut self, style: Style) -> Self {
        self.style = Some(style);
        self
    }

    /// File part of the node id
    pub fn fspath(&self) -> &str {
        self.nodeid
            .split(NODEID_SEPARATOR)
            .next()
            .unwrap_or(&self.nodeid)
    }

    /// Style the line for this report is printed in
    pub fn effective_style(&self) -> Style {
        self.style.unwrap_or_else(|| self.outcome.into())
    }
}
