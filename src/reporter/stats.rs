//! Run statistics and the end-of-run summary line.

use super::events::{Outcome, Phase, Style, TestReport};
use std::collections::BTreeMap;
use std::io::{self, Write};
use std::time::Duration;

/// Terminal width the separators are centered in
pub const FULL_WIDTH: usize = 80;

/// Summary categories in the order the host prints them
const KNOWN_TYPES: [&str; 6] = ["failed", "passed", "skipped", "xfailed", "xpassed", "error"];

/// Counts of reports per summary category
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TerminalStats {
    counts: BTreeMap<&'static str, usize>,
}

impl TerminalStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Account for one report; setup and teardown only count when they fail
    /// or skip
    pub fn record(&mut self, report: &TestReport) {
        let category = match (report.when, report.outcome) {
            (Phase::Call, Outcome::Passed) => "passed",
            (Phase::Call, Outcome::Failed) => "failed",
            (_, Outcome::Skipped) => "skipped",
            (_, Outcome::XFailed) => "xfailed",
            (_, Outcome::XPassed) => "xpassed",
            (_, Outcome::Failed) => "error",
            (_, Outcome::Passed) => return,
        };
        *self.counts.entry(category).or_default() += 1;
    }

    pub fn count(&self, category: &str) -> usize {
        self.counts.get(category).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    /// Color of the summary line
    pub fn main_color(&self) -> Style {
        if self.count("failed") > 0 || self.count("error") > 0 {
            Style::Red
        } else if self.count("xpassed") > 0 || self.count("passed") == 0 {
            Style::Yellow
        } else {
            Style::Green
        }
    }

    /// `1 failed, 2 passed, 1 skipped in 0.12s`
    pub fn summary_line(&self, duration: Duration) -> String {
        let parts: Vec<String> = KNOWN_TYPES
            .iter()
            .filter_map(|&category| {
                let count = self.count(category);
                (count > 0).then(|| format!("{count} {}", pluralize(category, count)))
            })
            .collect();
        let counts = if parts.is_empty() {
            "no tests ran".to_string()
        } else {
            parts.join(", ")
        };
        format!("{counts} in {:.2}s", duration.as_secs_f64())
    }
}

fn pluralize(category: &str, count: usize) -> String {
    if category == "error" && count != 1 {
        "errors".into()
    } else {
        category.into()
    }
}

/// Center `title` in a line of `sep` characters, the way the host does
pub fn separator(sep: char, title: &str) -> String {
    if title.is_empty() {
        return sep.to_string().repeat(FULL_WIDTH);
    }
    let fill_len = (FULL_WIDTH.saturating_sub(title.chars().count() + 2) / 2).max(1);
    let fill = sep.to_string().repeat(fill_len);
    let mut line = format!("{fill} {title} {fill}");
    if line.chars().count() < FULL_WIDTH {
        line.push(sep);
    }
    line
}

/// Final `==== <summary> ====` line of a run
pub fn write_summary<W: Write>(
    out: &mut W,
    stats: &TerminalStats,
    duration: Duration,
    colors: bool,
) -> io::Result<()> {
    let line = separator('=', &stats.summary_line(duration));
    if colors {
        writeln!(out, "{}", stats.main_color().paint(&line))
    } else {
        writeln!(out, "{line}")
    }
}
