//! Hierarchical verbose reporter.
//!
//! Test results arrive one at a time, in execution order. The nesting of each
//! test is reconstructed from its node id alone: every ancestor scope is
//! printed once, as an indented header, the first time a test below it is
//! reported.

use super::display::{display_name, split_nodeid};
use super::events::{Phase, Style, TestReport};
use super::stats::{write_summary, TerminalStats};
use super::ResultPrinter;
use std::collections::HashSet;
use std::io::{self, Write};
use std::time::Duration;

/// Headers displayed so far in one reporting session
#[derive(Debug, Clone, Default)]
pub struct HeaderState {
    displayed: HashSet<String>,
    indent: String,
    /// Style of the most recently displayed result
    last_style: Option<Style>,
}

impl HeaderState {
    pub fn new(indent: &str) -> Self {
        Self {
            displayed: HashSet::new(),
            indent: indent.to_string(),
            last_style: None,
        }
    }

    /// Header lines not displayed yet for `headers`, marking them displayed.
    ///
    /// Headers are identified by their `.`-joined path, so a class name reused
    /// under a different parent gets its own header.
    pub fn new_headers(&mut self, headers: &[&str]) -> Vec<String> {
        let mut lines = Vec::new();
        for (depth, header) in headers.iter().enumerate() {
            let path = headers[..=depth].join(".");
            if self.displayed.insert(path) {
                lines.push(format!("{}{}", self.indent.repeat(depth), display_name(header)));
            }
        }
        lines
    }

    pub fn indent(&self, depth: usize) -> String {
        self.indent.repeat(depth)
    }

    pub fn last_style(&self) -> Option<Style> {
        self.last_style
    }
}

pub struct RelaxedReporter<W: Write> {
    out: W,
    headers: HeaderState,
    stats: TerminalStats,
    colors: bool,
}

impl<W: Write> RelaxedReporter<W> {
    pub fn new(out: W, indent: &str, colors: bool) -> Self {
        Self {
            out,
            headers: HeaderState::new(indent),
            stats: TerminalStats::new(),
            colors,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    /// Print every ancestor of `nodeid` not displayed yet, followed by a
    /// single blank line if anything was printed
    fn ensure_headers(&mut self, nodeid: &str) -> io::Result<()> {
        let (headers, _) = split_nodeid(nodeid);
        let lines = self.headers.new_headers(&headers);
        for line in &lines {
            write!(self.out, "\n{line}\n")?;
        }
        if !lines.is_empty() {
            writeln!(self.out)?;
        }
        Ok(())
    }

    fn display_result(&mut self, report: &TestReport) -> io::Result<()> {
        let (headers, leaf) = split_nodeid(&report.nodeid);
        let indent = self.headers.indent(headers.len());
        let name = display_name(leaf);
        let style = report.effective_style();
        self.headers.last_style = Some(style);

        if self.colors {
            writeln!(self.out, "{indent}{}", style.paint(&name))
        } else {
            writeln!(self.out, "{indent}{name}")
        }
    }
}

impl<W: Write> ResultPrinter for RelaxedReporter<W> {
    fn run_start(&mut self, _collected: usize) -> io::Result<()> {
        Ok(())
    }

    // Test locations are never printed; results carry all the display
    fn log_start(&mut self, _nodeid: &str, _fspath: &str) -> io::Result<()> {
        Ok(())
    }

    fn log_report(&mut self, report: &TestReport) -> io::Result<()> {
        self.stats.record(report);

        if report.when != Phase::Call {
            return Ok(());
        }
        self.ensure_headers(&report.nodeid)?;
        self.display_result(report)?;
        self.out.flush()
    }

    fn log_passthrough(&mut self, line: &str) -> io::Result<()> {
        writeln!(self.out, "{line}")
    }

    fn run_end(&mut self, duration: Duration) -> io::Result<()> {
        writeln!(self.out)?;
        write_summary(&mut self.out, &self.stats, duration, self.colors)
    }

    fn stats(&self) -> &TerminalStats {
        &self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reporter::events::Outcome;
    use indoc::indoc;

    fn report_all(nodeids: &[&str]) -> String {
        let mut reporter = RelaxedReporter::new(Vec::new(), "    ", false);
        for nodeid in nodeids {
            reporter
                .log_report(&TestReport::call(*nodeid, Outcome::Passed))
                .unwrap();
        }
        String::from_utf8(reporter.into_inner()).unwrap()
    }

    #[test]
    fn test_tests_nested_under_classes_without_files() {
        let output = report_all(&[
            "behaviors.py::Behaviors::behavior_one",
            "behaviors.py::Behaviors::behavior_two",
            "other_behaviors.py::OtherBehaviors::behavior_one",
            "other_behaviors.py::OtherBehaviors::behavior_two",
        ]);

        assert_eq!(
            output,
            indoc! {"

                Behaviors

                    behavior one
                    behavior two

                OtherBehaviors

                    behavior one
                    behavior two
            "}
        );
    }

    #[test]
    fn test_nests_many_levels_deep() {
        let output = report_all(&[
            "behaviors.py::Behaviors::behavior_one",
            "behaviors.py::Behaviors::behavior_two",
            "behaviors.py::Behaviors::MoreBehaviors::an_behavior",
            "behaviors.py::Behaviors::MoreBehaviors::another_behavior",
            "behaviors.py::Behaviors::YetMore::Behaviors::yup",
            "behaviors.py::Behaviors::YetMore::Behaviors::still_works",
        ]);

        assert_eq!(
            output,
            indoc! {"

                Behaviors

                    behavior one
                    behavior two

                    MoreBehaviors

                        an behavior
                        another behavior

                    YetMore

                        Behaviors

                            yup
                            still works
            "}
        );
    }

    #[test]
    fn test_headers_print_once_and_strip_affixes() {
        let output = report_all(&[
            "test_stuff.py::TestSomeStuff::test_the_stuff",
            "test_stuff.py::TestSomeStuff::()::test_more_stuff",
        ]);

        assert_eq!(output, "\nSomeStuff\n\n    the stuff\n    more stuff\n");
    }

    #[test]
    fn test_module_level_tests_are_not_indented() {
        let output = report_all(&["foo.py::hello_how_are_you", "foo.py::goodbye"]);
        assert_eq!(output, "hello how are you\ngoodbye\n");
    }

    #[test]
    fn test_setup_and_teardown_phases_only_count() {
        let mut reporter = RelaxedReporter::new(Vec::new(), "    ", false);
        reporter
            .log_report(
                &TestReport::call("a.py::Outer::t", Outcome::Failed).with_phase(Phase::Setup),
            )
            .unwrap();
        reporter
            .log_report(
                &TestReport::call("a.py::Outer::t", Outcome::Passed).with_phase(Phase::Teardown),
            )
            .unwrap();

        assert_eq!(reporter.stats().count("error"), 1);
        assert!(reporter.into_inner().is_empty());
    }

    #[test]
    fn test_leaf_colors_and_override() {
        let mut reporter = RelaxedReporter::new(Vec::new(), "  ", true);
        reporter
            .log_report(&TestReport::call("a.py::Outer::passes", Outcome::Passed))
            .unwrap();
        reporter
            .log_report(&TestReport::call("a.py::Outer::fails", Outcome::Failed))
            .unwrap();
        reporter
            .log_report(
                &TestReport::call("a.py::Outer::restyled", Outcome::Passed).with_style(Style::Yellow),
            )
            .unwrap();
        assert_eq!(reporter.headers.last_style(), Some(Style::Yellow));
        reporter
            .log_report(&TestReport::call("a.py::Outer::known_bug", Outcome::XFailed))
            .unwrap();

        let output = String::from_utf8(reporter.into_inner()).unwrap();
        assert!(output.contains("  \x1b[32mpasses\x1b[0m\n"));
        assert!(output.contains("  \x1b[31mfails\x1b[0m\n"));
        assert!(output.contains("  \x1b[33mrestyled\x1b[0m\n"));
        assert!(output.contains("  \x1b[33mknown bug\x1b[0m\n"));
    }

    #[test]
    fn test_same_name_under_different_parents() {
        let mut state = HeaderState::new("  ");
        assert_eq!(state.new_headers(&["A", "Inner"]), vec!["A", "  Inner"]);
        assert_eq!(state.new_headers(&["B", "Inner"]), vec!["B", "  Inner"]);
        assert!(state.new_headers(&["A", "Inner"]).is_empty());
    }
}
