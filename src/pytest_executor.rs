//! Running the host engine and turning its output into report events.

use crate::host_plugin::{HostPlugin, HostPluginError};
use crate::reporter::{Outcome, Phase, ResultPrinter, TestReport};
use crate::runner::PytestRunner;
use log::{debug, info};
use regex::Regex;
use std::io::{self, BufRead, BufReader};
use std::path::Path;
use std::process::{Command, Stdio};
use std::time::Instant;
use thiserror::Error;

/// Options making the host collect every non-private module, class and
/// function, so the node ids collected here resolve on its side too
const HOST_OVERRIDES: [&str; 6] = [
    "-o",
    "python_files=*.py",
    "-o",
    "python_classes=[!_]*",
    "-o",
    "python_functions=[!_]*",
];

#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("failed reading host output: {0}")]
    Output(#[from] io::Error),

    #[error(transparent)]
    Pattern(#[from] regex::Error),

    #[error(transparent)]
    Plugin(#[from] HostPluginError),
}

/// One line of host output, classified
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostLine {
    Report(TestReport),
    /// Part of a section shown to the user verbatim
    Passthrough(String),
    Ignored,
}

/// Parser for the host's verbose output
pub struct HostOutputParser {
    result: Regex,
    section: Regex,
    in_passthrough: bool,
}

impl HostOutputParser {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            result: Regex::new(
                r"^(?P<nodeid>\S.*?::.*?) (?P<status>PASSED|FAILED|SKIPPED|XFAIL|XPASS|ERROR)(?:\s|$)",
            )?,
            section: Regex::new(r"^=+ (?P<title>.+?) =+$")?,
            in_passthrough: false,
        })
    }

    pub fn parse_line(&mut self, line: &str) -> HostLine {
        if let Some(caps) = self.section.captures(line) {
            let title = &caps["title"];
            self.in_passthrough = matches!(title, "FAILURES" | "ERRORS" | "warnings summary");
            return if self.in_passthrough {
                HostLine::Passthrough(line.to_string())
            } else {
                HostLine::Ignored
            };
        }
        if self.in_passthrough {
            return HostLine::Passthrough(line.to_string());
        }

        match self.result.captures(line) {
            Some(caps) => HostLine::Report(report_for(&caps["nodeid"], &caps["status"])),
            None => HostLine::Ignored,
        }
    }
}

fn report_for(nodeid: &str, status: &str) -> TestReport {
    let report = |outcome| TestReport::call(nodeid, outcome);
    match status {
        "PASSED" => report(Outcome::Passed),
        "FAILED" => report(Outcome::Failed),
        "SKIPPED" => report(Outcome::Skipped),
        "XFAIL" => report(Outcome::XFailed),
        "XPASS" => report(Outcome::XPassed),
        // ERROR lines come from fixtures and lifecycle hooks, not the test body
        _ => report(Outcome::Failed).with_phase(Phase::Setup),
    }
}

/// Full host command line for a run
pub fn build_command(
    runner: &PytestRunner,
    test_nodes: &[String],
    pytest_args: &[String],
    rootpath: &Path,
    plugin: &HostPlugin,
) -> Result<Command, HostPluginError> {
    let mut cmd = runner.command();
    cmd.arg("--rootdir").arg(rootpath);
    cmd.args(["-v", "--color=no"]);
    cmd.args(HOST_OVERRIDES);
    plugin.configure(&mut cmd)?;
    cmd.args(pytest_args);
    cmd.args(test_nodes);
    cmd.current_dir(rootpath);
    Ok(cmd)
}

/// Run the collected tests through the host, reporting each result to
/// `printer`. Returns the host's exit code.
pub fn execute_tests(
    runner: &PytestRunner,
    test_nodes: &[String],
    pytest_args: &[String],
    rootpath: &Path,
    plugin: &HostPlugin,
    printer: &mut dyn ResultPrinter,
) -> Result<i32, ExecutionError> {
    let mut cmd = build_command(runner, test_nodes, pytest_args, rootpath, plugin)?;
    cmd.stdout(Stdio::piped()).stderr(Stdio::inherit());
    info!("running {} tests with {}", test_nodes.len(), runner.program);

    let started = Instant::now();
    let mut child = cmd.spawn().map_err(|source| ExecutionError::Spawn {
        program: runner.program.clone(),
        source,
    })?;

    printer.run_start(test_nodes.len())?;
    if let Some(stdout) = child.stdout.take() {
        let mut parser = HostOutputParser::new()?;
        for line in BufReader::new(stdout).lines() {
            match parser.parse_line(&line?) {
                HostLine::Report(report) => {
                    printer.log_start(&report.nodeid, report.fspath())?;
                    printer.log_report(&report)?;
                }
                HostLine::Passthrough(text) => printer.log_passthrough(&text)?,
                HostLine::Ignored => {}
            }
        }
    }

    let status = child.wait()?;
    printer.run_end(started.elapsed())?;
    debug!("host exited with {status}");

    Ok(status.code().unwrap_or(-1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::resolver::resolve_module;
    use crate::host_plugin::{build_payload, HostPayload, PAYLOAD_ENV};
    use crate::python_discovery::discovery::parse_module;
    use crate::reporter::TerminalStats;
    use indoc::indoc;
    use std::ffi::OsStr;
    use std::path::PathBuf;
    use std::time::Duration;

    fn env_of<'c>(cmd: &'c Command, key: &str) -> Option<&'c OsStr> {
        cmd.get_envs()
            .find(|(name, _)| *name == key)
            .and_then(|(_, value)| value)
    }

    #[test]
    fn test_parses_result_lines() {
        let mut parser = HostOutputParser::new().unwrap();

        assert_eq!(
            parser.parse_line("behaviors.py::Behaviors::behavior_one PASSED          [ 50%]"),
            HostLine::Report(TestReport::call(
                "behaviors.py::Behaviors::behavior_one",
                Outcome::Passed
            ))
        );
        assert_eq!(
            parser.parse_line("a.py::test_skip SKIPPED (no reason)"),
            HostLine::Report(TestReport::call("a.py::test_skip", Outcome::Skipped))
        );
        assert_eq!(
            parser.parse_line("a.py::Outer::fails FAILED"),
            HostLine::Report(TestReport::call("a.py::Outer::fails", Outcome::Failed))
        );
    }

    #[test]
    fn test_expected_failures_and_errors() {
        let mut parser = HostOutputParser::new().unwrap();

        assert_eq!(
            parser.parse_line("a.py::xfails XFAIL (known bug)"),
            HostLine::Report(TestReport::call("a.py::xfails", Outcome::XFailed))
        );
        assert_eq!(
            parser.parse_line("a.py::xpasses XPASS"),
            HostLine::Report(TestReport::call("a.py::xpasses", Outcome::XPassed))
        );
        match parser.parse_line("a.py::broken_fixture ERROR   [100%]") {
            HostLine::Report(report) => {
                assert_eq!(report.when, Phase::Setup);
                assert_eq!(report.outcome, Outcome::Failed);
            }
            other => panic!("expected a report, got {other:?}"),
        }
    }

    #[test]
    fn test_headers_and_noise_are_ignored() {
        let mut parser = HostOutputParser::new().unwrap();

        for line in [
            "============================= test session starts ==============================",
            "platform linux -- Python 3.12.0, pytest-8.0.0",
            "collecting ... collected 2 items",
            "",
            "test_names_PASSED_are_tricky_without_separator",
        ] {
            assert_eq!(parser.parse_line(line), HostLine::Ignored, "{line}");
        }
    }

    #[test]
    fn test_failure_sections_pass_through() {
        let mut parser = HostOutputParser::new().unwrap();

        let lines = [
            "=================================== FAILURES ===================================",
            "________________________________ Outer.fails _________________________________",
            "    def fails(self):",
            ">       assert False",
            "E       assert False",
            "a.py::Outer::fails FAILED",
            "=========================== short test summary info ============================",
            "FAILED a.py::Outer::fails - assert False",
            "============================== 1 failed in 0.01s ===============================",
        ];
        let parsed: Vec<HostLine> = lines.iter().map(|line| parser.parse_line(line)).collect();

        for line in &parsed[..6] {
            assert!(matches!(line, HostLine::Passthrough(_)), "{line:?}");
        }
        for line in &parsed[6..] {
            assert_eq!(line, &HostLine::Ignored);
        }
    }

    #[test]
    fn test_expected_outcomes_reach_the_summary() {
        let mut parser = HostOutputParser::new().unwrap();
        let mut stats = TerminalStats::new();

        for line in [
            "a.py::known_bug XFAIL (not fixed yet)",
            "a.py::fixed_bug XPASS",
            "a.py::works PASSED",
        ] {
            match parser.parse_line(line) {
                HostLine::Report(report) => stats.record(&report),
                other => panic!("expected a report, got {other:?}"),
            }
        }

        assert_eq!(stats.count("passed"), 1);
        assert_eq!(
            stats.summary_line(Duration::ZERO),
            "1 passed, 1 xfailed, 1 xpassed in 0.00s"
        );
    }

    #[test]
    fn test_build_command() {
        let runner = PytestRunner::new("python".to_string(), vec![]);
        let root = PathBuf::from("/project");
        let plugin = HostPlugin::install(&HostPayload::default()).unwrap();
        let cmd = build_command(
            &runner,
            &["a.py::one".to_string()],
            &["-x".to_string()],
            &root,
            &plugin,
        )
        .unwrap();

        let args: Vec<_> = cmd.get_args().map(|a| a.to_string_lossy().into_owned()).collect();
        assert_eq!(
            args,
            vec![
                "-m",
                "pytest",
                "--rootdir",
                "/project",
                "-v",
                "--color=no",
                "-o",
                "python_files=*.py",
                "-o",
                "python_classes=[!_]*",
                "-o",
                "python_functions=[!_]*",
                "-p",
                "relaxed_host",
                "-p",
                "no:nose",
                "-x",
                "a.py::one",
            ]
        );
        assert_eq!(cmd.get_current_dir(), Some(root.as_path()));
    }

    #[test]
    fn test_command_hands_nested_setup_to_the_host() {
        let module = parse_module(
            Path::new("state.py"),
            "state.py",
            "state",
            indoc! {r#"
                class Outer:
                    def setup(self):
                        self.some_attr = 17

                    class Inner:
                        def hrm(self):
                            assert self.some_attr == 17
            "#},
        )
        .unwrap();
        let tree = resolve_module(&module);
        let nodes: Vec<String> = tree.leaves().iter().map(|l| l.qualified_id.clone()).collect();
        let plugin = HostPlugin::install(&build_payload(&[tree])).unwrap();
        let runner = PytestRunner::new("python".to_string(), vec![]);

        let cmd = build_command(&runner, &nodes, &[], Path::new("/project"), &plugin).unwrap();

        assert_eq!(nodes, vec!["state.py::Outer::Inner::hrm"]);
        let pythonpath = env_of(&cmd, "PYTHONPATH").unwrap();
        assert_eq!(
            std::env::split_paths(pythonpath).next(),
            Some(plugin.dir().to_path_buf())
        );
        let payload_path = env_of(&cmd, PAYLOAD_ENV).unwrap();
        let payload: serde_json::Value =
            serde_json::from_slice(&std::fs::read(payload_path).unwrap()).unwrap();
        assert_eq!(
            payload["scopes"]["state.py::Outer::Inner"],
            serde_json::json!({
                "path": ["Outer", "Inner"],
                "inherited": [{"name": "setup", "owner": ["Outer"]}],
                "setup": true,
                "teardown": false,
            })
        );
    }
}
