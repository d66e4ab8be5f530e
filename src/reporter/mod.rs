//! Console reporting of test results.
//!
//! The host engine's per-test results arrive as [`TestReport`]s and are fed to
//! a [`ResultPrinter`]: either the plain [`ProgressPrinter`] or the
//! hierarchical [`RelaxedReporter`] used in verbose mode.

pub mod display;
pub mod events;
pub mod progress;
pub mod relaxed;
pub mod stats;

pub use events::{Outcome, Phase, Style, TestReport};
pub use progress::ProgressPrinter;
pub use relaxed::RelaxedReporter;
pub use stats::TerminalStats;

use std::io;
use std::time::Duration;

/// Lifecycle calls a result printer receives during one run
pub trait ResultPrinter {
    fn run_start(&mut self, collected: usize) -> io::Result<()>;

    fn log_start(&mut self, nodeid: &str, fspath: &str) -> io::Result<()>;

    /// Statistics are recorded for every report before anything is displayed
    fn log_report(&mut self, report: &TestReport) -> io::Result<()>;

    /// Host output shown verbatim, such as failure tracebacks
    fn log_passthrough(&mut self, line: &str) -> io::Result<()>;

    fn run_end(&mut self, duration: Duration) -> io::Result<()>;

    fn stats(&self) -> &TerminalStats;
}

/// Printer for the requested mode
pub fn printer_for<W: io::Write + 'static>(
    verbose: bool,
    out: W,
    indent: &str,
    colors: bool,
) -> Box<dyn ResultPrinter> {
    if verbose {
        Box::new(RelaxedReporter::new(out, indent, colors))
    } else {
        Box::new(ProgressPrinter::new(out, colors))
    }
}
