//! Scoped capture of the crate's terminal output.
//!
//! Everything the crate prints goes through [`stdout()`] and [`stderr()`].
//! Outside of [`trap`] they forward to the process streams; inside, they write
//! into buffers that are handed back once the trapped closure returns.

use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

type Buffer = Rc<RefCell<Vec<u8>>>;

/// A buffer that also copies every write into a shared combined buffer
#[derive(Clone, Default)]
struct CarbonCopy {
    own: Buffer,
    cc: Buffer,
}

impl CarbonCopy {
    fn write(&self, buf: &[u8]) {
        self.own.borrow_mut().extend_from_slice(buf);
        self.cc.borrow_mut().extend_from_slice(buf);
    }
}

#[derive(Clone, Default)]
struct Sinks {
    stdout: Option<CarbonCopy>,
    stderr: Option<CarbonCopy>,
}

thread_local! {
    static SINKS: RefCell<Sinks> = RefCell::new(Sinks::default());
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stream {
    Stdout,
    Stderr,
}

/// Writer for one of the crate's output streams
#[derive(Debug, Clone, Copy)]
pub struct TrapWriter {
    stream: Stream,
}

/// The crate's standard output
pub fn stdout() -> TrapWriter {
    TrapWriter {
        stream: Stream::Stdout,
    }
}

/// The crate's standard error
pub fn stderr() -> TrapWriter {
    TrapWriter {
        stream: Stream::Stderr,
    }
}

impl TrapWriter {
    fn sink(&self) -> Option<CarbonCopy> {
        SINKS.with(|sinks| {
            let sinks = sinks.borrow();
            match self.stream {
                Stream::Stdout => sinks.stdout.clone(),
                Stream::Stderr => sinks.stderr.clone(),
            }
        })
    }
}

impl Write for TrapWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match (self.sink(), self.stream) {
            (Some(sink), _) => {
                sink.write(buf);
                Ok(buf.len())
            }
            (None, Stream::Stdout) => io::stdout().write(buf),
            (None, Stream::Stderr) => io::stderr().write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match (self.sink(), self.stream) {
            (Some(_), _) => Ok(()),
            (None, Stream::Stdout) => io::stdout().flush(),
            (None, Stream::Stderr) => io::stderr().flush(),
        }
    }
}

/// Output captured while running a trapped closure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trapped<T> {
    pub value: T,
    pub stdout: String,
    pub stderr: String,
    /// Both streams interleaved in write order
    pub stdall: String,
}

/// Restores the previous sinks when dropped, including during unwinding
struct SinkGuard {
    previous: Sinks,
}

impl Drop for SinkGuard {
    fn drop(&mut self) {
        let previous = std::mem::take(&mut self.previous);
        SINKS.with(|sinks| *sinks.borrow_mut() = previous);
    }
}

/// Run `f` with the crate's output captured
pub fn trap<T>(f: impl FnOnce() -> T) -> Trapped<T> {
    let stdall = Buffer::default();
    let out = CarbonCopy {
        own: Buffer::default(),
        cc: stdall.clone(),
    };
    let err = CarbonCopy {
        own: Buffer::default(),
        cc: stdall.clone(),
    };

    let installed = Sinks {
        stdout: Some(out.clone()),
        stderr: Some(err.clone()),
    };
    let previous = SINKS.with(|sinks| std::mem::replace(&mut *sinks.borrow_mut(), installed));
    let guard = SinkGuard { previous };

    let value = f();
    drop(guard);

    let text = |buffer: &Buffer| String::from_utf8_lossy(&buffer.borrow()).into_owned();
    Trapped {
        value,
        stdout: text(&out.own),
        stderr: text(&err.own),
        stdall: text(&stdall),
    }
}
