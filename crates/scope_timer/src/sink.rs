//! Destinations for rendered reports
//!
//! A sink is anything that accepts appended text. The root scope owns its
//! sink and writes the finished report to it once, line by line.

use std::cell::RefCell;
use std::io;
use std::rc::Rc;

/// An append-only text destination.
pub trait ReportSink {
    /// Append one chunk of text. Report lines arrive with their trailing newline.
    fn append(&mut self, text: &str) -> io::Result<()>;

    /// Called after the last line of a report.
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<S: ReportSink + ?Sized> ReportSink for Box<S> {
    fn append(&mut self, text: &str) -> io::Result<()> {
        (**self).append(text)
    }

    fn flush(&mut self) -> io::Result<()> {
        (**self).flush()
    }
}

/// In-memory buffer that stays readable after the root scope takes its sink.
///
/// A root owns its sink for good, so a plain `String` is not a sink:
///
/// ```compile_fail
/// use scope_timer::RootScope;
///
/// let _root = RootScope::start("load", String::new());
/// ```
///
/// # Example
///
/// ```rust
/// use scope_timer::{RootScope, SharedBuffer};
///
/// let buffer = SharedBuffer::new();
/// {
///     let _root = RootScope::start("load", buffer.clone());
/// }
/// assert!(buffer.contents().starts_with("load"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct SharedBuffer {
    text: Rc<RefCell<String>>,
}

impl SharedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything written so far.
    pub fn contents(&self) -> String {
        self.text.borrow().clone()
    }

    /// Written lines without their newlines.
    pub fn lines(&self) -> Vec<String> {
        self.text.borrow().lines().map(str::to_owned).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.text.borrow().is_empty()
    }

    pub fn clear(&self) {
        self.text.borrow_mut().clear();
    }
}

impl ReportSink for SharedBuffer {
    fn append(&mut self, text: &str) -> io::Result<()> {
        self.text.borrow_mut().push_str(text);
        Ok(())
    }
}

/// Adapter writing reports to any [`io::Write`], e.g. stdout or a file.
#[derive(Debug)]
pub struct IoSink<W: io::Write> {
    writer: W,
}

impl<W: io::Write> IoSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: io::Write> ReportSink for IoSink<W> {
    fn append(&mut self, text: &str) -> io::Result<()> {
        self.writer.write_all(text.as_bytes())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

/// Emits each report line as an `info` event on the `scope_timer::report` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl ReportSink for TracingSink {
    fn append(&mut self, text: &str) -> io::Result<()> {
        for line in text.lines() {
            tracing::info!(target: "scope_timer::report", "{}", line);
        }
        Ok(())
    }
}
