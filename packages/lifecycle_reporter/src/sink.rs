//! Destinations for diagnostic lines.

use std::fmt;
use std::io::{self, Write};
use std::sync::{Mutex, PoisonError};

/// Destination of the diagnostic lines emitted by reporters.
///
/// A sink is owned by the caller and shared with every reporter bound to it. Lines are
/// handed over without a terminator; the sink is responsible for ending each line.
///
/// Reporters only call a sink while holding their registry lock, so a sink shared by
/// reporters of a single registry never sees concurrent calls. A sink shared across
/// registries must tolerate concurrent calls, which the `Send + Sync` bound guarantees
/// it can.
///
/// # Examples
///
/// ```
/// use std::io;
///
/// use lifecycle_reporter::Sink;
///
/// #[derive(Debug)]
/// struct Discard;
///
/// impl Sink for Discard {
///     fn write_line(&self, _line: &str) -> io::Result<()> {
///         Ok(())
///     }
/// }
/// ```
pub trait Sink: fmt::Debug + Send + Sync + 'static {
    /// Writes one complete line, appending the line terminator.
    ///
    /// # Errors
    ///
    /// Returns the I/O error of the underlying stream, if any. Reporters do not
    /// propagate it; the failure is counted by the registry instead.
    fn write_line(&self, line: &str) -> io::Result<()>;
}

/// Writes diagnostic lines to the standard error stream of the process.
///
/// This is the default sink of [`Registry::new()`][1] and of the process-wide registries.
///
/// [1]: crate::Registry::new
#[derive(Debug, Default)]
pub struct StderrSink;

impl Sink for StderrSink {
    #[cfg_attr(test, mutants::skip)] // Too difficult to test stderr output reliably - manually tested.
    fn write_line(&self, line: &str) -> io::Result<()> {
        let mut stderr = io::stderr().lock();
        writeln!(stderr, "{line}")
    }
}

/// Keeps diagnostic lines in memory, for inspection by tests and tooling.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
///
/// use lifecycle_reporter::{MemorySink, Registry};
///
/// let sink = Arc::new(MemorySink::new());
/// let registry = Registry::<u64>::builder().default_sink(sink.clone()).build();
///
/// drop(registry.reporter());
///
/// assert_eq!(sink.len(), 2);
/// ```
#[derive(Debug, Default)]
pub struct MemorySink {
    lines: Mutex<Vec<String>>,
}

impl MemorySink {
    /// Creates an empty in-memory sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of the lines written so far, oldest first.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        self.guard().clone()
    }

    /// Removes and returns the lines written so far, oldest first.
    #[must_use]
    pub fn take_lines(&self) -> Vec<String> {
        std::mem::take(&mut *self.guard())
    }

    /// Number of lines written so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.guard().len()
    }

    /// Whether no lines have been written.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.guard().is_empty()
    }

    fn guard(&self) -> std::sync::MutexGuard<'_, Vec<String>> {
        // A `Vec` push cannot leave the list half-updated, so a poisoned lock is still usable.
        self.lines.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Sink for MemorySink {
    fn write_line(&self, line: &str) -> io::Result<()> {
        self.guard().push(line.to_owned());
        Ok(())
    }
}

/// Adapts any [`Write`] implementation into a sink.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
///
/// use lifecycle_reporter::{Registry, WriterSink};
///
/// let sink = Arc::new(WriterSink::new(Vec::new()));
/// let registry = Registry::<u64>::new();
///
/// registry.reporter_with_sink(sink.clone()).call(());
/// ```
pub struct WriterSink<W> {
    writer: Mutex<W>,
}

impl<W> WriterSink<W>
where
    W: Write + Send + 'static,
{
    /// Creates a sink that writes every line to `writer`.
    #[must_use]
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    /// Consumes the sink, returning the underlying writer.
    #[must_use]
    pub fn into_inner(self) -> W {
        self.writer
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

// Debug implementations have no API contract to test.
#[cfg_attr(coverage_nightly, coverage(off))]
#[cfg_attr(test, mutants::skip)]
impl<W> fmt::Debug for WriterSink<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WriterSink")
            .field("writer", &"<writer>")
            .finish()
    }
}

impl<W> Sink for WriterSink<W>
where
    W: Write + Send + 'static,
{
    fn write_line(&self, line: &str) -> io::Result<()> {
        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        writeln!(writer, "{line}")?;
        writer.flush()
    }
}
