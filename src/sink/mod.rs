//! Byte sinks for encoded log lines
//!
//! A sink serializes its own writes internally, so a shared sink set can be
//! driven from any number of host threads without external locking.

pub mod console;
pub mod rotating;

pub use console::ConsoleSink;
pub use rotating::{RotatingFileSink, RotationConfig};

use std::io;
use std::sync::Arc;

/// A destination that durably or visibly records encoded log bytes.
pub trait Sink: Send + Sync {
    /// Write one encoded line. Implementations are safe for concurrent
    /// callers.
    fn write(&self, buf: &[u8]) -> io::Result<usize>;

    /// Force buffered bytes out to the underlying destination.
    fn flush(&self) -> io::Result<()>;
}

/// An ordered set of sinks sharing one logical write.
///
/// Every member sink is attempted on each write even when an earlier one
/// fails; the first error encountered is returned after all attempts
/// complete.
#[derive(Clone, Default)]
pub struct SinkSet {
    sinks: Vec<Arc<dyn Sink>>,
}

impl SinkSet {
    pub fn new() -> Self {
        SinkSet { sinks: Vec::new() }
    }

    pub fn push(&mut self, sink: Arc<dyn Sink>) {
        self.sinks.push(sink);
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    /// Fan one write out to every member sink, first-error-wins.
    pub fn write(&self, buf: &[u8]) -> io::Result<usize> {
        let mut first_error = None;
        for sink in &self.sinks {
            if let Err(e) = sink.write(buf) {
                if first_error.is_none() {
                    first_error = Some(e);
                }
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(buf.len()),
        }
    }

    /// Flush every member sink, first-error-wins.
    pub fn flush(&self) -> io::Result<()> {
        let mut first_error = None;
        for sink in &self.sinks {
            if let Err(e) = sink.flush() {
                if first_error.is_none() {
                    first_error = Some(e);
                }
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::ErrorKind;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MemorySink {
        bytes: Mutex<Vec<u8>>,
    }

    impl MemorySink {
        fn contents(&self) -> Vec<u8> {
            self.bytes.lock().unwrap().clone()
        }
    }

    impl Sink for MemorySink {
        fn write(&self, buf: &[u8]) -> io::Result<usize> {
            self.bytes.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&self) -> io::Result<()> {
            Ok(())
        }
    }

    struct FailingSink;

    impl Sink for FailingSink {
        fn write(&self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(ErrorKind::Other, "disk full"))
        }

        fn flush(&self) -> io::Result<()> {
            Err(io::Error::new(ErrorKind::Other, "disk full"))
        }
    }

    #[test]
    fn test_write_fans_out_identical_bytes() {
        let a = Arc::new(MemorySink::default());
        let b = Arc::new(MemorySink::default());
        let mut set = SinkSet::new();
        set.push(a.clone());
        set.push(b.clone());

        let written = set.write(b"one line\n").unwrap();
        assert_eq!(written, 9);
        assert_eq!(a.contents(), b"one line\n");
        assert_eq!(a.contents(), b.contents());
    }

    #[test]
    fn test_failing_sink_does_not_stop_others() {
        let healthy = Arc::new(MemorySink::default());
        let mut set = SinkSet::new();
        set.push(Arc::new(FailingSink));
        set.push(healthy.clone());

        let result = set.write(b"still delivered\n");
        assert!(result.is_err());
        assert_eq!(healthy.contents(), b"still delivered\n");
    }

    #[test]
    fn test_first_error_wins_on_flush() {
        let mut set = SinkSet::new();
        set.push(Arc::new(FailingSink));
        set.push(Arc::new(MemorySink::default()));
        assert_eq!(set.flush().unwrap_err().to_string(), "disk full");
    }

    #[test]
    fn test_empty_set_write_is_noop_success() {
        let set = SinkSet::new();
        assert_eq!(set.write(b"nowhere\n").unwrap(), 8);
        assert!(set.flush().is_ok());
    }
}
