use std::io::{self, Write};

use super::Sink;

/// Unbuffered sink over the process's standard output handle.
///
/// The stdout lock serializes concurrent writers; no other state is owned.
#[derive(Debug, Default)]
pub struct ConsoleSink;

impl ConsoleSink {
    pub fn new() -> Self {
        ConsoleSink
    }
}

impl Sink for ConsoleSink {
    fn write(&self, buf: &[u8]) -> io::Result<usize> {
        let mut out = io::stdout().lock();
        out.write_all(buf)?;
        out.flush()?;
        Ok(buf.len())
    }

    fn flush(&self) -> io::Result<()> {
        io::stdout().lock().flush()
    }
}
