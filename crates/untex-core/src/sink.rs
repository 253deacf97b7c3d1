//! Output sink bookkeeping

use std::io::{self, Write};

/// Writer wrapper that counts bytes and the newlines the output ends with
#[derive(Debug)]
pub struct Sink<W> {
    inner: W,
    written: u64,
    trailing_newlines: usize,
}

impl<W: Write> Sink<W> {
    /// Wrap `inner`
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            written: 0,
            trailing_newlines: 0,
        }
    }

    /// Total bytes accepted by the inner writer
    pub fn bytes_written(&self) -> u64 {
        self.written
    }

    /// Number of consecutive `\n` at the end of the output
    pub fn trailing_newlines(&self) -> usize {
        self.trailing_newlines
    }

    /// Whether the output is empty or ends with a newline
    pub fn at_line_start(&self) -> bool {
        self.written == 0 || self.trailing_newlines > 0
    }
}

impl<W: Write> Write for Sink<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        let accepted = &buf[..n];
        match accepted.iter().rposition(|b| *b != b'\n') {
            Some(pos) => self.trailing_newlines = n - pos - 1,
            None => self.trailing_newlines += n,
        }
        self.written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
