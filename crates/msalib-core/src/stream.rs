//! Byte stream trait for instrument communication.
//!
//! The [`ByteStream`] trait abstracts over the physical link to an analyzer.
//! It deliberately mirrors what a serial port offers: write, ask how many
//! bytes are waiting, read exactly that many, flush, and close. Line settings
//! (baud rate, parity, stop bits) are configured once by whoever opens the
//! stream, never by the protocol layer.
//!
//! Reply collectors in `msalib-text-io` operate on a `ByteStream` rather than
//! directly on a serial port, enabling both real hardware control and
//! deterministic unit testing with `MockStream` from `msalib-test-harness`.

use crate::error::Result;

/// Blocking byte-level stream to an instrument.
pub trait ByteStream: Send {
    /// Write all of `data` to the instrument.
    fn write(&mut self, data: &[u8]) -> Result<()>;

    /// Number of received bytes that can be read without blocking.
    fn bytes_available(&mut self) -> Result<usize>;

    /// Read up to `count` bytes that are already available.
    ///
    /// Returns fewer than `count` bytes only if fewer are available.
    fn read(&mut self, count: usize) -> Result<Vec<u8>>;

    /// Block until every written byte has been handed to the hardware.
    fn flush(&mut self) -> Result<()>;

    /// Close the stream.
    ///
    /// Closing an already-closed stream is a no-op. After `close()`, the
    /// other methods return [`Error::NotConnected`](crate::error::Error::NotConnected).
    fn close(&mut self) -> Result<()>;

    /// Check whether the stream is currently open.
    fn is_open(&self) -> bool;
}

impl<S: ByteStream + ?Sized> ByteStream for Box<S> {
    fn write(&mut self, data: &[u8]) -> Result<()> {
        (**self).write(data)
    }

    fn bytes_available(&mut self) -> Result<usize> {
        (**self).bytes_available()
    }

    fn read(&mut self, count: usize) -> Result<Vec<u8>> {
        (**self).read(count)
    }

    fn flush(&mut self) -> Result<()> {
        (**self).flush()
    }

    fn close(&mut self) -> Result<()> {
        (**self).close()
    }

    fn is_open(&self) -> bool {
        (**self).is_open()
    }
}
