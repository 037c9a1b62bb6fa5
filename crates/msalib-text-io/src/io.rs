//! Reply collectors for CR/LF text-protocol instruments.
//!
//! After a command is written, one of two strategies decides when the reply
//! is complete:
//!
//! - **Terminator mode** keeps reading whatever is available until the
//!   accumulated bytes contain the reply terminator. There is no timeout: an
//!   instrument that never answers blocks the caller forever. Use it only for
//!   short, deterministic replies.
//! - **Idle-timeout mode** keeps reading until no byte has arrived for a
//!   whole idle window. Use it for long multi-line dumps whose end cannot be
//!   recognised from a terminator.
//!
//! # Carry-over
//!
//! Reads take every byte the stream reports as available, so a read can pull
//! in bytes that follow the terminator. Those bytes are kept in the
//! [`ReplyReader`] and handed to the next collection before the stream is
//! touched again. When a read fails mid-reply, the bytes gathered so far
//! are kept the same way. Nothing received is dropped until
//! [`ReplyReader::clear`] is called.

use std::time::{Duration, Instant};

use tracing::trace;

use msalib_core::error::Result;
use msalib_core::stream::ByteStream;

use crate::protocol::{self, Terminator};

/// Default sleep between polls of an idle stream.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(5);

/// How the reply to a command is collected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectMode {
    /// Read until the configured terminator appears.
    Terminator,
    /// Read until the stream has been silent for the given idle window.
    IdleTimeout(Duration),
}

/// Reply collector state for one session.
#[derive(Debug)]
pub struct ReplyReader {
    terminator: Terminator,
    poll_interval: Duration,
    carry: Vec<u8>,
}

impl ReplyReader {
    /// Create a reader that ends terminator-mode replies on `terminator`.
    pub fn new(terminator: Terminator, poll_interval: Duration) -> Self {
        ReplyReader {
            terminator,
            poll_interval,
            carry: Vec::new(),
        }
    }

    /// Bytes received after the last terminator, waiting for the next call.
    pub fn pending(&self) -> &[u8] {
        &self.carry
    }

    /// Drop any carried-over bytes.
    pub fn clear(&mut self) {
        self.carry.clear();
    }

    /// Collect one reply from `stream` using `mode`.
    ///
    /// The returned bytes exclude the terminator (terminator mode) and are
    /// otherwise unmodified.
    pub fn collect<S: ByteStream + ?Sized>(
        &mut self,
        stream: &mut S,
        mode: CollectMode,
    ) -> Result<Vec<u8>> {
        match mode {
            CollectMode::Terminator => self.collect_terminated(stream),
            CollectMode::IdleTimeout(window) => self.collect_idle(stream, window),
        }
    }

    /// Read until the accumulator contains the terminator.
    pub fn collect_terminated<S: ByteStream + ?Sized>(&mut self, stream: &mut S) -> Result<Vec<u8>> {
        let mut acc = std::mem::take(&mut self.carry);
        let needle_len = self.terminator.as_bytes().len();
        // Only the tail can complete a terminator that was split across reads.
        let mut search_from = 0;

        loop {
            if let Some(pos) = protocol::find_terminator(&acc[search_from..], self.terminator) {
                let end = search_from + pos;
                self.carry = acc.split_off(end + needle_len);
                acc.truncate(end);
                if !self.carry.is_empty() {
                    trace!(bytes = self.carry.len(), "Carrying bytes past terminator");
                }
                return Ok(acc);
            }
            search_from = acc.len().saturating_sub(needle_len - 1);

            let chunk = match read_available(stream) {
                Ok(chunk) => chunk,
                Err(e) => {
                    self.keep_partial(acc);
                    return Err(e);
                }
            };
            if chunk.is_empty() {
                std::thread::sleep(self.poll_interval);
                continue;
            }
            trace!(bytes = chunk.len(), data = ?chunk, "Received data");
            acc.extend_from_slice(&chunk);
        }
    }

    /// Read until no byte has arrived for `idle_window`.
    pub fn collect_idle<S: ByteStream + ?Sized>(
        &mut self,
        stream: &mut S,
        idle_window: Duration,
    ) -> Result<Vec<u8>> {
        let mut acc = std::mem::take(&mut self.carry);
        let mut last = Instant::now();

        loop {
            let chunk = match read_available(stream) {
                Ok(chunk) => chunk,
                Err(e) => {
                    self.keep_partial(acc);
                    return Err(e);
                }
            };
            if !chunk.is_empty() {
                trace!(bytes = chunk.len(), data = ?chunk, "Received data");
                acc.extend_from_slice(&chunk);
                last = Instant::now();
                continue;
            }

            let idle = last.elapsed();
            if idle >= idle_window {
                trace!(
                    bytes = acc.len(),
                    idle_ms = idle.as_millis(),
                    "Idle window elapsed"
                );
                return Ok(acc);
            }
            std::thread::sleep(self.poll_interval.min(idle_window - idle));
        }
    }

    /// Put bytes collected before a failed read back in front of the carry.
    fn keep_partial(&mut self, acc: Vec<u8>) {
        if !acc.is_empty() {
            trace!(bytes = acc.len(), "Keeping partial reply after read error");
        }
        self.carry = acc;
    }
}

/// Read every byte the stream currently has; empty when nothing is waiting.
fn read_available<S: ByteStream + ?Sized>(stream: &mut S) -> Result<Vec<u8>> {
    let available = stream.bytes_available()?;
    if available == 0 {
        return Ok(Vec::new());
    }
    stream.read(available)
}

impl Default for ReplyReader {
    fn default() -> Self {
        Self::new(Terminator::default(), DEFAULT_POLL_INTERVAL)
    }
}
