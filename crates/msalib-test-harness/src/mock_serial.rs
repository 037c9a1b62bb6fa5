//! Mock byte stream for deterministic testing of protocol engines.
//!
//! [`MockStream`] implements the [`ByteStream`] trait with pre-loaded
//! request/response pairs. Responses can be split into timed bursts so that
//! idle-timeout collection can be exercised with realistic gaps.
//!
//! `MockStream` is a cheap handle: clones share the same state, so a test
//! can hand one clone to a session and keep another to inspect what was
//! written after the session is closed or dropped.
//!
//! # Example
//!
//! ```
//! use msalib_test_harness::MockStream;
//! use std::time::Duration;
//!
//! let mut mock = MockStream::new();
//! // Pre-load: when the driver sends this request, return this response.
//! mock.expect(b"FREQ?\r\n", b"2.4G\r\n");
//! // Or deliver the response in two bursts, 50 ms apart.
//! mock.expect_bursts(
//!     b"SRSF\r\n",
//!     vec![
//!         (Duration::ZERO, b"CF 1.0G SP 2M".to_vec()),
//!         (Duration::from_millis(50), b" RF -20\r\n".to_vec()),
//!     ],
//! );
//! ```

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use msalib_core::error::{Error, Result};
use msalib_core::stream::ByteStream;

/// A pre-loaded request and its timed response bursts.
#[derive(Debug, Clone)]
struct Expectation {
    /// The exact bytes we expect to be written.
    request: Vec<u8>,
    /// Response bursts; each delay is relative to the previous burst.
    bursts: Vec<(Duration, Vec<u8>)>,
}

#[derive(Debug)]
struct MockState {
    /// Ordered queue of expected request/response pairs.
    expectations: VecDeque<Expectation>,
    /// Bursts not yet released, with their release instant.
    scheduled: VecDeque<(Instant, Vec<u8>)>,
    /// Released bytes waiting to be read.
    rx: VecDeque<u8>,
    /// Whether the stream is "open".
    open: bool,
    /// Log of all bytes written through this stream.
    sent_log: Vec<Vec<u8>>,
    /// Number of `close()` calls that found the stream open.
    closes: usize,
    /// Error kind to raise on the next write, if any.
    fail_next_write: Option<std::io::ErrorKind>,
    /// Reads left to succeed before one fails, and the error kind to raise.
    fail_read: Option<(usize, std::io::ErrorKind)>,
}

impl MockState {
    fn release_due(&mut self) {
        let now = Instant::now();
        while let Some((at, _)) = self.scheduled.front() {
            if *at > now {
                break;
            }
            if let Some((_, data)) = self.scheduled.pop_front() {
                self.rx.extend(data);
            }
        }
    }

    fn schedule(&mut self, bursts: Vec<(Duration, Vec<u8>)>) {
        let now = Instant::now();
        let mut at = self
            .scheduled
            .back()
            .map(|(t, _)| (*t).max(now))
            .unwrap_or(now);
        for (delay, data) in bursts {
            at += delay;
            self.scheduled.push_back((at, data));
        }
    }
}

/// A mock [`ByteStream`] for testing without hardware.
///
/// Expectations are consumed in order. When `write()` is called, the data is
/// recorded and matched against the next expectation; the matching response
/// bursts then become readable at their scheduled times.
///
/// A write that does not match, or arrives with no expectation left, fails
/// with [`Error::Transport`].
#[derive(Debug, Clone)]
pub struct MockStream {
    state: Arc<Mutex<MockState>>,
}

impl MockStream {
    /// Create a new mock stream in the open state.
    pub fn new() -> Self {
        MockStream {
            state: Arc::new(Mutex::new(MockState {
                expectations: VecDeque::new(),
                scheduled: VecDeque::new(),
                rx: VecDeque::new(),
                open: true,
                sent_log: Vec::new(),
                closes: 0,
                fail_next_write: None,
                fail_read: None,
            })),
        }
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        // A panicking test thread must not hide the log from other handles.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Add an expected request with an immediately available response.
    pub fn expect(&mut self, request: &[u8], response: &[u8]) {
        self.expect_bursts(request, vec![(Duration::ZERO, response.to_vec())]);
    }

    /// Add an expected request whose response arrives in timed bursts.
    ///
    /// The first delay is measured from the write, each following delay
    /// from the previous burst.
    pub fn expect_bursts(&mut self, request: &[u8], bursts: Vec<(Duration, Vec<u8>)>) {
        self.state().expectations.push_back(Expectation {
            request: request.to_vec(),
            bursts,
        });
    }

    /// Make bytes readable right away, without any write.
    pub fn queue_rx(&mut self, data: &[u8]) {
        self.state().rx.extend(data.iter().copied());
    }

    /// Make bytes readable `delay` after the previously scheduled burst
    /// (or after now, if nothing is pending).
    pub fn schedule_rx(&mut self, delay: Duration, data: &[u8]) {
        self.state().schedule(vec![(delay, data.to_vec())]);
    }

    /// Fail the next write with a transport error for an I/O error of the
    /// given kind.
    pub fn fail_next_write(&mut self, kind: std::io::ErrorKind) {
        self.state().fail_next_write = Some(kind);
    }

    /// Fail the next read the same way. The bytes it would have returned
    /// stay readable.
    pub fn fail_next_read(&mut self, kind: std::io::ErrorKind) {
        self.fail_read_after(0, kind);
    }

    /// Let `reads` more reads succeed, then fail the one after.
    pub fn fail_read_after(&mut self, reads: usize, kind: std::io::ErrorKind) {
        self.state().fail_read = Some((reads, kind));
    }

    /// All data written through this stream, one element per `write()`.
    pub fn sent_data(&self) -> Vec<Vec<u8>> {
        self.state().sent_log.clone()
    }

    /// All data written through this stream, concatenated.
    pub fn sent_bytes(&self) -> Vec<u8> {
        self.state().sent_log.concat()
    }

    /// Number of expectations that have not yet been consumed.
    pub fn remaining_expectations(&self) -> usize {
        self.state().expectations.len()
    }

    /// How many times the stream was actually closed.
    pub fn close_count(&self) -> usize {
        self.state().closes
    }

    /// Set the open state of the mock stream.
    ///
    /// When set to `false`, subsequent calls return [`Error::NotConnected`].
    pub fn set_open(&mut self, open: bool) {
        self.state().open = open;
    }
}

impl Default for MockStream {
    fn default() -> Self {
        Self::new()
    }
}

impl ByteStream for MockStream {
    fn write(&mut self, data: &[u8]) -> Result<()> {
        let mut state = self.state();
        if !state.open {
            return Err(Error::NotConnected);
        }
        if let Some(kind) = state.fail_next_write.take() {
            return Err(Error::Transport(format!("mock write failure: {kind}")));
        }

        // Record what was sent.
        state.sent_log.push(data.to_vec());

        // Match against the next expectation.
        match state.expectations.pop_front() {
            Some(expectation) if data == expectation.request.as_slice() => {
                state.schedule(expectation.bursts);
                Ok(())
            }
            Some(expectation) => Err(Error::Transport(format!(
                "unexpected write: expected {:?}, got {:?}",
                String::from_utf8_lossy(&expectation.request),
                String::from_utf8_lossy(data)
            ))),
            None => Err(Error::Transport(
                "no more expectations in mock stream".into(),
            )),
        }
    }

    fn bytes_available(&mut self) -> Result<usize> {
        let mut state = self.state();
        if !state.open {
            return Err(Error::NotConnected);
        }
        state.release_due();
        Ok(state.rx.len())
    }

    fn read(&mut self, count: usize) -> Result<Vec<u8>> {
        let mut state = self.state();
        if !state.open {
            return Err(Error::NotConnected);
        }
        match state.fail_read.take() {
            Some((0, kind)) => {
                return Err(Error::Transport(format!("mock read failure: {kind}")));
            }
            Some((reads, kind)) => state.fail_read = Some((reads - 1, kind)),
            None => {}
        }
        state.release_due();
        let n = count.min(state.rx.len());
        Ok(state.rx.drain(..n).collect())
    }

    fn flush(&mut self) -> Result<()> {
        if !self.state().open {
            return Err(Error::NotConnected);
        }
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        let mut state = self.state();
        if state.open {
            state.open = false;
            state.closes += 1;
        }
        state.scheduled.clear();
        state.rx.clear();
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.state().open
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_stream_basic_write_read() {
        let mut mock = MockStream::new();
        mock.expect(b"FREQ?\r\n", b"2.4G\r\n");

        mock.write(b"FREQ?\r\n").unwrap();
        assert_eq!(mock.bytes_available().unwrap(), 6);
        assert_eq!(mock.read(64).unwrap(), b"2.4G\r\n");
        assert_eq!(mock.bytes_available().unwrap(), 0);
    }

    #[test]
    fn mock_stream_tracks_sent_data() {
        let mut mock = MockStream::new();
        mock.expect(b"HOLD\r\n", b"\r\n");
        mock.expect(b"RUN\r\n", b"\r\n");

        mock.write(b"HOLD\r\n").unwrap();
        mock.write(b"RUN\r\n").unwrap();

        assert_eq!(mock.sent_data().len(), 2);
        assert_eq!(mock.sent_data()[0], b"HOLD\r\n");
        assert_eq!(mock.sent_bytes(), b"HOLD\r\nRUN\r\n");
    }

    #[test]
    fn mock_stream_wrong_data_errors() {
        let mut mock = MockStream::new();
        mock.expect(b"FREQ?\r\n", b"1G\r\n");

        let result = mock.write(b"SPAN?\r\n");
        assert!(matches!(result, Err(Error::Transport(_))));
    }

    #[test]
    fn mock_stream_no_expectations_errors() {
        let mut mock = MockStream::new();
        let result = mock.write(b"RUN\r\n");
        assert!(matches!(result, Err(Error::Transport(_))));
    }

    #[test]
    fn mock_stream_bursts_release_over_time() {
        let mut mock = MockStream::new();
        mock.expect_bursts(
            b"SRSF\r\n",
            vec![
                (Duration::ZERO, b"AB".to_vec()),
                (Duration::from_millis(40), b"CD".to_vec()),
            ],
        );

        mock.write(b"SRSF\r\n").unwrap();
        assert_eq!(mock.read(16).unwrap(), b"AB");
        assert_eq!(mock.bytes_available().unwrap(), 0);

        std::thread::sleep(Duration::from_millis(60));
        assert_eq!(mock.read(16).unwrap(), b"CD");
    }

    #[test]
    fn mock_stream_partial_read() {
        let mut mock = MockStream::new();
        mock.queue_rx(&[0xAA, 0xBB, 0xCC, 0xDD]);

        assert_eq!(mock.read(2).unwrap(), vec![0xAA, 0xBB]);
        assert_eq!(mock.read(2).unwrap(), vec![0xCC, 0xDD]);
    }

    #[test]
    fn mock_stream_close_is_idempotent() {
        let mut mock = MockStream::new();
        assert!(mock.is_open());

        mock.close().unwrap();
        mock.close().unwrap();
        assert!(!mock.is_open());
        assert_eq!(mock.close_count(), 1);

        assert!(matches!(mock.write(b"RUN\r\n"), Err(Error::NotConnected)));
        assert!(matches!(mock.bytes_available(), Err(Error::NotConnected)));
    }

    #[test]
    fn mock_stream_clones_share_state() {
        let mut mock = MockStream::new();
        let observer = mock.clone();
        mock.expect(b"AUTO\r\n", b"\r\n");

        mock.write(b"AUTO\r\n").unwrap();
        assert_eq!(observer.sent_data(), vec![b"AUTO\r\n".to_vec()]);
        assert_eq!(observer.remaining_expectations(), 0);
    }

    #[test]
    fn mock_stream_injected_write_failure() {
        let mut mock = MockStream::new();
        mock.expect(b"RUN\r\n", b"\r\n");
        mock.fail_next_write(std::io::ErrorKind::BrokenPipe);

        assert!(matches!(mock.write(b"RUN\r\n"), Err(Error::Transport(_))));
        assert!(mock.sent_data().is_empty());
        // The expectation is still there for a later attempt.
        assert_eq!(mock.remaining_expectations(), 1);
    }

    #[test]
    fn mock_stream_injected_read_failure_keeps_data() {
        let mut mock = MockStream::new();
        mock.queue_rx(b"ABCD");
        mock.fail_read_after(1, std::io::ErrorKind::TimedOut);

        assert_eq!(mock.read(2).unwrap(), b"AB");
        assert!(matches!(mock.read(2), Err(Error::Transport(_))));
        assert_eq!(mock.bytes_available().unwrap(), 2);
        assert_eq!(mock.read(2).unwrap(), b"CD");
    }
}
