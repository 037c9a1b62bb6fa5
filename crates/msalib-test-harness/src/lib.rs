//! msalib-test-harness: Test utilities and mock streams for msalib.
//!
//! This crate provides [`MockStream`] for deterministic unit testing of the
//! reply collectors and the session dispatcher without requiring a real
//! analyzer on a serial port.

pub mod mock_serial;

pub use mock_serial::MockStream;
