//! Stream implementations for msalib.
//!
//! This crate provides concrete implementations of the
//! [`ByteStream`](msalib_core::ByteStream) trait from `msalib-core`:
//!
//! - [`SerialStream`]: USB virtual COM ports and RS-232 serial connections
//!
//! Line settings are applied here, once, when the port is opened. The
//! protocol layer never changes them.
//!
//! # Example
//!
//! ```no_run
//! use msalib_transport::{SerialConfig, SerialStream};
//!
//! # fn example() -> msalib_core::Result<()> {
//! let stream = SerialStream::open_with_config("COM1", SerialConfig::default())?;
//! # Ok(())
//! # }
//! ```

pub mod serial;

pub use serial::{DataBits, FlowControl, Parity, SerialConfig, SerialStream, StopBits};
