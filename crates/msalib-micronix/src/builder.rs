//! Msa400Builder -- fluent builder for opening a [`Session`].
//!
//! Separates configuration from construction so that callers can pick the
//! serial port, line speed and reply framing before the stream is opened.
//!
//! # Example
//!
//! ```no_run
//! use msalib_micronix::{Model, Msa400Builder};
//!
//! # fn example() -> msalib_core::Result<()> {
//! let mut session = Msa400Builder::new(Model::Msa438)
//!     .serial_port("/dev/ttyUSB0")
//!     .build()?;
//! let span = session.span_hz()?;
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use tracing::warn;

use msalib_core::error::{Error, Result};
use msalib_core::stream::ByteStream;
use msalib_text_io::protocol::Terminator;
use msalib_transport::{SerialConfig, SerialStream};

use crate::models::Model;
use crate::session::{Session, SessionConfig};

/// Fluent builder for [`Session`].
pub struct Msa400Builder {
    serial_port: Option<String>,
    baud_rate: Option<u32>,
    config: SessionConfig,
}

impl Msa400Builder {
    pub fn new(model: Model) -> Self {
        Msa400Builder {
            serial_port: None,
            baud_rate: None,
            config: SessionConfig {
                model,
                ..SessionConfig::default()
            },
        }
    }

    /// Set the serial port path (e.g. `/dev/ttyUSB0` or `COM3`).
    pub fn serial_port(mut self, port: &str) -> Self {
        self.serial_port = Some(port.to_string());
        self
    }

    /// Override the model's default baud rate.
    pub fn baud_rate(mut self, baud: u32) -> Self {
        self.baud_rate = Some(baud);
        self
    }

    /// Reply terminator (default: CR LF).
    pub fn terminator(mut self, terminator: Terminator) -> Self {
        self.config.terminator = terminator;
        self
    }

    /// Sleep between polls while waiting for a reply (default: 5ms).
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.config.poll_interval = interval;
        self
    }

    /// Command sent when the session opens (default: `REFDBM`).
    pub fn init_command(mut self, command: &str) -> Self {
        self.config.init_command = Some(command.to_string());
        self
    }

    /// Open the session without sending an init command.
    pub fn no_init(mut self) -> Self {
        self.config.init_command = None;
        self
    }

    fn validate(&self) -> Result<()> {
        if self.config.poll_interval.is_zero() {
            return Err(Error::InvalidParameter(
                "poll_interval must be non-zero".into(),
            ));
        }
        Ok(())
    }

    /// The session configuration this builder will produce.
    pub fn session_config(&self) -> &SessionConfig {
        &self.config
    }

    /// Open a [`Session`] over a caller-provided stream.
    ///
    /// This is the entry point for tests (pass a `MockStream` from
    /// `msalib-test-harness`) and for callers that manage the stream
    /// themselves.
    ///
    /// The stream is closed before any error is returned.
    pub fn build_with_stream<S: ByteStream>(self, mut stream: S) -> Result<Session<S>> {
        if let Err(e) = self.validate() {
            if let Err(close_err) = stream.close() {
                warn!(error = %close_err, "Error closing rejected stream");
            }
            return Err(e);
        }
        let mut session = Session::new(self.config);
        session.open(stream)?;
        Ok(session)
    }

    /// Open a [`Session`] over a serial port.
    ///
    /// Requires that [`serial_port()`](Self::serial_port) has been called.
    /// The baud rate defaults to the model's default if not overridden.
    pub fn build(self) -> Result<Session<SerialStream>> {
        let port = self
            .serial_port
            .as_ref()
            .ok_or_else(|| Error::InvalidParameter("serial_port is required for build()".into()))?;
        self.validate()?;
        let serial = SerialConfig {
            baud_rate: self
                .baud_rate
                .unwrap_or(self.config.model.default_baud_rate()),
            ..SerialConfig::default()
        };

        let stream = SerialStream::open_with_config(port, serial)?;
        self.build_with_stream(stream)
    }
}
