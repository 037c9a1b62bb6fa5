//! Serial port stream for analyzer communication.
//!
//! This module provides [`SerialStream`], which implements the
//! [`ByteStream`] trait over a blocking [`serialport`] handle. The MSA400
//! series talks over an RS-232 (or USB virtual COM) port at a fixed
//! 9600 baud, 8 data bits, no parity, 1 stop bit.
//!
//! # Example
//!
//! ```no_run
//! use msalib_transport::SerialStream;
//! use msalib_core::ByteStream;
//!
//! # fn example() -> msalib_core::Result<()> {
//! let mut stream = SerialStream::open("/dev/ttyUSB0", 9600)?;
//! stream.write(b"FREQ?\r\n")?;
//! # Ok(())
//! # }
//! ```

use std::io::{Read, Write};
use std::time::Duration;

use msalib_core::error::{Error, Result};
use msalib_core::stream::ByteStream;

/// Serial port configuration.
///
/// Defaults match the MSA400 series:
/// - 9600 baud
/// - 8 data bits
/// - 1 stop bit
/// - No parity
/// - No flow control
#[derive(Debug, Clone)]
pub struct SerialConfig {
    /// Baud rate
    pub baud_rate: u32,
    /// Number of data bits
    pub data_bits: DataBits,
    /// Number of stop bits
    pub stop_bits: StopBits,
    /// Parity checking
    pub parity: Parity,
    /// Flow control
    pub flow_control: FlowControl,
    /// Upper bound for a single blocking read of already-available bytes.
    pub read_timeout: Duration,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            baud_rate: 9600,
            data_bits: DataBits::Eight,
            stop_bits: StopBits::One,
            parity: Parity::None,
            flow_control: FlowControl::None,
            read_timeout: Duration::from_millis(100),
        }
    }
}

/// Number of data bits per character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataBits {
    Seven,
    Eight,
}

impl From<DataBits> for serialport::DataBits {
    fn from(bits: DataBits) -> Self {
        match bits {
            DataBits::Seven => serialport::DataBits::Seven,
            DataBits::Eight => serialport::DataBits::Eight,
        }
    }
}

/// Number of stop bits per character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopBits {
    One,
    Two,
}

impl From<StopBits> for serialport::StopBits {
    fn from(bits: StopBits) -> Self {
        match bits {
            StopBits::One => serialport::StopBits::One,
            StopBits::Two => serialport::StopBits::Two,
        }
    }
}

/// Parity checking mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parity {
    None,
    Odd,
    Even,
}

impl From<Parity> for serialport::Parity {
    fn from(parity: Parity) -> Self {
        match parity {
            Parity::None => serialport::Parity::None,
            Parity::Odd => serialport::Parity::Odd,
            Parity::Even => serialport::Parity::Even,
        }
    }
}

/// Flow control mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowControl {
    None,
    Software,
    Hardware,
}

impl From<FlowControl> for serialport::FlowControl {
    fn from(flow: FlowControl) -> Self {
        match flow {
            FlowControl::None => serialport::FlowControl::None,
            FlowControl::Software => serialport::FlowControl::Software,
            FlowControl::Hardware => serialport::FlowControl::Hardware,
        }
    }
}

/// Every I/O failure on an open port is a transport failure.
fn io_error(port_name: &str, op: &str, e: std::io::Error) -> Error {
    tracing::error!(port = %port_name, error = %e, "Failed to {op}");
    match e.kind() {
        std::io::ErrorKind::BrokenPipe | std::io::ErrorKind::NotConnected => {
            Error::Transport(format!("{port_name}: connection lost during {op}: {e}"))
        }
        _ => Error::Transport(format!("{port_name}: failed to {op}: {e}")),
    }
}

/// Blocking serial port stream to an analyzer.
pub struct SerialStream {
    /// The underlying serial port; `None` once closed.
    port: Option<Box<dyn serialport::SerialPort>>,
    /// Port name for logging/debugging
    port_name: String,
}

impl SerialStream {
    /// Open a serial port with the given baud rate and default settings.
    ///
    /// # Arguments
    ///
    /// * `port` - Serial port path (e.g., "/dev/ttyUSB0" on Linux, "COM1" on Windows)
    /// * `baud_rate` - Baud rate (9600 for the MSA400 series)
    pub fn open(port: &str, baud_rate: u32) -> Result<Self> {
        let config = SerialConfig {
            baud_rate,
            ..Default::default()
        };
        Self::open_with_config(port, config)
    }

    /// Open a serial port with full configuration control.
    pub fn open_with_config(port: &str, config: SerialConfig) -> Result<Self> {
        tracing::debug!(
            port = %port,
            baud_rate = config.baud_rate,
            data_bits = ?config.data_bits,
            stop_bits = ?config.stop_bits,
            parity = ?config.parity,
            flow_control = ?config.flow_control,
            "Opening serial port"
        );

        let serial = serialport::new(port, config.baud_rate)
            .data_bits(config.data_bits.into())
            .stop_bits(config.stop_bits.into())
            .parity(config.parity.into())
            .flow_control(config.flow_control.into())
            .timeout(config.read_timeout)
            .open()
            .map_err(|e| {
                tracing::error!(port = %port, error = %e, "Failed to open serial port");
                Error::Transport(format!("Failed to open serial port {}: {}", port, e))
            })?;

        // Drop anything left over from a previous session so the first reply
        // is not prefixed with stale bytes.
        if let Err(e) = serial.clear(serialport::ClearBuffer::All) {
            tracing::warn!(port = %port, error = %e, "Failed to clear serial buffers");
        }

        tracing::info!(port = %port, baud_rate = config.baud_rate, "Serial port opened successfully");

        Ok(Self {
            port: Some(serial),
            port_name: port.to_string(),
        })
    }

    /// Get the name of the serial port.
    pub fn port_name(&self) -> &str {
        &self.port_name
    }
}

impl ByteStream for SerialStream {
    fn write(&mut self, data: &[u8]) -> Result<()> {
        let port = self.port.as_mut().ok_or(Error::NotConnected)?;

        tracing::trace!(
            port = %self.port_name,
            bytes = data.len(),
            data = ?data,
            "Sending data"
        );

        port.write_all(data)
            .map_err(|e| io_error(&self.port_name, "send data", e))
    }

    fn bytes_available(&mut self) -> Result<usize> {
        let port = self.port.as_mut().ok_or(Error::NotConnected)?;
        let n = port.bytes_to_read().map_err(|e| {
            tracing::error!(port = %self.port_name, error = %e, "Failed to query input queue");
            Error::Transport(format!("{}: {}", self.port_name, e))
        })?;
        Ok(n as usize)
    }

    fn read(&mut self, count: usize) -> Result<Vec<u8>> {
        let port = self.port.as_mut().ok_or(Error::NotConnected)?;
        let mut buf = vec![0u8; count];
        let mut filled = 0;

        while filled < count {
            match port.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == std::io::ErrorKind::TimedOut => break,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(io_error(&self.port_name, "receive data", e)),
            }
        }
        buf.truncate(filled);

        tracing::trace!(
            port = %self.port_name,
            bytes = filled,
            data = ?buf,
            "Received data"
        );
        Ok(buf)
    }

    fn flush(&mut self) -> Result<()> {
        let port = self.port.as_mut().ok_or(Error::NotConnected)?;
        port.flush()
            .map_err(|e| io_error(&self.port_name, "flush serial port", e))
    }

    fn close(&mut self) -> Result<()> {
        if let Some(mut port) = self.port.take() {
            tracing::debug!(port = %self.port_name, "Closing serial port");

            if let Err(e) = port.flush() {
                tracing::warn!(
                    port = %self.port_name,
                    error = %e,
                    "Failed to flush before closing (continuing anyway)"
                );
            }

            // Dropping the handle closes the port.
            tracing::info!(port = %self.port_name, "Serial port closed");
        }

        Ok(())
    }

    fn is_open(&self) -> bool {
        self.port.is_some()
    }
}

impl Drop for SerialStream {
    fn drop(&mut self) {
        if self.port.is_some() {
            tracing::debug!(port = %self.port_name, "SerialStream dropped, closing port");
        }
    }
}
