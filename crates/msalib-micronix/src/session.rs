//! Session -- the command dispatcher for an MSA400 instrument.
//!
//! A [`Session`] owns the byte stream to one instrument. Each call frames
//! one command with CR LF, writes it once, and collects the reply with the
//! strategy the command asks for (see [`msalib_text_io::io`]). Nothing is
//! retried; every error goes straight back to the caller.
//!
//! Methods take `&mut self`, so at most one command is ever in flight. The
//! stream is closed by [`Session::close`] or when the session is dropped.

use std::time::Duration;

use tracing::{debug, info, warn};

use msalib_core::error::{Error, Result};
use msalib_core::stream::ByteStream;
use msalib_core::types::SpectrumRecord;
use msalib_text_io::io::{CollectMode, DEFAULT_POLL_INTERVAL, ReplyReader};
use msalib_text_io::protocol::{self, Terminator};

use crate::commands::{self, Command};
use crate::decode;
use crate::models::Model;
use crate::settings::Setting;

/// Session settings that are fixed for the lifetime of a [`Session`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub model: Model,
    /// Sequence that ends terminator-mode replies.
    pub terminator: Terminator,
    /// Sleep between polls while waiting for reply bytes.
    pub poll_interval: Duration,
    /// Command sent right after the stream is installed, if any.
    pub init_command: Option<String>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            model: Model::default(),
            terminator: Terminator::CrLf,
            poll_interval: DEFAULT_POLL_INTERVAL,
            init_command: Some(commands::cmd_level_unit_dbm().text),
        }
    }
}

/// A control session with one MSA400 instrument.
pub struct Session<S: ByteStream = Box<dyn ByteStream>> {
    stream: Option<S>,
    reader: ReplyReader,
    config: SessionConfig,
}

impl<S: ByteStream> Session<S> {
    /// Create a closed session.
    pub fn new(config: SessionConfig) -> Self {
        Session {
            stream: None,
            reader: ReplyReader::new(config.terminator, config.poll_interval),
            config,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Whether a stream is installed and open.
    pub fn is_open(&self) -> bool {
        self.stream.as_ref().is_some_and(|s| s.is_open())
    }

    /// The installed stream, if any.
    pub fn stream(&self) -> Option<&S> {
        self.stream.as_ref()
    }

    /// Install `stream` and send the init command.
    ///
    /// Any previously installed stream is closed first. If the init command
    /// fails, the new stream is closed and the session is left closed.
    pub fn open(&mut self, stream: S) -> Result<()> {
        self.close();

        if !stream.is_open() {
            return Err(Error::NotConnected);
        }
        self.stream = Some(stream);
        info!(model = %self.config.model, "Session opened");

        if let Some(init) = self.config.init_command.clone() {
            if let Err(e) = self.send(&init, CollectMode::Terminator) {
                warn!(command = %init, error = %e, "Init command failed; closing stream");
                self.close();
                return Err(e);
            }
        }
        Ok(())
    }

    /// Close the stream. Safe to call repeatedly or on a never-opened
    /// session; close errors are logged, not returned.
    pub fn close(&mut self) {
        self.reader.clear();
        let Some(mut stream) = self.stream.take() else {
            return;
        };
        if let Err(e) = stream.close() {
            warn!(error = %e, "Error closing stream");
        }
        info!("Session closed");
    }

    /// Send `command` and collect its reply with `mode`.
    ///
    /// The returned text has trailing whitespace and the terminator removed.
    pub fn send(&mut self, command: &str, mode: CollectMode) -> Result<String> {
        let stream = match self.stream.as_mut() {
            Some(s) if s.is_open() => s,
            _ => return Err(Error::NotConnected),
        };

        debug!(command, ?mode, "Sending command");
        stream.write(&protocol::encode_command(command))?;
        stream.flush()?;

        let raw = self.reader.collect(stream, mode)?;
        let reply = protocol::strip_reply(&raw);
        debug!(command, reply = %reply, "Received reply");
        Ok(reply)
    }

    pub(crate) fn execute(&mut self, command: &Command) -> Result<String> {
        self.send(&command.text, command.mode)
    }

    /// Read the current value of `setting`.
    pub fn get(&mut self, setting: Setting) -> Result<String> {
        debug!(%setting, "reading setting");
        self.execute(&commands::cmd_query(setting))
    }

    /// Validate `value` and write it to `setting`.
    ///
    /// A rejected value fails with [`Error::Validation`] before anything is
    /// written.
    pub fn set(&mut self, setting: Setting, value: &str) -> Result<()> {
        let cmds = commands::cmd_write(setting, value)?;
        debug!(%setting, value, "setting");
        for cmd in &cmds {
            self.execute(cmd)?;
        }
        Ok(())
    }

    /// [`get`](Self::get) with the setting looked up by name.
    pub fn get_by_name(&mut self, name: &str) -> Result<String> {
        self.get(name.parse()?)
    }

    /// [`set`](Self::set) with the setting looked up by name.
    pub fn set_by_name(&mut self, name: &str, value: &str) -> Result<()> {
        self.set(name.parse()?, value)
    }

    pub fn hold(&mut self) -> Result<()> {
        self.execute(&commands::cmd_hold()).map(drop)
    }

    pub fn run(&mut self) -> Result<()> {
        self.execute(&commands::cmd_run()).map(drop)
    }

    /// Move the center frequency to the marker.
    pub fn freq_set_marker(&mut self) -> Result<()> {
        self.execute(&commands::cmd_freq_set_marker()).map(drop)
    }

    /// Tune automatically to the strongest signal.
    pub fn auto_tune(&mut self) -> Result<()> {
        self.execute(&commands::cmd_auto()).map(drop)
    }

    pub fn marker_reset(&mut self) -> Result<()> {
        self.execute(&commands::cmd_marker_reset()).map(drop)
    }

    /// Raw result text of the active measurement.
    pub fn measurement_result(&mut self) -> Result<String> {
        self.execute(&commands::cmd_measurement_result())
    }

    /// Read one sweep: parameters and trace, optionally with the frequency
    /// of every bin.
    pub fn sweep(&mut self, with_frequencies: bool) -> Result<SpectrumRecord> {
        let reply = self.execute(&commands::cmd_sweep_dump())?;
        let record = decode::parse_sweep_reply(&reply, with_frequencies)?;
        debug!(
            center_hz = record.center_freq_hz,
            span_hz = record.span_hz,
            samples = record.len(),
            "sweep decoded"
        );
        Ok(record)
    }

    /// Center frequency in Hz.
    pub fn center_frequency_hz(&mut self) -> Result<u64> {
        let reply = self.get(Setting::Freq)?;
        decode::parse_frequency(&reply)
    }

    /// Span in Hz.
    pub fn span_hz(&mut self) -> Result<u64> {
        let reply = self.get(Setting::Span)?;
        decode::parse_frequency(&reply)
    }

    /// Reference level in dBm.
    pub fn ref_level_dbm(&mut self) -> Result<f64> {
        let reply = self.get(Setting::Ref)?;
        decode::parse_level(&reply)
    }
}

impl<S: ByteStream> Drop for Session<S> {
    fn drop(&mut self) {
        self.close();
    }
}
