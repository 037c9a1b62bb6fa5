//! MSA400 command builders.
//!
//! Every exchange with the instrument is a [`Command`]: the ASCII command
//! text (without its CR LF) and the strategy used to decide when the reply
//! is complete. The builders here are pure; the session does the I/O.
//!
//! Short replies (settings, actions) end with a terminator. The measurement
//! result and the sweep dump are multi-line and are collected until the
//! instrument goes quiet.

use std::time::Duration;

use msalib_core::Result;
use msalib_text_io::CollectMode;

use crate::settings::Setting;

/// Switches the level unit to dBm. Sent when a session is opened.
pub const CMD_LEVEL_UNIT_DBM: &str = "REFDBM";
/// Freezes the trace.
pub const CMD_HOLD: &str = "HOLD";
/// Resumes sweeping.
pub const CMD_RUN: &str = "RUN";
/// Moves the center frequency to the marker.
pub const CMD_FREQ_SET_MARKER: &str = "FREQSETMK";
/// Automatic tuning to the strongest signal.
pub const CMD_AUTO: &str = "AUTO";
/// Resets the marker.
pub const CMD_MARKER_RESET: &str = "MKRRES";
/// Reads the result of the active measurement.
pub const CMD_MEASUREMENT_RESULT: &str = "MEASRES";
/// Dumps the sweep parameters and trace.
pub const CMD_SWEEP_DUMP: &str = "SRSF";

/// Idle window for the measurement result.
pub const MEASUREMENT_IDLE_WINDOW: Duration = Duration::from_millis(300);
/// Idle window for the sweep dump.
pub const SWEEP_IDLE_WINDOW: Duration = Duration::from_secs(1);

/// A command and how its reply is collected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub text: String,
    pub mode: CollectMode,
}

impl Command {
    /// A command whose reply ends with the session terminator.
    pub fn terminated(text: impl Into<String>) -> Self {
        Command {
            text: text.into(),
            mode: CollectMode::Terminator,
        }
    }

    /// A command whose reply ends after `window` of silence.
    pub fn idle(text: impl Into<String>, window: Duration) -> Self {
        Command {
            text: text.into(),
            mode: CollectMode::IdleTimeout(window),
        }
    }
}

/// Read the current value of `setting`.
pub fn cmd_query(setting: Setting) -> Command {
    Command::terminated(setting.descriptor().query)
}

/// Write `value` to `setting`.
///
/// Returns the commands to send, in order. The value is validated first; on
/// rejection no command is produced.
pub fn cmd_write(setting: Setting, value: &str) -> Result<Vec<Command>> {
    let descriptor = setting.descriptor();
    let write = descriptor.write_command(value)?;
    let mut commands = Vec::with_capacity(2);
    if let Some(pre) = descriptor.pre_write {
        commands.push(Command::terminated(pre));
    }
    commands.push(Command::terminated(write));
    Ok(commands)
}

pub fn cmd_level_unit_dbm() -> Command {
    Command::terminated(CMD_LEVEL_UNIT_DBM)
}

pub fn cmd_hold() -> Command {
    Command::terminated(CMD_HOLD)
}

pub fn cmd_run() -> Command {
    Command::terminated(CMD_RUN)
}

pub fn cmd_freq_set_marker() -> Command {
    Command::terminated(CMD_FREQ_SET_MARKER)
}

pub fn cmd_auto() -> Command {
    Command::terminated(CMD_AUTO)
}

pub fn cmd_marker_reset() -> Command {
    Command::terminated(CMD_MARKER_RESET)
}

/// Read the active measurement's result (idle-timeout, 300 ms).
pub fn cmd_measurement_result() -> Command {
    Command::idle(CMD_MEASUREMENT_RESULT, MEASUREMENT_IDLE_WINDOW)
}

/// Dump the sweep header and trace (idle-timeout, 1 s).
pub fn cmd_sweep_dump() -> Command {
    Command::idle(CMD_SWEEP_DUMP, SWEEP_IDLE_WINDOW)
}
