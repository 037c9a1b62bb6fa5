//! Shared wire framing for CR/LF-terminated ASCII instruments.
//!
//! Every command goes out as `<ASCII text>` followed by CR (0x0D) and LF
//! (0x0A). Replies come back as ASCII text ending in CR LF, except on the
//! single-terminator firmware variant which ends replies with a bare LF.
//! This module owns that framing; it performs no I/O.

use bytes::{BufMut, BytesMut};

/// Carriage return.
pub const CR: u8 = 0x0D;

/// Line feed.
pub const LF: u8 = 0x0A;

/// Line ending appended to every outgoing command.
pub const COMMAND_TERMINATOR: &[u8] = &[CR, LF];

/// Byte sequence marking the end of a terminator-mode reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Terminator {
    /// CR followed by LF (MSA400 series default).
    #[default]
    CrLf,
    /// Bare LF.
    Lf,
}

impl Terminator {
    /// The terminator as raw bytes.
    pub fn as_bytes(self) -> &'static [u8] {
        match self {
            Terminator::CrLf => &[CR, LF],
            Terminator::Lf => &[LF],
        }
    }
}

/// Frame a command for transmission: the ASCII text plus CR LF.
///
/// # Example
///
/// ```
/// use msalib_text_io::protocol::encode_command;
///
/// assert_eq!(encode_command("FREQ?"), b"FREQ?\r\n");
/// assert_eq!(encode_command("SPAN1M"), b"SPAN1M\r\n");
/// ```
pub fn encode_command(command: &str) -> Vec<u8> {
    let mut buf = BytesMut::with_capacity(command.len() + COMMAND_TERMINATOR.len());
    buf.put_slice(command.as_bytes());
    buf.put_slice(COMMAND_TERMINATOR);
    buf.to_vec()
}

/// Position of the first occurrence of `terminator` in `buf`, if any.
pub fn find_terminator(buf: &[u8], terminator: Terminator) -> Option<usize> {
    let needle = terminator.as_bytes();
    if buf.len() < needle.len() {
        return None;
    }
    buf.windows(needle.len()).position(|w| w == needle)
}

/// Turn collected reply bytes into text with surrounding whitespace removed.
///
/// Non-ASCII bytes (line noise) are replaced rather than rejected so that a
/// single glitch does not lose an otherwise usable reply.
pub fn strip_reply(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw).trim().to_string()
}
