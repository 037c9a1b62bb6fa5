//! Shared CR/LF text-protocol framing and reply collection for msalib.
//!
//! The Micronix MSA400 series speaks plain ASCII: a command is its text
//! followed by CR LF, and a reply is either one terminated line or an
//! unterminated multi-line dump whose end is only recognisable by silence.
//!
//! - [`protocol`] -- command framing, terminator search, reply stripping.
//! - [`io`] -- the terminator-mode and idle-timeout reply collectors.

pub mod io;
pub mod protocol;

pub use io::{CollectMode, ReplyReader};
pub use protocol::{Terminator, encode_command};
