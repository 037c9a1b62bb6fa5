//! Micronix MSA400 spectrum analyzer backend for msalib.
//!
//! The MSA400 family (MSA438, MSA458, MSA438E) is controlled with ASCII
//! commands over a USB virtual COM port. This crate provides:
//!
//! - **Reply decoders** ([`decode`]) -- unit-suffixed frequencies, levels,
//!   and the `SRSF` sweep dump.
//! - **Settings schema** ([`settings`]) -- the 23 instrument settings with
//!   their query/write commands and value validators.
//! - **Command builders** ([`commands`]) -- every command paired with the
//!   way its reply is collected.
//! - **Session** ([`session`]) -- owns the stream, sends commands, collects
//!   and decodes replies.
//! - **Presets** ([`preset`]) -- serializable snapshot of all settings.
//! - **Builder** ([`builder`]) -- opens a session over a serial port or any
//!   [`ByteStream`](msalib_core::ByteStream).
//!
//! # Example
//!
//! ```
//! use msalib_micronix::{Msa400Builder, Model, Setting};
//! use msalib_test_harness::MockStream;
//!
//! let mut mock = MockStream::new();
//! mock.expect(b"REFDBM\r\n", b"OK\r\n");
//! mock.expect(b"SPAN?\r\n", b"2M\r\n");
//!
//! let mut session = Msa400Builder::new(Model::Msa438)
//!     .build_with_stream(mock)
//!     .unwrap();
//! assert_eq!(session.get(Setting::Span).unwrap(), "2M");
//! ```

pub mod builder;
pub mod commands;
pub mod decode;
pub mod models;
pub mod preset;
pub mod session;
pub mod settings;

pub use builder::Msa400Builder;
pub use commands::Command;
pub use decode::{parse_frequency, parse_level, parse_sweep_reply, reconstruct_frequencies};
pub use models::Model;
pub use preset::Preset;
pub use session::{Session, SessionConfig};
pub use settings::{Setting, SettingDescriptor, Validator, SETTINGS};
