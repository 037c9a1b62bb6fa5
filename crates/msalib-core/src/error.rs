//! Error types for msalib.
//!
//! All fallible operations across the library return [`Result<T>`], which
//! uses [`Error`] as the error type. Transport-layer, protocol-layer, and
//! validation errors are all captured here.

/// The error type for all msalib operations.
///
/// None of these are retried internally. Apart from [`Error::NotConnected`],
/// an error is fatal to the operation that raised it but not to the session:
/// a malformed reply to one query does not make the link unusable.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The session (or the stream underneath it) is not open.
    #[error("not connected")]
    NotConnected,

    /// A transport-level failure (port open, write, read).
    #[error("transport error: {0}")]
    Transport(String),

    /// A caller-supplied setting value was rejected by its validator.
    ///
    /// Raised before any byte is written to the stream.
    #[error("invalid value {value:?}: expected {expected}")]
    Validation {
        /// The rejected value, as supplied by the caller.
        value: String,
        /// Human-readable description of the accepted set or range.
        expected: String,
    },

    /// A reply did not match its expected textual pattern.
    #[error("parse error: {0}")]
    Parse(String),

    /// Sweep sample count and reconstructed frequency bins disagree.
    #[error("inconsistent sweep data: {0}")]
    InconsistentData(String),

    /// No setting with this name exists in the settings schema.
    #[error("unknown setting: {0}")]
    UnknownSetting(String),

    /// An invalid parameter was passed to a builder or configuration call.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// A raw I/O error from a stream implementation. The bundled streams
    /// report I/O failures as [`Error::Transport`].
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A convenience `Result` alias using [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;
