//! msalib-core: Core traits, types, and error definitions for msalib.
//!
//! This crate defines the instrument-agnostic abstractions the rest of the
//! workspace builds on. Applications that only consume decoded sweeps can
//! depend on these types without pulling in a serial driver.
//!
//! # Key types
//!
//! - [`ByteStream`] -- byte-level communication channel
//! - [`SpectrumRecord`] / [`SweepPoint`] -- decoded sweep data
//! - [`Error`] / [`Result`] -- error handling

pub mod error;
pub mod helpers;
pub mod stream;
pub mod types;

// Re-export key types at crate root for ergonomic `use msalib_core::*`.
pub use error::{Error, Result};
pub use helpers::{format_freq_mhz, format_freq_suffix};
pub use stream::ByteStream;
pub use types::{SpectrumRecord, SweepPoint};
