//! Error type shared by the directory, registrar and decoder.
//!
//! Most failures in this crate are *soft*: a stale device handle or an enumeration race
//! is folded into an empty result at the call site and never reaches the caller as an
//! `Err`. The variants below cover what is left: subsystem calls that the caller asked
//! for directly, payloads that cannot be decoded, and configuration loading.

use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, RawInputError>;

#[derive(Debug, Error)]
pub enum RawInputError {
    /// A subsystem call reported failure.
    ///
    /// `code` is the OS last-error value when one is available, `0` otherwise.
    #[error("{call} failed (code {code})")]
    Subsystem { call: &'static str, code: u32 },

    /// The fill phase of a two-phase query found the buffer too small.
    ///
    /// This happens when the item count grows between the sizing call and the fill call.
    #[error("buffer too small: {required} items required")]
    InsufficientBuffer { required: usize },

    /// The size query reported a zero-length payload.
    #[error("subsystem reported an empty payload")]
    EmptyPayload,

    /// Fewer bytes were available than the fixed native layout requires.
    #[error("payload too short: need {needed} bytes, got {got}")]
    ShortPayload { needed: usize, got: usize },

    /// Configuration could not be parsed or failed validation.
    #[error("config: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl RawInputError {
    /// Shorthand for a [`RawInputError::Subsystem`] with no error code.
    pub fn subsystem(call: &'static str) -> Self {
        RawInputError::Subsystem { call, code: 0 }
    }
}
