//! Error types for the random engine.
//!
//! This module defines the central `Error` enum, which captures every failure
//! the crate can surface. Input validation always happens before any state
//! mutation, so a rejected call leaves cache and keystream state untouched
//! and never partially fills a caller-supplied buffer.
//!
//! ## Error Cases
//! - `InvalidArgument`: the caller passed a malformed value (wrong-length
//!   seed key, inverted range bounds).
//! - `UnsupportedReseed`: `reseed` was called on an OS-entropy engine.
//! - `Entropy`: the operating-system entropy source failed. This is fatal:
//!   it is never retried, and no random output can be trusted once it occurs.

/// Crate-wide result alias.
pub type Result<T> = core::result::Result<T, Error>;

/// Unified error type for the random engine.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The caller passed a malformed value or inconsistent bounds.
    #[error("invalid argument: {reason}")]
    InvalidArgument { reason: String },

    /// `reseed` is only meaningful on engines constructed from a seed key.
    #[error("reseed requires a seeded engine")]
    UnsupportedReseed,

    /// The operating-system entropy source failed. Fatal: not retried, and
    /// the contents of any output buffer are unspecified.
    #[error("OS entropy source failed: {0}")]
    Entropy(#[from] rand_core::OsError),
}

impl Error {
    pub(crate) fn invalid_argument(reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            reason: reason.into(),
        }
    }
}
