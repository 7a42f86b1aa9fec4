//! Thin wrapper around the operating system's CSPRNG.
//!
//! Every byte of randomness in this crate ultimately originates here (the
//! seeded engine consumes it only indirectly, through the caller-provided
//! seed key). The OS primitive is treated as an opaque "fill these bytes
//! with strong randomness" capability: no buffering, no retry.

use crate::Result;
use rand::{TryRngCore, rngs::OsRng};

/// Overwrites every byte of `dest` with cryptographically strong random bits
/// from the operating system.
///
/// An empty `dest` is a no-op. Failure of the OS entropy source is
/// unrecoverable: the error propagates immediately and `dest` must be
/// treated as garbage.
pub(crate) fn fill(dest: &mut [u8]) -> Result<()> {
    OsRng.try_fill_bytes(dest)?;
    Ok(())
}
