//! 128-bit identifiers: the [`Guid`] type, a thread-local fast pool, and
//! the sortable clustered-key layout.
//!
//! The pool exists because "give me a fresh random 128-bit ID" is by far
//! the most common request and deserves a path with no locking and no
//! per-call OS round trip: each thread pre-fills a batch of identifiers in
//! one entropy call and hands them out until the batch wraps.

use crate::{Result, TickSource, entropy};
use core::fmt;
use std::cell::RefCell;
use zeroize::Zeroize;

/// Identifiers pre-filled per thread in one entropy call. Power of two so
/// the pool cursor wraps with a mask.
pub const GUIDS_PER_POOL: usize = 256;

const GUID_SIZE: usize = 16;

/// A 128-bit globally unique identifier.
///
/// The byte layout is exactly the 16 bytes the engine produced, in order;
/// there is no RFC 4122 version/variant stamping. [`Display`] renders the
/// conventional lowercase hyphenated hex form.
///
/// # Example
/// ```
/// use cryptorand::Guid;
///
/// let guid = Guid::from_bytes([0; 16]);
/// assert_eq!(guid.to_string(), "00000000-0000-0000-0000-000000000000");
/// assert_eq!(guid.to_u128(), 0);
/// ```
///
/// [`Display`]: core::fmt::Display
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Guid([u8; GUID_SIZE]);

impl Guid {
    /// Returns a new random identifier from the calling thread's pool.
    ///
    /// Equivalent to [`Guid::try_new`] but panics if the OS entropy source
    /// fails.
    #[must_use]
    pub fn new() -> Self {
        Self::try_new().unwrap()
    }

    /// Returns a new random identifier from the calling thread's pool.
    ///
    /// # Errors
    /// [`Error::Entropy`](crate::Error::Entropy) if the pool needed a
    /// refill and the OS entropy source failed.
    pub fn try_new() -> Result<Self> {
        POOL.with_borrow_mut(GuidPool::next)
    }

    /// Builds an identifier from its 16 raw bytes.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; GUID_SIZE]) -> Self {
        Self(bytes)
    }

    /// Borrows the raw bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; GUID_SIZE] {
        &self.0
    }

    /// Returns the raw bytes by value.
    #[must_use]
    pub const fn to_bytes(self) -> [u8; GUID_SIZE] {
        self.0
    }

    /// Returns the identifier as a `u128`, treating the bytes as big-endian
    /// so that byte order and numeric order agree.
    #[must_use]
    pub const fn to_u128(self) -> u128 {
        u128::from_be_bytes(self.0)
    }
}

impl fmt::Display for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b = &self.0;
        write!(
            f,
            "{:02x}{:02x}{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}{:02x}{:02x}{:02x}{:02x}",
            b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7], b[8], b[9], b[10], b[11], b[12],
            b[13], b[14], b[15],
        )
    }
}

impl fmt::Debug for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Guid({self})")
    }
}

thread_local! {
    /// Per-thread identifier pool, created lazily on the thread's first
    /// request and living for the thread's lifetime.
    static POOL: RefCell<GuidPool> = RefCell::new(GuidPool::new());
}

struct GuidPool {
    guids: Box<[[u8; GUID_SIZE]; GUIDS_PER_POOL]>,
    idx: usize,
}

impl GuidPool {
    fn new() -> Self {
        Self {
            guids: Box::new([[0u8; GUID_SIZE]; GUIDS_PER_POOL]),
            idx: 0,
        }
    }

    fn next(&mut self) -> Result<Guid> {
        let idx = self.idx & (GUIDS_PER_POOL - 1);
        self.idx = self.idx.wrapping_add(1);

        // The cursor wrapping to the front means the batch is spent:
        // refill every slot with a single entropy call.
        if idx == 0 {
            entropy::fill(self.guids.as_flattened_mut())?;
        }

        let slot = &mut self.guids[idx];
        let guid = Guid(*slot);
        slot.zeroize(); // a served ID must not linger in the pool
        Ok(guid)
    }
}

/// Assembles a sortable identifier from an 8-byte random prefix and a tick
/// timestamp.
///
/// The tick counter is serialized little-endian on every platform and then
/// reordered so the suffix compares in approximately increasing order over
/// time. With `T = ticks.to_le_bytes()`:
///
/// ```text
/// out[8]  = T[1]   out[9]  = T[0]
/// out[10] = T[7]   out[11] = T[6]   out[12] = T[5]
/// out[13] = T[4]   out[14] = T[3]   out[15] = T[2]
/// ```
///
/// This exact byte order is an interop contract with clustered-storage
/// consumers and must not change.
pub(crate) fn sortable_from_parts(random: [u8; 8], ticks: u64) -> Guid {
    let t = ticks.to_le_bytes();
    let mut out = [0u8; GUID_SIZE];
    out[..8].copy_from_slice(&random);

    out[10] = t[7];
    out[11] = t[6];
    out[12] = t[5];
    out[13] = t[4];
    out[14] = t[3];
    out[15] = t[2];

    out[8] = t[1];
    out[9] = t[0];

    Guid(out)
}

/// Builds a sortable identifier: 8 random bytes from `fill_random`, then
/// the reordered tick suffix from `clock`.
pub(crate) fn sortable_guid<C: TickSource>(
    clock: &C,
    fill_random: impl FnOnce(&mut [u8]) -> Result<()>,
) -> Result<Guid> {
    let mut random = [0u8; 8];
    fill_random(&mut random)?;
    Ok(sortable_from_parts(random, clock.now_ticks()))
}
