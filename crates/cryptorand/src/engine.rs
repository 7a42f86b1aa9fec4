//! The engine facade: one construction-time backend choice, one thread-safe
//! operation surface.

use crate::{
    Error, Guid, RandomSource, Result, SystemClock, TickSource, cache::OsBackend, guid,
    seeded::SeededBackend,
};
use std::sync::LazyLock;

/// The backend chosen at construction. There are no transitions: an engine
/// keeps its backend for life.
enum Backend {
    /// OS entropy through striped per-core byte caches.
    Os(OsBackend),
    /// Deterministic AES-256 keystream from an explicit seed key.
    Seeded(SeededBackend),
}

static SHARED: LazyLock<CryptoRandom> = LazyLock::new(CryptoRandom::new);

/// A fast, thread-safe, cryptographically strong random number engine.
///
/// Two kinds of engine exist, fixed at construction:
///
/// - **OS-entropy** ([`CryptoRandom::new`], [`CryptoRandom::shared`]):
///   unpredictable randomness for production use, amortized through
///   per-core entropy caches.
/// - **Seeded** ([`CryptoRandom::from_seed_key`], [`CryptoRandom::from_seed`]):
///   a fully reproducible stream for replayable simulations and regression
///   tests, still built from a cryptographically strong keystream.
///
/// Every operation is safe to call concurrently from any number of threads
/// without external synchronization. Sampling is bias-free for arbitrary
/// bounds via rejection sampling (see [`RandomSource`], which this type
/// implements and from which it inherits the typed `try_next_*` samplers).
///
/// Fallible `try_*` methods return [`Result`]; each has a panicking
/// convenience twin for callers that treat entropy failure as fatal,
/// which it is: no random output can be trusted without entropy.
///
/// # Example
/// ```
/// use cryptorand::CryptoRandom;
///
/// // Unpredictable engine:
/// let rng = CryptoRandom::new();
/// let roll = rng.next_i32_range(1, 7);
/// assert!((1..7).contains(&roll));
///
/// // Reproducible engine:
/// let a = CryptoRandom::from_seed(42);
/// let b = CryptoRandom::from_seed(42);
/// assert_eq!(a.next_i32(), b.next_i32());
/// ```
pub struct CryptoRandom {
    backend: Backend,
}

impl CryptoRandom {
    /// Creates an engine backed by the operating system's CSPRNG.
    #[must_use]
    pub fn new() -> Self {
        Self {
            backend: Backend::Os(OsBackend::new()),
        }
    }

    /// Returns the process-wide shared engine.
    ///
    /// Created exactly once, on first use, and safe for unbounded
    /// concurrent sharing; per-core cache striping keeps contention on the
    /// shared instance low.
    ///
    /// # Example
    /// ```
    /// use cryptorand::CryptoRandom;
    ///
    /// let value = CryptoRandom::shared().next_f64();
    /// assert!((0.0..1.0).contains(&value));
    /// ```
    #[must_use]
    pub fn shared() -> &'static Self {
        &SHARED
    }

    /// Creates a deterministic engine from a 32-byte seed key.
    ///
    /// Two engines built from the same key produce identical streams across
    /// any identical sequence of operations, on every platform.
    ///
    /// # Errors
    /// [`Error::InvalidArgument`] if `seed_key` is not exactly
    /// [`SEED_KEY_SIZE`](crate::params::SEED_KEY_SIZE) bytes.
    pub fn from_seed_key(seed_key: &[u8]) -> Result<Self> {
        Ok(Self {
            backend: Backend::Seeded(SeededBackend::new(seed_key)?),
        })
    }

    /// Creates a deterministic engine from a legacy 32-bit seed.
    ///
    /// The seed is expanded to a full key by placing its little-endian
    /// bytes at offset 0 and zero-filling the remainder, a documented,
    /// byte-exact expansion so that recorded vectors stay reproducible.
    /// Prefer [`CryptoRandom::from_seed_key`] for anything security
    /// sensitive: a 32-bit seed space is trivially enumerable.
    #[must_use]
    pub fn from_seed(seed: i32) -> Self {
        Self {
            backend: Backend::Seeded(SeededBackend::from_seed(seed)),
        }
    }

    /// Whether this engine was constructed from a seed.
    #[must_use]
    pub fn is_seeded(&self) -> bool {
        matches!(self.backend, Backend::Seeded(_))
    }

    /// Replaces the seed key of a seeded engine and restarts its stream.
    ///
    /// # Errors
    /// - [`Error::UnsupportedReseed`] on an OS-entropy engine.
    /// - [`Error::InvalidArgument`] on a wrong-length key; the current
    ///   stream is left untouched.
    pub fn try_reseed(&self, seed_key: &[u8]) -> Result<()> {
        match &self.backend {
            Backend::Seeded(seeded) => seeded.reseed(seed_key),
            Backend::Os(_) => Err(Error::UnsupportedReseed),
        }
    }

    /// Panicking twin of [`CryptoRandom::try_reseed`].
    pub fn reseed(&self, seed_key: &[u8]) {
        self.try_reseed(seed_key).unwrap()
    }

    /// Returns a freshly allocated buffer of exactly `count` random bytes.
    ///
    /// `count == 0` returns an empty buffer without touching the backend.
    pub fn try_next_bytes(&self, count: usize) -> Result<Vec<u8>> {
        let mut bytes = vec![0u8; count];
        self.try_fill_bytes(&mut bytes)?;
        Ok(bytes)
    }

    /// Panicking twin of [`CryptoRandom::try_next_bytes`].
    #[must_use]
    pub fn next_bytes(&self, count: usize) -> Vec<u8> {
        self.try_next_bytes(count).unwrap()
    }

    /// Fills a fixed-size byte record with random bytes.
    ///
    /// The record's field layout and endianness are the caller's contract;
    /// this operation only guarantees uniformly random content, never
    /// structural validity of whatever type the bytes are later parsed as.
    pub fn try_fill_record<const N: usize>(&self, record: &mut [u8; N]) -> Result<()> {
        self.try_fill_bytes(record)
    }

    /// Panicking twin of [`CryptoRandom::try_fill_record`].
    pub fn fill_record<const N: usize>(&self, record: &mut [u8; N]) {
        self.try_fill_record(record).unwrap()
    }

    /// Returns a random fixed-size byte array.
    ///
    /// # Example
    /// ```
    /// use cryptorand::CryptoRandom;
    ///
    /// let token: [u8; 24] = CryptoRandom::shared().next_array();
    /// # let _ = token;
    /// ```
    pub fn try_next_array<const N: usize>(&self) -> Result<[u8; N]> {
        let mut bytes = [0u8; N];
        self.try_fill_bytes(&mut bytes)?;
        Ok(bytes)
    }

    /// Panicking twin of [`CryptoRandom::try_next_array`].
    #[must_use]
    pub fn next_array<const N: usize>(&self) -> [u8; N] {
        self.try_next_array().unwrap()
    }

    /// Returns a new random 128-bit identifier.
    ///
    /// On an OS-entropy engine this is served from the calling thread's
    /// pre-filled identifier pool, the fastest path in the crate. On a
    /// seeded engine the identifier is the next 16 keystream bytes, so it
    /// participates in the deterministic stream like any other draw.
    pub fn try_next_guid(&self) -> Result<Guid> {
        match &self.backend {
            Backend::Os(_) => Guid::try_new(),
            Backend::Seeded(seeded) => {
                let mut bytes = [0u8; 16];
                seeded.try_fill_bytes(&mut bytes)?;
                Ok(Guid::from_bytes(bytes))
            }
        }
    }

    /// Panicking twin of [`CryptoRandom::try_next_guid`].
    #[must_use]
    pub fn next_guid(&self) -> Guid {
        self.try_next_guid().unwrap()
    }

    /// Returns a sortable 128-bit identifier: 8 random bytes followed by an
    /// 8-byte suffix derived from the current UTC time in 100-ns ticks,
    /// reordered for approximately increasing comparison over time (the
    /// clustered-storage key layout).
    ///
    /// With `T` the little-endian bytes of the tick counter, the suffix is
    /// `T[1], T[0], T[7], T[6], T[5], T[4], T[3], T[2]` at bytes 8..16.
    /// This exact order is an interop contract and will not change.
    ///
    /// The random prefix is always drawn from the engine's own stream, so
    /// on a seeded engine the prefix remains deterministic.
    pub fn try_next_sortable_guid(&self) -> Result<Guid> {
        self.try_next_sortable_guid_with(&SystemClock)
    }

    /// Panicking twin of [`CryptoRandom::try_next_sortable_guid`].
    #[must_use]
    pub fn next_sortable_guid(&self) -> Guid {
        self.try_next_sortable_guid().unwrap()
    }

    /// [`CryptoRandom::try_next_sortable_guid`] with an explicit
    /// [`TickSource`], for callers that need a custom or mocked clock.
    pub fn try_next_sortable_guid_with<C: TickSource>(&self, clock: &C) -> Result<Guid> {
        guid::sortable_guid(clock, |dest| self.try_fill_bytes(dest))
    }

    // Panicking twins of the `RandomSource` samplers. Inherent methods, so
    // callers get the common operations without importing the trait.

    /// Fills `dest` with random bytes; see [`RandomSource::try_fill_bytes`].
    pub fn fill_bytes(&self, dest: &mut [u8]) {
        self.try_fill_bytes(dest).unwrap()
    }

    /// Returns a random integer in `[0, i32::MAX)`.
    #[must_use]
    pub fn next_i32(&self) -> i32 {
        self.try_next_i32().unwrap()
    }

    /// Returns a random integer in `[0, max)`; see
    /// [`RandomSource::try_next_i32_below`].
    #[must_use]
    pub fn next_i32_below(&self, max: i32) -> i32 {
        self.try_next_i32_below(max).unwrap()
    }

    /// Returns a random integer in `[min, max)`; see
    /// [`RandomSource::try_next_i32_range`].
    #[must_use]
    pub fn next_i32_range(&self, min: i32, max: i32) -> i32 {
        self.try_next_i32_range(min, max).unwrap()
    }

    /// Returns a random integer in `[0, i64::MAX)`.
    #[must_use]
    pub fn next_i64(&self) -> i64 {
        self.try_next_i64().unwrap()
    }

    /// Returns a random integer in `[0, max)`; see
    /// [`RandomSource::try_next_i64_below`].
    #[must_use]
    pub fn next_i64_below(&self, max: i64) -> i64 {
        self.try_next_i64_below(max).unwrap()
    }

    /// Returns a random integer in `[min, max)`; see
    /// [`RandomSource::try_next_i64_range`].
    #[must_use]
    pub fn next_i64_range(&self, min: i64, max: i64) -> i64 {
        self.try_next_i64_range(min, max).unwrap()
    }

    /// Returns a uniform `f64` in `[0.0, 1.0)`.
    #[must_use]
    pub fn next_f64(&self) -> f64 {
        self.try_next_f64().unwrap()
    }

    /// Returns a uniform `f32` in `[0.0, 1.0)`.
    #[must_use]
    pub fn next_f32(&self) -> f32 {
        self.try_next_f32().unwrap()
    }
}

impl Default for CryptoRandom {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomSource for CryptoRandom {
    fn try_fill_bytes(&self, dest: &mut [u8]) -> Result<()> {
        match &self.backend {
            Backend::Os(os) => os.try_fill_bytes(dest),
            Backend::Seeded(seeded) => seeded.try_fill_bytes(dest),
        }
    }
}
