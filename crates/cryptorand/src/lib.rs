//! Fast, thread-safe, cryptographically strong random numbers.
//!
//! `cryptorand` layers bias-free typed sampling over two interchangeable
//! byte-stream backends:
//!
//! - an **OS-entropy** backend that amortizes calls into the operating
//!   system's CSPRNG through striped, cache-line-padded per-core buffers,
//!   and
//! - a **seeded** backend that turns a 32-byte key into a reproducible
//!   AES-256 keystream with per-refill key ratcheting.
//!
//! The [`CryptoRandom`] facade binds one backend at construction and is
//! safe for unbounded concurrent use. [`Guid`] adds pooled 128-bit
//! identifier generation and a sortable clustered-key layout.
//!
//! ```
//! use cryptorand::{CryptoRandom, Guid};
//!
//! let rng = CryptoRandom::shared();
//! let die = rng.next_i32_range(1, 7);
//! assert!((1..7).contains(&die));
//!
//! let id = Guid::new();
//! assert_ne!(id, Guid::from_bytes([0; 16]));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod cache;
mod clock;
mod engine;
mod entropy;
mod error;
mod guid;
mod sampler;
mod seeded;

pub use crate::clock::*;
pub use crate::engine::*;
pub use crate::error::*;
pub use crate::guid::Guid;
pub use crate::sampler::*;

/// Internal tuning constants, exposed for advanced users and tests.
pub mod params {
    pub use crate::cache::{BYTE_CACHE_SIZE, REQUEST_CACHE_LIMIT};
    pub use crate::guid::GUIDS_PER_POOL;
    pub use crate::seeded::{KEYSTREAM_BUFFER_SIZE, SEED_KEY_SIZE};
}
