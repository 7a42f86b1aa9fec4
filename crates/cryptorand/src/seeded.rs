//! Deterministic seeded backend: an AES-256 keystream with key ratcheting.
//!
//! The keystream is produced by encrypting a fixed, process-wide plaintext
//! of counter-stamped blocks in ECB mode. Because every block of that
//! plaintext is unique, ECB over it is equivalent in effect to counter mode
//! while only requiring plain block encryption from the cipher. Each refill
//! re-keys the cipher from the first 32 bytes of its own output (the
//! ratchet), so recovering a later key reveals nothing about earlier output.
//!
//! The byte stream is fully determined by the 32-byte seed key, which is the
//! whole point: same key, same stream, on every platform.

use crate::{Error, RandomSource, Result};
use aes::cipher::{BlockEncrypt, Key, KeyInit};
use aes::{Aes256, Block};
use parking_lot::Mutex;
use std::sync::LazyLock;
#[cfg(feature = "tracing")]
use tracing::instrument;
use zeroize::Zeroize;

/// Seed key size in bytes (AES-256 key size).
pub const SEED_KEY_SIZE: usize = 32;

/// Keystream buffer size. Must be a multiple of the AES block size and
/// strictly greater than [`SEED_KEY_SIZE`].
pub const KEYSTREAM_BUFFER_SIZE: usize = 8192;

const AES_BLOCK_SIZE: usize = 16;

/// The shared plaintext encrypted on every refill: block 0 is zero, block
/// `i` carries big-endian `i` in its last four bytes. Unique-per-block by
/// construction, never mutated.
static NONCE_BLOCKS: LazyLock<Box<[u8; KEYSTREAM_BUFFER_SIZE]>> = LazyLock::new(|| {
    let mut blocks = Box::new([0u8; KEYSTREAM_BUFFER_SIZE]);
    for i in 1..(KEYSTREAM_BUFFER_SIZE / AES_BLOCK_SIZE) as u32 {
        let counter_at = i as usize * AES_BLOCK_SIZE + (AES_BLOCK_SIZE - 4);
        blocks[counter_at..counter_at + 4].copy_from_slice(&i.to_be_bytes());
    }
    blocks
});

/// Keystream buffer and cursor, guarded together by one mutex.
struct KeystreamState {
    /// Current AES-256 key; replaced by the ratchet on every refill.
    key: [u8; SEED_KEY_SIZE],
    /// Current keystream generation. Bytes `[0, SEED_KEY_SIZE)` are the
    /// next key and are never served.
    buf: Box<[u8; KEYSTREAM_BUFFER_SIZE]>,
    /// Next unserved byte; `KEYSTREAM_BUFFER_SIZE` means "refill needed".
    cursor: usize,
}

impl KeystreamState {
    /// Encrypts the nonce plaintext under the current key, then re-keys
    /// from the head of the fresh ciphertext.
    fn ratchet_refill(&mut self) {
        let cipher = Aes256::new(Key::<Aes256>::from_slice(&self.key));
        for (plaintext, ciphertext) in NONCE_BLOCKS
            .chunks_exact(AES_BLOCK_SIZE)
            .zip(self.buf.chunks_exact_mut(AES_BLOCK_SIZE))
        {
            cipher.encrypt_block_b2b(
                Block::from_slice(plaintext),
                Block::from_mut_slice(ciphertext),
            );
        }
        self.key.copy_from_slice(&self.buf[..SEED_KEY_SIZE]);
    }

    fn fill(&mut self, dest: &mut [u8]) {
        let mut served = 0;
        while served < dest.len() {
            if self.cursor == KEYSTREAM_BUFFER_SIZE {
                self.ratchet_refill();
                self.cursor = SEED_KEY_SIZE;
            }
            let available = KEYSTREAM_BUFFER_SIZE - self.cursor;
            let take = available.min(dest.len() - served);
            dest[served..served + take]
                .copy_from_slice(&self.buf[self.cursor..self.cursor + take]);
            self.cursor += take;
            served += take;
        }
    }
}

impl Drop for KeystreamState {
    fn drop(&mut self) {
        self.key.zeroize();
        self.buf.zeroize();
    }
}

/// The seeded backend. Reproducible: construction with the same key always
/// yields the same byte stream.
pub(crate) struct SeededBackend {
    state: Mutex<KeystreamState>,
}

impl SeededBackend {
    /// Builds a backend from a 32-byte seed key.
    ///
    /// # Errors
    /// [`Error::InvalidArgument`] if `seed_key` is not exactly
    /// [`SEED_KEY_SIZE`] bytes.
    pub(crate) fn new(seed_key: &[u8]) -> Result<Self> {
        let key = check_seed_key(seed_key)?;
        Ok(Self {
            state: Mutex::new(KeystreamState {
                key,
                buf: Box::new([0u8; KEYSTREAM_BUFFER_SIZE]),
                cursor: KEYSTREAM_BUFFER_SIZE, // forces the first refill
            }),
        })
    }

    /// Builds a backend from a legacy 32-bit seed: the seed's little-endian
    /// bytes sit at offset 0 of the key, the remainder is zero. Documented
    /// byte-for-byte so regression vectors reproduce across implementations.
    pub(crate) fn from_seed(seed: i32) -> Self {
        let mut key = [0u8; SEED_KEY_SIZE];
        key[..4].copy_from_slice(&seed.to_le_bytes());
        Self::new(&key).expect("expanded seed key is always SEED_KEY_SIZE bytes")
    }

    /// Replaces the key and forces a refill on the next read. The backend's
    /// identity is unchanged; only its stream position restarts.
    pub(crate) fn reseed(&self, seed_key: &[u8]) -> Result<()> {
        let key = check_seed_key(seed_key)?;
        let mut state = self.state.lock();
        state.key = key;
        state.cursor = KEYSTREAM_BUFFER_SIZE;
        Ok(())
    }
}

impl RandomSource for SeededBackend {
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip_all))]
    fn try_fill_bytes(&self, dest: &mut [u8]) -> Result<()> {
        if dest.is_empty() {
            return Ok(());
        }
        self.state.lock().fill(dest);
        Ok(())
    }
}

fn check_seed_key(seed_key: &[u8]) -> Result<[u8; SEED_KEY_SIZE]> {
    <[u8; SEED_KEY_SIZE]>::try_from(seed_key).map_err(|_| {
        Error::invalid_argument(format!(
            "seed key must be {SEED_KEY_SIZE} bytes, got {}",
            seed_key.len()
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    // Pinned golden vectors for seed 42. Any change to the keystream
    // construction, word endianness, or sampling order breaks these.
    const SEED_42_I32: [i32; 10] = [
        1733822070, 1529484660, 534171290, 706973818, 1975219436, 801437634, 1361696018,
        164611802, 1428054507, 784543941,
    ];
    const SEED_42_BYTES: [u8; 16] = [
        0x76, 0x06, 0x58, 0x67, 0x74, 0x15, 0x2a, 0xdb, 0x9a, 0xce, 0xd6, 0x9f, 0x7a, 0x90,
        0x23, 0x2a,
    ];
    const SEED_42_I64: [i64; 5] = [
        6569086596167501430,
        3036429430119911066,
        3442148429788837100,
        707002309634807058,
        3369590570298008043,
    ];

    #[test]
    fn nonce_blocks_carry_big_endian_counters() {
        let blocks = &*NONCE_BLOCKS;
        assert!(blocks[..AES_BLOCK_SIZE].iter().all(|&b| b == 0));
        assert_eq!(&blocks[AES_BLOCK_SIZE + 12..AES_BLOCK_SIZE * 2], &[0, 0, 0, 1]);
        let last = KEYSTREAM_BUFFER_SIZE - 4;
        assert_eq!(&blocks[last..], &511u32.to_be_bytes());
    }

    #[test]
    fn rejects_wrong_length_keys() {
        for len in [0, 16, 31, 33, 64] {
            assert!(matches!(
                SeededBackend::new(&vec![0u8; len]),
                Err(Error::InvalidArgument { .. })
            ));
        }
    }

    #[test]
    fn seed_42_i32_golden_vector() {
        let backend = SeededBackend::from_seed(42);
        for expected in SEED_42_I32 {
            assert_eq!(backend.try_next_i32().unwrap(), expected);
        }
    }

    #[test]
    fn seed_42_raw_bytes_golden_vector() {
        let backend = SeededBackend::from_seed(42);
        let mut bytes = [0u8; 16];
        backend.try_fill_bytes(&mut bytes).unwrap();
        assert_eq!(bytes, SEED_42_BYTES);
    }

    #[test]
    fn seed_42_i64_golden_vector() {
        let backend = SeededBackend::from_seed(42);
        for expected in SEED_42_I64 {
            assert_eq!(backend.try_next_i64().unwrap(), expected);
        }
    }

    #[test]
    fn split_reads_match_one_shot_reads() {
        let a = SeededBackend::from_seed(42);
        let b = SeededBackend::from_seed(42);

        let mut one_shot = [0u8; 64];
        a.try_fill_bytes(&mut one_shot).unwrap();

        let mut pieces = [0u8; 64];
        for chunk in pieces.chunks_mut(13) {
            b.try_fill_bytes(chunk).unwrap();
        }
        assert_eq!(one_shot, pieces);
    }

    #[test]
    fn stream_crosses_refill_boundary_deterministically() {
        // One generation serves BUFFER - KEY bytes; read past it twice over
        // and check two backends still agree byte for byte.
        let serve_len = (KEYSTREAM_BUFFER_SIZE - SEED_KEY_SIZE) * 2 + 100;
        let a = SeededBackend::from_seed(7);
        let b = SeededBackend::from_seed(7);

        let mut left = vec![0u8; serve_len];
        let mut right = vec![0u8; serve_len];
        a.try_fill_bytes(&mut left).unwrap();
        b.try_fill_bytes(&mut right).unwrap();
        assert_eq!(left, right);
    }

    #[test]
    fn ratchet_replaces_key_after_refill() {
        let backend = SeededBackend::from_seed(42);
        let initial_key = backend.state.lock().key;

        let mut byte = [0u8; 1];
        backend.try_fill_bytes(&mut byte).unwrap();

        let state = backend.state.lock();
        assert_ne!(state.key, initial_key);
        assert_eq!(state.key[..], state.buf[..SEED_KEY_SIZE]);
        assert_eq!(state.cursor, SEED_KEY_SIZE + 1);
    }

    #[test]
    fn reseed_restarts_the_stream() {
        let key = [9u8; SEED_KEY_SIZE];
        let backend = SeededBackend::new(&key).unwrap();

        let mut first = [0u8; 32];
        backend.try_fill_bytes(&mut first).unwrap();

        // Skew the stream position, then reseed with the original key.
        let mut skip = [0u8; 100];
        backend.try_fill_bytes(&mut skip).unwrap();
        backend.reseed(&key).unwrap();

        let mut replay = [0u8; 32];
        backend.try_fill_bytes(&mut replay).unwrap();
        assert_eq!(first, replay);
    }

    #[test]
    fn reseed_rejects_wrong_length_without_touching_state() {
        let backend = SeededBackend::from_seed(1);
        let mut before = [0u8; 8];
        backend.try_fill_bytes(&mut before).unwrap();

        assert!(matches!(
            backend.reseed(&[0u8; 16]),
            Err(Error::InvalidArgument { .. })
        ));

        // Stream continues where it left off: identical to an undisturbed twin.
        let twin = SeededBackend::from_seed(1);
        let mut twin_head = [0u8; 8];
        twin.try_fill_bytes(&mut twin_head).unwrap();
        assert_eq!(before, twin_head);

        let mut a = [0u8; 8];
        let mut b = [0u8; 8];
        backend.try_fill_bytes(&mut a).unwrap();
        twin.try_fill_bytes(&mut b).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn different_seeds_diverge() {
        let a = SeededBackend::from_seed(1);
        let b = SeededBackend::from_seed(2);
        let mut left = [0u8; 32];
        let mut right = [0u8; 32];
        a.try_fill_bytes(&mut left).unwrap();
        b.try_fill_bytes(&mut right).unwrap();
        assert_ne!(left, right);
    }
}
