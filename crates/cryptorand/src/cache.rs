//! Striped per-core entropy caches for the OS-entropy backend.
//!
//! Calling into the OS CSPRNG for every 4-byte draw would dominate the cost
//! of small requests, so the unseeded backend amortizes entropy calls
//! through fixed-size byte caches. One global cache would serialize every
//! thread behind a single mutex; instead the backend keeps one cache stripe
//! per logical CPU, each padded to its own cache line so neighboring stripes
//! never share a line.
//!
//! Served bytes are zeroed immediately after copy-out. The invariant is that
//! `[0, position)` is always zero and only `[position, BYTE_CACHE_SIZE)`
//! holds unconsumed entropy, which bounds what a memory-disclosure bug could
//! ever leak and keeps snapshot assertions in tests well-defined.

use crate::{RandomSource, Result, entropy};
use crossbeam_utils::CachePadded;
use parking_lot::Mutex;
use std::cell::Cell;
use std::sync::atomic::{AtomicUsize, Ordering};
#[cfg(feature = "tracing")]
use tracing::instrument;
use zeroize::Zeroize;

/// Per-stripe byte cache size.
pub const BYTE_CACHE_SIZE: usize = 4096;

/// Requests larger than this limit bypass the cache entirely. A larger
/// request would evict most of a stripe for a single caller and gain
/// nothing from the amortization.
pub const REQUEST_CACHE_LIMIT: usize = BYTE_CACHE_SIZE / 4;

/// Round-robin source of stripe assignments for threads.
static NEXT_STRIPE: AtomicUsize = AtomicUsize::new(0);

thread_local! {
    /// The stripe this thread was assigned on first use.
    static ASSIGNED_STRIPE: Cell<Option<usize>> = const { Cell::new(None) };
}

/// One stripe: a lazily-allocated buffer plus its cursor, guarded together.
struct ByteCache {
    /// Allocated on first use; `None` until the owning thread first draws.
    buf: Option<Box<[u8; BYTE_CACHE_SIZE]>>,
    /// Bytes in `[0, position)` have been served (and zeroed).
    position: usize,
}

impl ByteCache {
    const fn new() -> Self {
        Self {
            buf: None,
            position: BYTE_CACHE_SIZE, // forces a refill on first use
        }
    }

    fn fill(&mut self, dest: &mut [u8]) -> Result<()> {
        debug_assert!(dest.len() <= REQUEST_CACHE_LIMIT);
        let buf = self
            .buf
            .get_or_insert_with(|| Box::new([0u8; BYTE_CACHE_SIZE]));

        if BYTE_CACHE_SIZE - self.position < dest.len() {
            // Whole-buffer refill: leftover unconsumed bytes are discarded
            // rather than compacted, keeping the cursor logic trivial.
            entropy::fill(&mut buf[..])?;
            self.position = 0;
        }

        let start = self.position;
        let end = start + dest.len();
        dest.copy_from_slice(&buf[start..end]);
        buf[start..end].zeroize();
        self.position = end;
        Ok(())
    }
}

/// The OS-entropy backend: one cache stripe per logical CPU.
///
/// Thread-to-stripe assignment is round-robin on first use and stable for
/// the thread's lifetime, which approximates per-processor ownership without
/// needing a CPU-id syscall on the hot path. On a uniprocessor machine this
/// degenerates to a single shared stripe.
pub(crate) struct OsBackend {
    stripes: Box<[CachePadded<Mutex<ByteCache>>]>,
}

impl OsBackend {
    pub(crate) fn new() -> Self {
        let stripe_count = num_cpus::get().max(1);
        let stripes = (0..stripe_count)
            .map(|_| CachePadded::new(Mutex::new(ByteCache::new())))
            .collect();
        Self { stripes }
    }

    fn stripe_index(&self) -> usize {
        let assigned = ASSIGNED_STRIPE.with(|cell| match cell.get() {
            Some(index) => index,
            None => {
                let index = NEXT_STRIPE.fetch_add(1, Ordering::Relaxed);
                cell.set(Some(index));
                index
            }
        });
        assigned % self.stripes.len()
    }
}

impl RandomSource for OsBackend {
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip_all))]
    fn try_fill_bytes(&self, dest: &mut [u8]) -> Result<()> {
        if dest.len() > REQUEST_CACHE_LIMIT {
            return entropy::fill(dest);
        }
        if dest.is_empty() {
            return Ok(());
        }
        self.stripes[self.stripe_index()].lock().fill(dest)
    }
}
