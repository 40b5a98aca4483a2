//! Bump arenas for search records.
//!
//! Node and message lifetimes are coterminous with the search, so records
//! are never freed individually: the arena hands out slots from fixed-size
//! chunks and releases everything at once when dropped.
//!
//! Exactly one worker allocates from a given arena; any thread may read
//! slots it learned about through a published reference. A chunk becomes
//! visible to readers when its cell in the chunk table is initialized, which
//! happens before any slot inside it can be referenced.

use std::sync::OnceLock;
use std::sync::atomic::{AtomicU32, Ordering};

/// Chunk size in bytes, matching the 64 KiB reference mappings.
const CHUNK_BYTES: usize = 64 * 1024;

/// Upper bound on chunks per arena. At 64 KiB each this allows tens of
/// millions of records per worker; running past it is a programmer error.
const MAX_CHUNKS: usize = 16384;

/// Growable bump allocator with stable slots and lock-free shared reads.
pub struct Arena<T> {
    chunks: Box<[OnceLock<Box<[T]>>]>,
    /// Next free slot. Only the owning worker writes it.
    len: AtomicU32,
}

impl<T: Default> Arena<T> {
    /// Records per chunk.
    const SLOTS_PER_CHUNK: usize = {
        let slots = CHUNK_BYTES / std::mem::size_of::<T>();
        if slots == 0 { 1 } else { slots }
    };

    /// Create an empty arena. No chunk is mapped until the first allocation.
    pub fn new() -> Arena<T> {
        Arena {
            chunks: (0..MAX_CHUNKS).map(|_| OnceLock::new()).collect(),
            len: AtomicU32::new(0),
        }
    }

    /// Allocate the next slot, growing by one chunk when the current chunk
    /// is exhausted. Owner-only.
    ///
    /// # Panics
    ///
    /// Panics if the chunk table is exhausted.
    pub fn alloc(&self) -> u32 {
        let slot = self.len.load(Ordering::Relaxed);
        let chunk = slot as usize / Self::SLOTS_PER_CHUNK;
        assert!(chunk < MAX_CHUNKS, "arena chunk table exhausted");
        self.chunks[chunk]
            .get_or_init(|| (0..Self::SLOTS_PER_CHUNK).map(|_| T::default()).collect());
        self.len.store(slot + 1, Ordering::Relaxed);
        slot
    }

    /// Resolve a slot returned by [`alloc`](Arena::alloc).
    ///
    /// # Panics
    ///
    /// Panics if `slot`'s chunk was never mapped.
    #[inline]
    pub fn get(&self, slot: u32) -> &T {
        let chunk = slot as usize / Self::SLOTS_PER_CHUNK;
        let index = slot as usize % Self::SLOTS_PER_CHUNK;
        let chunk = self.chunks[chunk].get().expect("arena slot never allocated");
        &chunk[index]
    }

    /// Number of slots handed out so far.
    #[cfg(test)]
    pub fn len(&self) -> u32 {
        self.len.load(Ordering::Relaxed)
    }

    /// Number of chunks currently mapped.
    #[cfg(test)]
    pub fn chunk_count(&self) -> usize {
        self.chunks.iter().filter(|c| c.get().is_some()).count()
    }
}

impl<T: Default> Default for Arena<T> {
    fn default() -> Self {
        Self::new()
    }
}
