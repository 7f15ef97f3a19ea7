//! # Chunk Store Handle
//!
//! `ChunkStoreHandle` is the single-threaded core of the chunk cache: a
//! capacity-bounded map from `ChunkCoordinate` to `ChunkStoreEntry` with
//! least-recently-used eviction.
//!
//! ## Recency
//!
//! Entries are ordered from most to least recently used. Only `put` and
//! `get_and_mark_used` move an entry to the front; `get` is a pure read. When a
//! new coordinate is put into a full handle, the least recently used entry is
//! evicted first. Nothing is ever evicted except under that insert pressure.
//!
//! The handle assumes exclusive access. Other threads reach it only through
//! `ChunkStore::use_handle`.

use std::num::NonZeroUsize;

use log::trace;
use lru::LruCache;

use crate::engine_state::{
    rendering::meshing::ChunkMesh,
    voxels::{
        chunk::Chunk,
        coordinate::{ChunkCoordinate, ChunkKeyBuildHasher, CoordinateBounds},
    },
};

/// Everything cached for one chunk: its blocks and its meshed renderer payload.
///
/// Entries are built whole by a load job and never mutated once stored.
#[derive(Clone, Debug, PartialEq)]
pub struct ChunkStoreEntry {
    /// The generated blocks.
    pub chunk: Chunk,
    /// Opaque renderer payload.
    pub vertex_data: Vec<u8>,
    /// Number of draw instances encoded in `vertex_data`.
    pub instance_count: u32,
}

impl ChunkStoreEntry {
    /// Creates an entry from a chunk and its mesh.
    pub fn new(chunk: Chunk, mesh: ChunkMesh) -> Self {
        Self {
            chunk,
            vertex_data: mesh.vertex_data,
            instance_count: mesh.instance_count,
        }
    }
}

/// A capacity-bounded LRU map of resident chunks.
pub struct ChunkStoreHandle {
    entries: LruCache<ChunkCoordinate, ChunkStoreEntry, ChunkKeyBuildHasher>,
    bounds: CoordinateBounds,
}

impl ChunkStoreHandle {
    /// Creates an empty handle holding at most `capacity` entries, for
    /// coordinates inside the world bounds.
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self::with_bounds(capacity, CoordinateBounds::WORLD)
    }

    /// Creates an empty handle holding at most `capacity` entries, for
    /// coordinates inside `bounds`.
    pub fn with_bounds(capacity: NonZeroUsize, bounds: CoordinateBounds) -> Self {
        Self {
            entries: LruCache::with_hasher(capacity, ChunkKeyBuildHasher::default()),
            bounds,
        }
    }

    /// Looks up the entry at `position` without changing its recency.
    ///
    /// # Panics
    /// Panics if x or z is out of bounds. A y outside the band just misses.
    pub fn get(&self, position: ChunkCoordinate) -> Option<&ChunkStoreEntry> {
        assert!(
            self.bounds.contains_horizontal(position),
            "chunk {position:?} is outside the horizontal world bounds"
        );
        self.entries.peek(&position)
    }

    /// Looks up the entry at `position` and, on a hit, marks it most recently used.
    ///
    /// # Panics
    /// Panics if `position` is out of bounds on any axis.
    pub fn get_and_mark_used(&mut self, position: ChunkCoordinate) -> Option<&ChunkStoreEntry> {
        self.check_bounds(position);
        self.entries.get(&position)
    }

    /// Inserts or replaces the entry at `position`, making it most recently used.
    ///
    /// A new coordinate put into a full handle evicts the least recently used
    /// entry first.
    ///
    /// # Returns
    /// The evicted coordinate, if any. Replacing an existing entry evicts nothing.
    ///
    /// # Panics
    /// Panics if `position` is out of bounds on any axis.
    pub fn put(&mut self, position: ChunkCoordinate, entry: ChunkStoreEntry) -> Option<ChunkCoordinate> {
        self.check_bounds(position);

        match self.entries.push(position, entry) {
            Some((evicted, _)) if evicted != position => {
                trace!("Evicted chunk {evicted:?} to make room for {position:?}");
                Some(evicted)
            }
            _ => None,
        }
    }

    /// Number of resident entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Maximum number of resident entries.
    pub fn capacity(&self) -> usize {
        self.entries.cap().get()
    }

    /// Whether nothing is resident.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether `position` is resident. Does not change recency.
    pub fn contains(&self, position: ChunkCoordinate) -> bool {
        self.entries.contains(&position)
    }

    /// The coordinate bounds this handle accepts.
    pub fn bounds(&self) -> CoordinateBounds {
        self.bounds
    }

    /// Resident coordinates, most recently used first.
    pub fn coordinates_by_recency(&self) -> impl Iterator<Item = ChunkCoordinate> + '_ {
        self.entries.iter().map(|(position, _)| *position)
    }

    fn check_bounds(&self, position: ChunkCoordinate) {
        assert!(
            self.bounds.contains(position),
            "chunk {position:?} is outside the world bounds"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handle(capacity: usize) -> ChunkStoreHandle {
        ChunkStoreHandle::new(NonZeroUsize::new(capacity).unwrap())
    }

    fn entry(instance_count: u32) -> ChunkStoreEntry {
        ChunkStoreEntry {
            chunk: Chunk::empty(),
            vertex_data: vec![instance_count as u8; 4],
            instance_count,
        }
    }

    fn key(i: i32) -> ChunkCoordinate {
        ChunkCoordinate::new(i, 0, -i)
    }

    #[test]
    fn oldest_untouched_entry_is_evicted() {
        let mut handle = handle(4);
        for i in 1..=4 {
            assert_eq!(handle.put(key(i), entry(i as u32)), None);
        }

        assert_eq!(handle.put(key(5), entry(5)), Some(key(1)));

        assert!(handle.get(key(1)).is_none());
        for i in 2..=5 {
            assert_eq!(handle.get(key(i)).unwrap().instance_count, i as u32);
        }
    }

    #[test]
    fn marking_used_protects_from_eviction() {
        let mut handle = handle(4);
        for i in 1..=4 {
            handle.put(key(i), entry(i as u32));
        }

        assert!(handle.get_and_mark_used(key(1)).is_some());
        assert_eq!(handle.put(key(5), entry(5)), Some(key(2)));

        assert!(handle.contains(key(1)));
        assert!(!handle.contains(key(2)));
    }

    #[test]
    fn reinserting_refreshes_without_growing() {
        let mut handle = handle(3);
        for i in 1..=3 {
            handle.put(key(i), entry(i as u32));
        }

        assert_eq!(handle.put(key(1), entry(10)), None);
        assert_eq!(handle.len(), 3);
        assert_eq!(handle.get(key(1)).unwrap().instance_count, 10);
        assert_eq!(
            handle.coordinates_by_recency().collect::<Vec<_>>(),
            vec![key(1), key(3), key(2)]
        );

        assert_eq!(handle.put(key(4), entry(4)), Some(key(2)));
    }

    #[test]
    fn get_does_not_change_recency() {
        let mut handle = handle(3);
        for i in 1..=3 {
            handle.put(key(i), entry(i as u32));
        }

        for _ in 0..5 {
            assert!(handle.get(key(1)).is_some());
        }

        assert_eq!(handle.put(key(4), entry(4)), Some(key(1)));
    }

    #[test]
    fn misses_do_not_change_recency() {
        let mut handle = handle(2);
        handle.put(key(1), entry(1));
        handle.put(key(2), entry(2));

        assert!(handle.get_and_mark_used(key(7)).is_none());
        assert_eq!(handle.len(), 2);
        assert_eq!(handle.put(key(3), entry(3)), Some(key(1)));
    }

    #[test]
    fn never_exceeds_capacity() {
        let mut handle = handle(16);
        let mut rng = fastrand::Rng::with_seed(11);

        for _ in 0..2000 {
            let position = ChunkCoordinate::new(rng.i32(-20..20), rng.i32(-3..=2), rng.i32(-20..20));
            if rng.bool() {
                handle.get_and_mark_used(position);
            } else {
                handle.put(position, entry(1));
            }
            assert!(handle.len() <= handle.capacity());
        }
        assert_eq!(handle.len(), 16);
    }

    #[test]
    fn out_of_band_y_misses_on_plain_get() {
        let mut handle = handle(2);
        handle.put(key(1), entry(1));
        assert!(handle.get(ChunkCoordinate::new(1, 500, -1)).is_none());
    }

    #[test]
    #[should_panic(expected = "outside the horizontal world bounds")]
    fn plain_get_checks_horizontal_bounds() {
        handle(1).get(ChunkCoordinate::new(8_000_000, 0, 0));
    }

    #[test]
    #[should_panic(expected = "outside the world bounds")]
    fn put_checks_every_axis() {
        handle(1).put(ChunkCoordinate::new(0, 3, 0), entry(1));
    }

    #[test]
    #[should_panic(expected = "outside the world bounds")]
    fn get_and_mark_used_checks_custom_bounds() {
        let bounds = CoordinateBounds::new(ChunkCoordinate::new(-1, 0, -1), ChunkCoordinate::new(1, 0, 1));
        let mut handle = ChunkStoreHandle::with_bounds(NonZeroUsize::new(9).unwrap(), bounds);
        handle.get_and_mark_used(ChunkCoordinate::new(0, 1, 0));
    }
}
