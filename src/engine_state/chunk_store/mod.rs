//! # Chunk Store
//!
//! The thread-safe chunk cache shared by the manager thread, the worker pool and
//! the render thread.
//!
//! ## Architecture
//!
//! * **`ChunkStoreHandle`**: the LRU map itself, which assumes exclusive access
//! * **`ChunkStore`**: owns one handle behind a mutex, together with the world
//!   generator and mesher used to fill it
//!
//! ## Locking
//!
//! The store lock is only ever held for map operations. `load_chunk` generates and
//! meshes a chunk before taking the lock, so the time the render thread can spend
//! waiting in `use_handle` doesn't depend on how expensive generation is.
//!
//! ## Duplicate Loads
//!
//! The store remembers which coordinates have a load job queued or running, and
//! `load_n_around_on_pool` won't queue a second job for them. The marker is
//! cleared once the job has stored its entry, or when the job is dropped without
//! running (for example when the pool is stopped).

pub mod handle;

use std::{
    collections::HashSet,
    num::NonZeroUsize,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use log::{debug, trace};

use crate::engine_state::{
    rendering::meshing::ChunkMesher,
    task_management::{task::Task, PoolError, ThreadPool},
    tasks::chunk_load_task::ChunkLoadTask,
    voxels::{
        coordinate::{ChunkCoordinate, ChunkKeyBuildHasher, CoordinateBounds},
        generator::WorldGenerator,
    },
};

pub use handle::{ChunkStoreEntry, ChunkStoreHandle};

struct StoreState {
    handle: ChunkStoreHandle,
    /// Coordinates with a load job queued or running.
    in_flight: HashSet<ChunkCoordinate, ChunkKeyBuildHasher>,
}

/// A `ChunkStoreHandle` behind a mutex, plus the oracles that produce its entries.
///
/// Load jobs hold the store through an `Arc`, so the store always outlives the
/// jobs that reference it.
pub struct ChunkStore {
    state: Mutex<StoreState>,
    generator: Box<dyn WorldGenerator>,
    mesher: Box<dyn ChunkMesher>,
}

impl ChunkStore {
    /// Creates an empty store for the whole world.
    ///
    /// # Arguments
    /// * `capacity` - Maximum number of resident chunks
    /// * `generator` - Produces the blocks of missing chunks
    /// * `mesher` - Turns generated chunks into renderer payload
    pub fn new(
        capacity: NonZeroUsize,
        generator: impl WorldGenerator + 'static,
        mesher: impl ChunkMesher + 'static,
    ) -> Self {
        Self::with_bounds(capacity, CoordinateBounds::WORLD, generator, mesher)
    }

    /// Creates an empty store that only accepts coordinates inside `bounds`.
    pub fn with_bounds(
        capacity: NonZeroUsize,
        bounds: CoordinateBounds,
        generator: impl WorldGenerator + 'static,
        mesher: impl ChunkMesher + 'static,
    ) -> Self {
        Self {
            state: Mutex::new(StoreState {
                handle: ChunkStoreHandle::with_bounds(capacity, bounds),
                in_flight: HashSet::default(),
            }),
            generator: Box::new(generator),
            mesher: Box::new(mesher),
        }
    }

    /// Runs `f` with exclusive access to the handle.
    ///
    /// This is the only way to reach the handle. `f` runs with the store lock held
    /// and blocks every other user of the store until it returns.
    pub fn use_handle<R>(&self, f: impl FnOnce(&mut ChunkStoreHandle) -> R) -> R {
        f(&mut self.lock().handle)
    }

    /// Generates and meshes the chunk at `position`, then stores it.
    ///
    /// Generation and meshing run without the store lock; only the final `put`
    /// is done under it.
    ///
    /// # Panics
    /// Panics if `position` is outside the store's bounds.
    pub fn load_chunk(&self, position: ChunkCoordinate) {
        let bounds = self.lock().handle.bounds();
        assert!(
            bounds.contains(position),
            "chunk {position:?} is outside the world bounds"
        );

        let chunk = self.generator.generate(position);
        let mesh = self.mesher.mesh(&chunk, position);
        let entry = ChunkStoreEntry::new(chunk, mesh);

        let mut state = self.lock();
        state.handle.put(position, entry);
        state.in_flight.remove(&position);
        trace!("Stored chunk {position:?}");
    }

    /// Makes sure every chunk within `radius` of `center` is resident or loading.
    ///
    /// Walks the cube of side `2 * radius + 1` around `center`, clamped to the
    /// store's bounds. Resident chunks are marked most recently used; missing
    /// chunks that aren't already loading get one `ChunkLoadTask` each, queued on
    /// `pool` as a single batch once the scan is done.
    ///
    /// # Returns
    /// The number of load jobs queued, or `PoolError::Stopped` if the pool was
    /// stopped (the jobs are then dropped unrun)
    pub fn load_n_around_on_pool(
        self: &Arc<Self>,
        pool: &ThreadPool,
        center: ChunkCoordinate,
        radius: i32,
    ) -> Result<usize, PoolError> {
        let tasks: Vec<Box<dyn Task>> = {
            let mut state = self.lock();
            let StoreState { handle, in_flight } = &mut *state;

            let mut tasks: Vec<Box<dyn Task>> = Vec::new();
            for position in handle.bounds().window(center, radius) {
                if handle.get_and_mark_used(position).is_none() && in_flight.insert(position) {
                    tasks.push(Box::new(ChunkLoadTask::new(self.clone(), position)));
                }
            }
            tasks
        };

        // Queued with the store unlocked: a rejected task takes the lock when dropped.
        let queued = tasks.len();
        if queued > 0 {
            pool.enqueue_batch(tasks)?;
        }

        debug!("Queued {queued} chunk loads around {center:?} (radius {radius})");
        Ok(queued)
    }

    /// Number of coordinates with a load job queued or running.
    pub fn in_flight_len(&self) -> usize {
        self.lock().in_flight.len()
    }

    /// Forgets that a load job for `position` is pending. Called when a job is
    /// dropped without storing its chunk.
    pub(crate) fn release_in_flight(&self, position: ChunkCoordinate) {
        self.lock().in_flight.remove(&position);
    }

    fn lock(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
