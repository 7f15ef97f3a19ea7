//! # Chunk Load Task
//!
//! This module defines the `ChunkLoadTask`, the job the manager queues for every
//! missing chunk in its window: generate the chunk, mesh it, and store the result.

use std::sync::Arc;

use crate::engine_state::{
    chunk_store::ChunkStore, task_management::task::Task, voxels::coordinate::ChunkCoordinate,
};

/// A task that loads one chunk into a `ChunkStore`.
///
/// The task keeps the store alive through its `Arc`. While the task exists the
/// store counts its coordinate as loading; if the task is dropped without
/// finishing (discarded by a stopping pool, or unwound by a panicking
/// generator) it clears that marker so a later scan can queue the chunk again.
pub struct ChunkLoadTask {
    store: Arc<ChunkStore>,
    position: ChunkCoordinate,
    completed: bool,
}

impl ChunkLoadTask {
    /// Creates a new chunk load task.
    ///
    /// # Arguments
    /// * `store` - The store the chunk is loaded into
    /// * `position` - The coordinate of the chunk to load
    pub fn new(store: Arc<ChunkStore>, position: ChunkCoordinate) -> Self {
        ChunkLoadTask {
            store,
            position,
            completed: false,
        }
    }

    /// The coordinate this task loads.
    pub fn position(&self) -> ChunkCoordinate {
        self.position
    }
}

impl Task for ChunkLoadTask {
    fn process(mut self: Box<Self>) {
        self.store.load_chunk(self.position);
        self.completed = true;
    }
}

impl Drop for ChunkLoadTask {
    fn drop(&mut self) {
        if !self.completed {
            self.store.release_in_flight(self.position);
        }
    }
}
