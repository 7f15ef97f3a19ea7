//! # Engine State Module
//!
//! The chunk streaming engine.
//!
//! ## Key Components
//!
//! * `voxels` - Chunk coordinates, blocks, chunks and world generation
//! * `rendering` - Chunk meshing and per-frame draw lists
//! * `task_management` - The worker pool
//! * `chunk_store` - The LRU chunk cache
//! * `tasks` - The jobs queued on the worker pool
//! * `manager` - The background thread that keeps the viewer's window loaded
//!
//! ## Architecture
//!
//! The render thread publishes the viewer's chunk through the manager's shared
//! view state. The manager thread reads it every tick and queues loads for
//! missing chunks on the worker pool. Workers generate and mesh chunks and store
//! them in the chunk store, which the render thread reads back each frame.

pub mod chunk_store;
pub mod manager;
pub mod rendering;
pub mod task_management;
pub mod tasks;
pub mod voxels;
