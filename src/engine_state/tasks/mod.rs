//! Jobs the engine queues on the worker pool.

pub mod chunk_load_task;
