//! # Core Module
//!
//! Concurrency primitives shared by the rest of the crate.
//!
//! ## Key Components
//! - `SharedState`: Mutex-guarded state with snapshot reads and closure-based writes,
//!   used to hand the viewer's chunk coordinate from the render thread to the manager
//!
//! ## Usage
//! ```rust
//! use voxel_streamer::core::SharedState;
//!
//! let state = SharedState::new(0);
//! state.modify(|value| *value += 1);
//! assert_eq!(state.get(), 1);
//! ```

pub mod shared_state;

pub use shared_state::SharedState;
