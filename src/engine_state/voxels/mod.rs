//! # Voxels
//!
//! The data side of the voxel world: where chunks are, what they contain, and how
//! their contents are produced.
//!
//! ## Architecture
//!
//! * **Coordinate**: chunk coordinates, world bounds, and the packed/mixed keys that
//!   index the chunk cache
//! * **Block**: block ids, block type properties and block faces
//! * **Chunk**: fixed-size 3D grids of blocks
//! * **Generator**: the deterministic world generator oracle and its noise-backed
//!   implementation

pub mod block;
pub mod chunk;
pub mod coordinate;
pub mod generator;
