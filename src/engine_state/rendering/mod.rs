//! Rendering side of the chunk pipeline.
//!
//! This module turns chunks into renderer payload (`meshing`) and collects that
//! payload back out of the chunk store once per frame (`draw_list`). Presenting
//! the payload on screen is left to the embedding application.

pub mod draw_list;
pub mod meshing;

pub use draw_list::DrawList;
pub use meshing::{ChunkMesh, ChunkMesher, StripMesher};
