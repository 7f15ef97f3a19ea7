//! Render-side consumer of the chunk store.
//!
//! Each frame the render thread gathers the payload of every resident chunk in
//! its window into one `DrawList`. Missing chunks are not an error: they are
//! still being loaded, and the frame is drawn without them.

use crate::engine_state::{chunk_store::ChunkStore, voxels::coordinate::ChunkCoordinate};

/// The instance data to draw for one frame.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DrawList {
    /// Concatenated payload of every resident chunk in the window.
    pub vertex_data: Vec<u8>,
    /// Total number of instances in `vertex_data`.
    pub instance_count: u32,
    /// Number of resident chunks that contributed.
    pub chunk_count: usize,
    /// Whether any chunk in the window is not resident yet.
    pub still_loading: bool,
}

impl DrawList {
    /// Collects the chunks within `render_distance` of `center`.
    ///
    /// Runs under a single `use_handle` call, so the list is a consistent snapshot
    /// of the store. Lookups don't change the store's recency order.
    pub fn gather(store: &ChunkStore, center: ChunkCoordinate, render_distance: i32) -> Self {
        store.use_handle(|handle| {
            let mut draw_list = DrawList::default();

            for position in handle.bounds().window(center, render_distance) {
                match handle.get(position) {
                    Some(entry) => {
                        draw_list.vertex_data.extend_from_slice(&entry.vertex_data);
                        draw_list.instance_count += entry.instance_count;
                        draw_list.chunk_count += 1;
                    }
                    None => draw_list.still_loading = true,
                }
            }

            draw_list
        })
    }
}
