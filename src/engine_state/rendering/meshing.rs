//! Chunk meshing for the instanced face renderer.
//!
//! The renderer draws every visible block face as an instance of a single unit
//! quad. This module turns a chunk's block grid into the packed instance data the
//! renderer uploads verbatim, plus the number of instances it contains. The chunk
//! store treats the result as an opaque blob.
//!
//! `StripMesher` merges neighbouring identical faces along one axis into a single
//! stretched instance, which cuts the instance count by roughly the average run
//! length on flat terrain.

use bytemuck::{Pod, Zeroable};

use crate::{
    config::BLOCK_SIZE,
    engine_state::voxels::{
        block::block_side::BlockSide,
        chunk::{Chunk, CHUNK_DIMENSION},
        coordinate::ChunkCoordinate,
    },
};

/// Turns a chunk's blocks into renderer payload.
pub trait ChunkMesher: Send + Sync {
    /// Meshes `chunk`, which lives at `position`.
    ///
    /// Must be deterministic and free of side effects.
    fn mesh(&self, chunk: &Chunk, position: ChunkCoordinate) -> ChunkMesh;
}

/// Meshed renderer payload for one chunk.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ChunkMesh {
    /// Packed instance data, uploaded to the GPU as-is.
    pub vertex_data: Vec<u8>,
    /// Number of instances encoded in `vertex_data`.
    pub instance_count: u32,
}

/// One face instance as laid out in the instance buffer.
///
/// # Memory Layout
/// - Position: 3x f32 (12 bytes), world-space centre of the strip
/// - Rotation: f32 (4 bytes), the `BlockSide` discriminant
/// - X Scale: f32 (4 bytes), strip length in blocks
/// - Y Scale: f32 (4 bytes)
/// - Texture ID: f32 (4 bytes), block id minus one
///
/// Total size: 28 bytes
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct FaceInstance {
    /// World-space centre of the strip.
    pub position: [f32; 3],
    /// `BlockSide` discriminant of the face.
    pub rotation: f32,
    /// Strip length in blocks.
    pub x_scale: f32,
    /// Strip height in blocks.
    pub y_scale: f32,
    /// Block id minus one.
    pub texture_id: f32,
}

/// Meshes each chunk independently into strips of faces.
///
/// A face is exposed when it lies on the chunk boundary or its neighbour across
/// the face is not opaque. Neighbouring chunks are not consulted, so faces on
/// chunk boundaries are always emitted.
#[derive(Copy, Clone, Debug, Default)]
pub struct StripMesher;

impl StripMesher {
    /// Emits the strips of one block side into `data`.
    ///
    /// # Returns
    /// The number of instances written
    fn mesh_side(
        chunk: &Chunk,
        side: BlockSide,
        chunk_origin: [f32; 3],
        data: &mut Vec<u8>,
    ) -> u32 {
        let dimension = CHUNK_DIMENSION as usize;
        let normal = side.normal_axis();
        let run = side.run_axis();
        let cross = side.cross_axis();
        let direction = side.direction();
        let edge = if direction == 1 { dimension - 1 } else { 0 };

        let exposed = |position: [usize; 3]| {
            if position[normal] == edge {
                return true;
            }
            let mut neighbour = position;
            neighbour[normal] = (position[normal] as i32 + direction) as usize;
            !chunk.block(neighbour).is_opaque()
        };

        let mut instance_count = 0;

        for layer in 0..dimension {
            for row in 0..dimension {
                let mut position = [0; 3];
                position[normal] = layer;
                position[cross] = row;

                let mut along = 0;
                while along < dimension {
                    position[run] = along;
                    let block = chunk.block(position);

                    if block.is_empty() || !exposed(position) {
                        along += 1;
                        continue;
                    }

                    let start = along;
                    loop {
                        along += 1;
                        if along == dimension {
                            break;
                        }
                        position[run] = along;
                        if chunk.block(position) != block || !exposed(position) {
                            break;
                        }
                    }

                    let mut centre = [0.0f32; 3];
                    centre[normal] = layer as f32 + 0.5;
                    centre[cross] = row as f32 + 0.5;
                    centre[run] = start as f32 + (along - start) as f32 / 2.0;

                    let instance = FaceInstance {
                        position: [0, 1, 2]
                            .map(|axis| chunk_origin[axis] + centre[axis] * BLOCK_SIZE as f32),
                        rotation: side as u32 as f32,
                        x_scale: (along - start) as f32,
                        y_scale: 1.0,
                        texture_id: (block.id() - 1) as f32,
                    };
                    data.extend_from_slice(bytemuck::bytes_of(&instance));
                    instance_count += 1;
                }
            }
        }

        instance_count
    }
}

impl ChunkMesher for StripMesher {
    fn mesh(&self, chunk: &Chunk, position: ChunkCoordinate) -> ChunkMesh {
        let chunk_span = BLOCK_SIZE as f32 * CHUNK_DIMENSION as f32;
        let chunk_origin = [
            position.x as f32 * chunk_span,
            position.y as f32 * chunk_span,
            position.z as f32 * chunk_span,
        ];

        let mut mesh = ChunkMesh::default();
        if chunk.is_empty() {
            return mesh;
        }

        for side in BlockSide::all() {
            mesh.instance_count +=
                Self::mesh_side(chunk, side, chunk_origin, &mut mesh.vertex_data);
        }

        mesh
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_state::voxels::block::{block_type::BlockType, Block};
    use std::mem::size_of;

    fn instances(mesh: &ChunkMesh) -> Vec<FaceInstance> {
        mesh.vertex_data
            .chunks_exact(size_of::<FaceInstance>())
            .map(bytemuck::pod_read_unaligned)
            .collect()
    }

    #[test]
    fn empty_chunk_has_no_instances() {
        let mesh = StripMesher.mesh(&Chunk::empty(), ChunkCoordinate::default());
        assert_eq!(mesh.instance_count, 0);
        assert!(mesh.vertex_data.is_empty());
    }

    #[test]
    fn single_block_emits_one_face_per_side() {
        let mut chunk = Chunk::empty();
        chunk.set_block_at(4, 5, 6, Block::new(BlockType::STONE));

        let mesh = StripMesher.mesh(&chunk, ChunkCoordinate::new(1, 0, 0));

        assert_eq!(mesh.instance_count, 6);
        assert_eq!(mesh.vertex_data.len(), 6 * size_of::<FaceInstance>());

        let span = BLOCK_SIZE as f32 * CHUNK_DIMENSION as f32;
        for instance in instances(&mesh) {
            assert_eq!(instance.x_scale, 1.0);
            assert_eq!(instance.texture_id, 0.0);
            assert_eq!(
                instance.position,
                [
                    span + 4.5 * BLOCK_SIZE as f32,
                    5.5 * BLOCK_SIZE as f32,
                    6.5 * BLOCK_SIZE as f32
                ]
            );
        }

        let mut rotations: Vec<f32> = instances(&mesh).into_iter().map(|i| i.rotation).collect();
        rotations.sort_by(f32::total_cmp);
        assert_eq!(rotations, vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0]);
    }

    #[test]
    fn identical_neighbours_merge_into_strips() {
        let mut chunk = Chunk::empty();
        for x in 0..CHUNK_DIMENSION as usize {
            chunk.set_block_at(x, 8, 8, Block::new(BlockType::DIRT));
        }

        let mesh = StripMesher.mesh(&chunk, ChunkCoordinate::default());

        // Front, back, bottom and top each merge into one strip along x; the left
        // and right faces are only exposed at the two ends of the row.
        assert_eq!(mesh.instance_count, 6);
        let long_strips = instances(&mesh)
            .iter()
            .filter(|i| i.x_scale == CHUNK_DIMENSION as f32)
            .count();
        assert_eq!(long_strips, 4);
        assert!(instances(&mesh).iter().all(|i| i.texture_id == 1.0));
    }

    #[test]
    fn different_blocks_break_strips() {
        let mut chunk = Chunk::empty();
        chunk.set_block_at(0, 0, 0, Block::new(BlockType::STONE));
        chunk.set_block_at(1, 0, 0, Block::new(BlockType::DIRT));

        let mesh = StripMesher.mesh(&chunk, ChunkCoordinate::default());

        // Front, back, bottom, top: one face each per block. Left of the first
        // block and right of the second are exposed; the shared faces are hidden.
        assert_eq!(mesh.instance_count, 4 * 2 + 2);
    }

    #[test]
    fn full_chunk_only_meshes_its_boundary() {
        let chunk = Chunk::filled(Block::new(BlockType::STONE));
        let mesh = StripMesher.mesh(&chunk, ChunkCoordinate::default());

        // Each of the six boundary planes is 16 rows of one full-length strip.
        assert_eq!(mesh.instance_count, 6 * CHUNK_DIMENSION as u32);
    }
}
