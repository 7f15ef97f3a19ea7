//! # Chunk Module
//!
//! This module provides the `Chunk` struct: a fixed 16x16x16 grid of blocks, the
//! unit of world generation, meshing, caching and eviction.
//!
//! ## Layout
//!
//! Blocks are stored densely in x-major order (x, then y, then z), so the index of
//! the block at `(x, y, z)` is `x + y * CHUNK_DIMENSION + z * CHUNK_PLANE_SIZE`.
//! Every block is stored, including empty ones.

use super::block::Block;

/// The dimension (width, height, depth) of a chunk in blocks.
pub const CHUNK_DIMENSION: i32 = 16;
/// The number of blocks in a single 2D plane of a chunk (CHUNK_DIMENSION²).
pub const CHUNK_PLANE_SIZE: i32 = CHUNK_DIMENSION * CHUNK_DIMENSION;
/// The total number of blocks in a chunk (CHUNK_DIMENSION³).
pub const CHUNK_SIZE: i32 = CHUNK_PLANE_SIZE * CHUNK_DIMENSION;

/// Represents a 16x16x16 collection of voxel blocks.
///
/// A chunk does not know its own position; the chunk store keys it by coordinate.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Chunk {
    blocks: Box<[Block]>,
}

impl Chunk {
    /// Creates a new, completely empty chunk.
    pub fn empty() -> Self {
        Self::filled(Block::EMPTY)
    }

    /// Creates a new chunk with every position set to `block`.
    pub fn filled(block: Block) -> Self {
        Chunk {
            blocks: vec![block; CHUNK_SIZE as usize].into_boxed_slice(),
        }
    }

    /// Gets the block at the specified chunk-relative coordinates.
    ///
    /// # Panics
    /// Panics if any coordinate is `CHUNK_DIMENSION` or more.
    pub fn get_block_at(&self, x: usize, y: usize, z: usize) -> Block {
        self.blocks[Self::index(x, y, z)]
    }

    /// Sets the block at the specified chunk-relative coordinates.
    ///
    /// # Panics
    /// Panics if any coordinate is `CHUNK_DIMENSION` or more.
    pub fn set_block_at(&mut self, x: usize, y: usize, z: usize, block: Block) {
        self.blocks[Self::index(x, y, z)] = block;
    }

    /// Same as `get_block_at`, with the position as an `[x, y, z]` array.
    pub fn block(&self, position: [usize; 3]) -> Block {
        self.get_block_at(position[0], position[1], position[2])
    }

    /// Whether every block in the chunk is empty.
    pub fn is_empty(&self) -> bool {
        self.blocks.iter().all(Block::is_empty)
    }

    /// Number of non-empty blocks.
    pub fn solid_count(&self) -> usize {
        self.blocks.iter().filter(|block| !block.is_empty()).count()
    }

    /// Iterates over every non-empty block with its chunk-relative position.
    pub fn solid_blocks(&self) -> impl Iterator<Item = ([usize; 3], Block)> + '_ {
        self.blocks
            .iter()
            .enumerate()
            .filter(|(_, block)| !block.is_empty())
            .map(|(index, block)| (Self::position(index), *block))
    }

    fn index(x: usize, y: usize, z: usize) -> usize {
        let dimension = CHUNK_DIMENSION as usize;
        assert!(
            x < dimension && y < dimension && z < dimension,
            "block ({x}, {y}, {z}) is outside the chunk"
        );
        x + y * dimension + z * dimension * dimension
    }

    fn position(index: usize) -> [usize; 3] {
        let dimension = CHUNK_DIMENSION as usize;
        [
            index % dimension,
            (index / dimension) % dimension,
            index / (dimension * dimension),
        ]
    }
}

impl Default for Chunk {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_state::voxels::block::block_type::BlockType;

    #[test]
    fn new_chunks_are_empty() {
        let chunk = Chunk::empty();
        assert!(chunk.is_empty());
        assert_eq!(chunk.solid_count(), 0);
    }

    #[test]
    fn blocks_are_addressed_independently() {
        let mut chunk = Chunk::empty();
        chunk.set_block_at(15, 0, 3, Block::new(BlockType::STONE));
        chunk.set_block_at(0, 15, 3, Block::new(BlockType::DIRT));

        assert_eq!(chunk.get_block_at(15, 0, 3).block_type(), BlockType::STONE);
        assert_eq!(chunk.get_block_at(0, 15, 3).block_type(), BlockType::DIRT);
        assert!(chunk.get_block_at(3, 0, 15).is_empty());
        assert_eq!(chunk.solid_count(), 2);

        let positions: Vec<[usize; 3]> = chunk.solid_blocks().map(|(p, _)| p).collect();
        assert_eq!(positions, vec![[15, 0, 3], [0, 15, 3]]);
    }

    #[test]
    #[should_panic(expected = "outside the chunk")]
    fn out_of_range_access_panics() {
        Chunk::empty().get_block_at(16, 0, 0);
    }
}
