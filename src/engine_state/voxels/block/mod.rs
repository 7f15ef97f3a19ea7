//! # Block Module
//!
//! This module provides the core block-related functionality: block ids, block
//! type definitions and block face handling.

use block_type::{BlockInfo, BlockType};

pub mod block_side;
pub mod block_type;

/// The underlying integer type used to represent block types in chunks.
pub type BlockId = u16;

/// Represents a single voxel block in the world.
///
/// This is a lightweight structure that stores only the block id. Properties such
/// as opacity are looked up from the block type.
///
/// # Memory Layout
/// The `#[repr(C)]` attribute keeps a stable two-byte layout so chunk grids can be
/// viewed as raw bytes.
#[repr(C)]
#[derive(Copy, Clone, Default, PartialEq, Eq, bytemuck::Pod, bytemuck::Zeroable, Debug)]
pub struct Block {
    id: BlockId,
}

impl Block {
    /// The empty block, which fills freshly created chunks.
    pub const EMPTY: Block = Block::new(BlockType::EMPTY);

    /// Creates a new block of the specified type.
    pub const fn new(block_type: BlockType) -> Self {
        Block {
            id: block_type.id(),
        }
    }

    /// The stored id of this block.
    pub const fn id(&self) -> BlockId {
        self.id
    }

    /// The type of this block.
    ///
    /// Blocks can only be built from a `BlockType`, so the id is always known;
    /// an unknown id would read as `EMPTY`.
    pub fn block_type(&self) -> BlockType {
        BlockType::from_id(self.id).unwrap_or_default()
    }

    /// Whether this is the empty block.
    pub const fn is_empty(&self) -> bool {
        self.id == BlockType::EMPTY.id()
    }

    /// Whether this block hides the faces of its neighbours.
    pub fn is_opaque(&self) -> bool {
        self.info().opaque
    }

    fn info(&self) -> &'static BlockInfo {
        self.block_type().info()
    }
}
