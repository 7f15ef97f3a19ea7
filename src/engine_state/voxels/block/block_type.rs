//! # Block Type Module
//!
//! This module defines the different types of blocks in the voxel world and the
//! static per-type properties the mesher needs.

use num_derive::FromPrimitive;
use num_traits::FromPrimitive;

use super::BlockId;

/// Static properties of a block type.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct BlockInfo {
    /// Human-readable name of the block type.
    pub name: &'static str,
    /// Whether the block hides the faces of its neighbours.
    pub opaque: bool,
}

/// Properties of every built-in block type, indexed by `BlockType as usize`.
pub static BUILTIN_BLOCKS: [BlockInfo; 3] = [
    BlockInfo {
        name: "empty",
        opaque: false,
    },
    BlockInfo {
        name: "stone",
        opaque: true,
    },
    BlockInfo {
        name: "dirt",
        opaque: true,
    },
];

/// Enumerates all possible block types in the voxel world.
///
/// The discriminant is the `BlockId` stored in chunks. `FromPrimitive` allows
/// converting stored ids back into the rich enum type.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, FromPrimitive)]
#[repr(u16)]
pub enum BlockType {
    /// No block. Non-solid and never meshed.
    #[default]
    EMPTY = 0,

    /// Stone, the bulk of the terrain.
    STONE = 1,

    /// Dirt, used for the lowest layers of the world.
    DIRT = 2,
}

impl BlockType {
    /// Converts a stored `BlockId` to a `BlockType`.
    ///
    /// # Returns
    /// The corresponding `BlockType`, or `None` for an unknown id
    pub fn from_id(id: BlockId) -> Option<Self> {
        FromPrimitive::from_u16(id)
    }

    /// The id stored in chunks for this type.
    pub const fn id(self) -> BlockId {
        self as BlockId
    }

    /// The static properties of this type.
    pub fn info(self) -> &'static BlockInfo {
        &BUILTIN_BLOCKS[self as usize]
    }
}
