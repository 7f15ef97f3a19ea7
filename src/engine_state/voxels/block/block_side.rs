//! # Block Side Module
//!
//! This module defines the six faces of a voxel block and the axis geometry the
//! mesher needs to walk them.

/// Represents the six possible faces of a voxel block.
///
/// The discriminant is the rotation index the instanced face shader expects, so
/// the order here must not change.
#[derive(PartialEq, Eq, Hash, Copy, Clone, Debug)]
pub enum BlockSide {
    /// The front face (facing negative Z)
    FRONT = 0,

    /// The left face (facing negative X)
    LEFT = 1,

    /// The back face (facing positive Z)
    BACK = 2,

    /// The right face (facing positive X)
    RIGHT = 3,

    /// The bottom face (facing negative Y)
    BOTTOM = 4,

    /// The top face (facing positive Y)
    TOP = 5,
}

/// Axis index of X in `[x, y, z]` arrays.
pub const AXIS_X: usize = 0;
/// Axis index of Y in `[x, y, z]` arrays.
pub const AXIS_Y: usize = 1;
/// Axis index of Z in `[x, y, z]` arrays.
pub const AXIS_Z: usize = 2;

impl BlockSide {
    /// Returns an array containing all six block faces in rotation order.
    pub fn all() -> [BlockSide; 6] {
        [
            BlockSide::FRONT,
            BlockSide::LEFT,
            BlockSide::BACK,
            BlockSide::RIGHT,
            BlockSide::BOTTOM,
            BlockSide::TOP,
        ]
    }

    /// Which way the face points along its normal axis: `-1` or `1`.
    pub fn direction(self) -> i32 {
        match self {
            BlockSide::FRONT | BlockSide::LEFT | BlockSide::BOTTOM => -1,
            BlockSide::BACK | BlockSide::RIGHT | BlockSide::TOP => 1,
        }
    }

    /// The axis the face's normal lies on.
    pub fn normal_axis(self) -> usize {
        match self {
            BlockSide::FRONT | BlockSide::BACK => AXIS_Z,
            BlockSide::LEFT | BlockSide::RIGHT => AXIS_X,
            BlockSide::BOTTOM | BlockSide::TOP => AXIS_Y,
        }
    }

    /// The axis along which adjacent faces of this side are merged into strips.
    pub fn run_axis(self) -> usize {
        match self {
            BlockSide::LEFT | BlockSide::RIGHT => AXIS_Z,
            _ => AXIS_X,
        }
    }

    /// The axis that is neither the normal nor the run axis.
    pub fn cross_axis(self) -> usize {
        3 - self.normal_axis() - self.run_axis()
    }
}
