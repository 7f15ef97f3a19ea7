//! # Chunk Coordinates
//!
//! This module defines `ChunkCoordinate`, the integer position of a chunk, and the
//! packing and hashing scheme used to key the chunk cache.
//!
//! ## Key Layout
//!
//! A coordinate is packed into 64 bits as
//!
//! ```text
//! MSB [ x: 24 bits ][ y: 16 bits ][ z: 24 bits ] LSB
//! ```
//!
//! which is lossless for every coordinate inside `CoordinateBounds::WORLD`. Nearby
//! chunks produce keys that differ only in a few low bits of each field, so the
//! packed key is run through a 64-bit finalizer mix (`mix64`) before it is used for
//! hash-table bucketing.
//!
//! Coordinates outside the bounds still pack deterministically, but to truncated
//! bit patterns. Range validation is the caller's job.

use std::hash::{BuildHasherDefault, Hash, Hasher};

use cgmath::Point3;
use serde::{Deserialize, Serialize};

use crate::config::{
    BLOCK_SIZE, MAX_CHUNK_X, MAX_CHUNK_Y, MAX_CHUNK_Z, MIN_CHUNK_X, MIN_CHUNK_Y, MIN_CHUNK_Z,
};
use crate::engine_state::voxels::chunk::CHUNK_DIMENSION;

const X_BITS: u32 = 24;
const Y_BITS: u32 = 16;
const Z_BITS: u32 = 24;

const X_MASK: u64 = (1 << X_BITS) - 1;
const Y_MASK: u64 = (1 << Y_BITS) - 1;
const Z_MASK: u64 = (1 << Z_BITS) - 1;

/// The position of a chunk, in chunk units (not blocks, not world units).
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkCoordinate {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl ChunkCoordinate {
    /// Creates a coordinate from its three components.
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Returns the chunk containing a world-space position.
    ///
    /// World positions are in world units: one block spans `BLOCK_SIZE` units and
    /// one chunk spans `BLOCK_SIZE * CHUNK_DIMENSION`.
    ///
    /// # Examples
    ///
    /// ```
    /// use cgmath::Point3;
    /// use voxel_streamer::engine_state::voxels::coordinate::ChunkCoordinate;
    ///
    /// let chunk = ChunkCoordinate::containing(Point3::new(-1.0, 0.0, 1280.0));
    /// assert_eq!(chunk, ChunkCoordinate::new(-1, 0, 1));
    /// ```
    pub fn containing(world_position: Point3<f32>) -> Self {
        let chunk_span = (BLOCK_SIZE as f32) * (CHUNK_DIMENSION as f32);
        Self {
            x: (world_position.x / chunk_span).floor() as i32,
            y: (world_position.y / chunk_span).floor() as i32,
            z: (world_position.z / chunk_span).floor() as i32,
        }
    }

    /// Returns this coordinate moved by the given per-axis offsets.
    pub const fn offset(self, dx: i32, dy: i32, dz: i32) -> Self {
        Self::new(self.x + dx, self.y + dy, self.z + dz)
    }

    /// Whether the coordinate lies inside the world bounds on every axis.
    pub fn is_valid(&self) -> bool {
        CoordinateBounds::WORLD.contains(*self)
    }

    /// Packs this coordinate into its cache key.
    pub const fn key(self) -> ChunkKey {
        ChunkKey::pack(self.x, self.y, self.z)
    }
}

impl Hash for ChunkCoordinate {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.key().raw());
    }
}

impl From<Point3<i32>> for ChunkCoordinate {
    fn from(value: Point3<i32>) -> Self {
        Self::new(value.x, value.y, value.z)
    }
}

impl From<ChunkCoordinate> for Point3<i32> {
    fn from(value: ChunkCoordinate) -> Self {
        Point3::new(value.x, value.y, value.z)
    }
}

/// An inclusive, axis-aligned box of legal chunk coordinates.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoordinateBounds {
    pub min: ChunkCoordinate,
    pub max: ChunkCoordinate,
}

impl CoordinateBounds {
    /// The bounds of the whole world, from the `config` constants.
    pub const WORLD: Self = Self {
        min: ChunkCoordinate::new(MIN_CHUNK_X, MIN_CHUNK_Y, MIN_CHUNK_Z),
        max: ChunkCoordinate::new(MAX_CHUNK_X, MAX_CHUNK_Y, MAX_CHUNK_Z),
    };

    /// Creates bounds from inclusive corners.
    ///
    /// # Panics
    /// Panics if `min` exceeds `max` on any axis, or if either corner can't be
    /// packed losslessly into a `ChunkKey`.
    pub fn new(min: ChunkCoordinate, max: ChunkCoordinate) -> Self {
        assert!(
            min.x <= max.x && min.y <= max.y && min.z <= max.z,
            "inverted coordinate bounds {min:?}..={max:?}"
        );
        let packable = Self::packable();
        assert!(
            packable.contains(min) && packable.contains(max),
            "coordinate bounds {min:?}..={max:?} exceed the packable key range"
        );
        Self { min, max }
    }

    /// Whether x and y and z are all in range.
    pub fn contains(&self, coordinate: ChunkCoordinate) -> bool {
        self.contains_horizontal(coordinate)
            && (self.min.y..=self.max.y).contains(&coordinate.y)
    }

    /// Whether x and z are in range, ignoring y.
    pub fn contains_horizontal(&self, coordinate: ChunkCoordinate) -> bool {
        (self.min.x..=self.max.x).contains(&coordinate.x)
            && (self.min.z..=self.max.z).contains(&coordinate.z)
    }

    /// The cube of coordinates within `radius` of `center` on every axis, clamped
    /// to these bounds. x varies fastest, then z, then y.
    ///
    /// A negative radius is treated as zero.
    pub fn window(
        &self,
        center: ChunkCoordinate,
        radius: i32,
    ) -> impl Iterator<Item = ChunkCoordinate> {
        let radius = radius.max(0);
        let span = |middle: i32, min: i32, max: i32| {
            middle.saturating_sub(radius).max(min)..=middle.saturating_add(radius).min(max)
        };
        let xs = span(center.x, self.min.x, self.max.x);
        let ys = span(center.y, self.min.y, self.max.y);
        let zs = span(center.z, self.min.z, self.max.z);

        ys.flat_map(move |y| {
            let xs = xs.clone();
            zs.clone()
                .flat_map(move |z| xs.clone().map(move |x| ChunkCoordinate::new(x, y, z)))
        })
    }

    /// The largest bounds whose coordinates pack without loss.
    fn packable() -> Self {
        Self {
            min: ChunkCoordinate::new(
                -(1 << (X_BITS - 1)),
                -(1 << (Y_BITS - 1)),
                -(1 << (Z_BITS - 1)),
            ),
            max: ChunkCoordinate::new(
                (1 << (X_BITS - 1)) - 1,
                (1 << (Y_BITS - 1)) - 1,
                (1 << (Z_BITS - 1)) - 1,
            ),
        }
    }
}

impl Default for CoordinateBounds {
    fn default() -> Self {
        Self::WORLD
    }
}

/// A chunk coordinate bit-packed into 64 bits.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkKey(u64);

impl ChunkKey {
    /// Packs `(x, y, z)` as `x:24 | y:16 | z:24`, most significant first.
    pub const fn pack(x: i32, y: i32, z: i32) -> Self {
        let mut packed = (x as u32 as u64) & X_MASK;
        packed <<= Y_BITS;
        packed |= (y as u32 as u64) & Y_MASK;
        packed <<= Z_BITS;
        packed |= (z as u32 as u64) & Z_MASK;
        Self(packed)
    }

    /// Recovers the coordinate, sign-extending each field.
    pub const fn unpack(self) -> ChunkCoordinate {
        let x = (self.0 >> (Y_BITS + Z_BITS)) & X_MASK;
        let y = (self.0 >> Z_BITS) & Y_MASK;
        let z = self.0 & Z_MASK;
        ChunkCoordinate::new(
            ((x as u32) << (32 - X_BITS)) as i32 >> (32 - X_BITS),
            y as u16 as i16 as i32,
            ((z as u32) << (32 - Z_BITS)) as i32 >> (32 - Z_BITS),
        )
    }

    /// The raw packed bits.
    pub const fn raw(self) -> u64 {
        self.0
    }

    /// The well-distributed hash of this key, for table bucketing.
    pub const fn mixed(self) -> u64 {
        mix64(self.0)
    }
}

/// David Stafford's Mix13 variant of the MurmurHash3 64-bit finalizer.
///
/// An invertible avalanche mix: flipping any single input bit flips each output
/// bit with probability close to one half.
pub const fn mix64(value: u64) -> u64 {
    let mut hash = value;
    hash = (hash ^ (hash >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    hash = (hash ^ (hash >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    hash ^ (hash >> 31)
}

/// A `Hasher` for values that hash as a single packed `u64` (such as
/// `ChunkCoordinate`), finishing with `mix64`.
///
/// Arbitrary byte input is folded through the same mix, so the hasher stays
/// correct for any key type, but it is only fast for single-`u64` keys.
#[derive(Default)]
pub struct ChunkKeyHasher {
    state: u64,
}

impl Hasher for ChunkKeyHasher {
    fn finish(&self) -> u64 {
        self.state
    }

    fn write(&mut self, bytes: &[u8]) {
        for chunk in bytes.chunks(8) {
            let mut word = [0u8; 8];
            word[..chunk.len()].copy_from_slice(chunk);
            self.write_u64(u64::from_le_bytes(word));
        }
    }

    fn write_u64(&mut self, value: u64) {
        self.state = mix64(self.state ^ value);
    }
}

/// Builds `ChunkKeyHasher`s for hash maps keyed by chunk coordinate.
pub type ChunkKeyBuildHasher = BuildHasherDefault<ChunkKeyHasher>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::hash::BuildHasher;

    fn corner_coordinates() -> Vec<ChunkCoordinate> {
        let bounds = CoordinateBounds::WORLD;
        let mut corners = Vec::new();
        for x in [bounds.min.x, -1, 0, 1, bounds.max.x] {
            for y in [bounds.min.y, -1, 0, 1, bounds.max.y] {
                for z in [bounds.min.z, -1, 0, 1, bounds.max.z] {
                    corners.push(ChunkCoordinate::new(x, y, z));
                }
            }
        }
        corners
    }

    #[test]
    fn packing_is_injective_on_valid_coordinates() {
        let mut coordinates = corner_coordinates();
        for x in -4..=4 {
            for y in MIN_CHUNK_Y..=MAX_CHUNK_Y {
                for z in -4..=4 {
                    coordinates.push(ChunkCoordinate::new(x, y, z));
                }
            }
        }
        coordinates.sort_by_key(|c| (c.x, c.y, c.z));
        coordinates.dedup();

        let keys: HashSet<ChunkKey> = coordinates.iter().map(|c| c.key()).collect();
        assert_eq!(keys.len(), coordinates.len());
    }

    #[test]
    fn unpack_recovers_signed_fields() {
        for coordinate in corner_coordinates() {
            assert_eq!(coordinate.key().unpack(), coordinate);
        }

        let packable = CoordinateBounds::packable();
        assert_eq!(packable.min.key().unpack(), packable.min);
        assert_eq!(packable.max.key().unpack(), packable.max);
    }

    #[test]
    fn fields_land_in_their_bit_ranges() {
        assert_eq!(ChunkKey::pack(0, 0, 1).raw(), 1);
        assert_eq!(ChunkKey::pack(0, 1, 0).raw(), 1 << 24);
        assert_eq!(ChunkKey::pack(1, 0, 0).raw(), 1 << 40);
        assert_eq!(ChunkKey::pack(-1, -1, -1).raw(), u64::MAX);
    }

    #[test]
    fn mix_avalanches_single_bit_flips() {
        let base = ChunkCoordinate::new(3, 0, -7).key().raw();
        let mut total_flipped = 0;
        for bit in 0..64 {
            let flipped = (mix64(base) ^ mix64(base ^ (1 << bit))).count_ones();
            assert_ne!(flipped, 0, "bit {bit} collided");
            total_flipped += flipped;
        }
        let average = total_flipped as f64 / 64.0;
        assert!((24.0..=40.0).contains(&average), "average flip count {average}");
    }

    #[test]
    fn nearby_chunks_spread_across_buckets() {
        let build_hasher = ChunkKeyBuildHasher::default();
        let buckets: HashSet<u64> = (0..8)
            .flat_map(|x| (0..8).map(move |z| ChunkCoordinate::new(x, 0, z)))
            .map(|coordinate| build_hasher.hash_one(coordinate) & 0xFF)
            .collect();

        // 64 neighbouring chunks in 256 buckets; raw keys would use only 8 low-bit patterns.
        assert!(buckets.len() > 40, "only {} distinct buckets", buckets.len());
    }

    #[test]
    fn coordinate_hash_is_the_mixed_key() {
        let coordinate = ChunkCoordinate::new(-12, 1, 99);
        let hash = ChunkKeyBuildHasher::default().hash_one(coordinate);
        assert_eq!(hash, coordinate.key().mixed());
    }

    #[test]
    fn world_positions_floor_into_chunks() {
        let span = (BLOCK_SIZE as f32) * (CHUNK_DIMENSION as f32);

        assert_eq!(
            ChunkCoordinate::containing(Point3::new(0.0, 0.0, 0.0)),
            ChunkCoordinate::new(0, 0, 0)
        );
        assert_eq!(
            ChunkCoordinate::containing(Point3::new(span - 0.5, -0.5, -span)),
            ChunkCoordinate::new(0, -1, -1)
        );
        assert_eq!(
            ChunkCoordinate::containing(Point3::new(2.5 * span, 0.0, -1.5 * span)),
            ChunkCoordinate::new(2, 0, -2)
        );
    }

    #[test]
    fn bounds_check_each_axis() {
        let bounds = CoordinateBounds::WORLD;

        assert!(bounds.contains(ChunkCoordinate::new(MAX_CHUNK_X, MIN_CHUNK_Y, MIN_CHUNK_Z)));
        assert!(!bounds.contains(ChunkCoordinate::new(0, MAX_CHUNK_Y + 1, 0)));
        assert!(bounds.contains_horizontal(ChunkCoordinate::new(0, MAX_CHUNK_Y + 1, 0)));
        assert!(!bounds.contains_horizontal(ChunkCoordinate::new(MAX_CHUNK_X + 1, 0, 0)));
        assert!(!ChunkCoordinate::new(0, 0, MIN_CHUNK_Z - 1).is_valid());
    }

    #[test]
    #[should_panic(expected = "packable key range")]
    fn bounds_beyond_key_range_are_rejected() {
        CoordinateBounds::new(
            ChunkCoordinate::new(0, 0, 0),
            ChunkCoordinate::new(1 << 23, 0, 0),
        );
    }

    #[test]
    fn windows_are_clamped_cubes() {
        let bounds = CoordinateBounds::WORLD;

        let window: Vec<_> = bounds.window(ChunkCoordinate::new(0, 0, 0), 1).collect();
        assert_eq!(window.len(), 27);
        assert_eq!(window[0], ChunkCoordinate::new(-1, -1, -1));
        assert_eq!(window[1], ChunkCoordinate::new(0, -1, -1));
        assert_eq!(window[26], ChunkCoordinate::new(1, 1, 1));

        // y is cut at the top of the world, x at its edge.
        let edge = ChunkCoordinate::new(MAX_CHUNK_X, MAX_CHUNK_Y, 0);
        assert_eq!(bounds.window(edge, 2).count(), 3 * 3 * 5);
        assert!(bounds.window(edge, 2).all(|c| bounds.contains(c)));

        assert_eq!(bounds.window(ChunkCoordinate::new(5, 0, 5), -1).count(), 1);
        assert_eq!(
            bounds.window(ChunkCoordinate::new(0, MAX_CHUNK_Y + 10, 0), 1).count(),
            0
        );
    }
}
