//! # World Generation
//!
//! This module defines the `WorldGenerator` oracle the chunk store calls to fill a
//! fresh chunk, and `NoiseWorldGenerator`, the heightmap terrain the engine uses.
//!
//! Generators must be pure: the same coordinate (and seed) always produces the same
//! chunk, and generation touches no shared mutable state. Many worker threads call
//! `generate` concurrently, and two workers racing to generate the same chunk must
//! produce interchangeable results.

use noise::{Fbm, MultiFractal, NoiseFn, Simplex};

use crate::config::{MAX_CHUNK_Y, MIN_CHUNK_Y};

use super::{
    block::{block_type::BlockType, Block},
    chunk::{Chunk, CHUNK_DIMENSION},
    coordinate::ChunkCoordinate,
};

/// Produces the blocks of a chunk from its coordinate.
pub trait WorldGenerator: Send + Sync {
    /// Generates the chunk at `position`.
    ///
    /// Must be deterministic and free of side effects.
    fn generate(&self, position: ChunkCoordinate) -> Chunk;
}

/// Number of fractal octaves summed per height sample.
pub const FBM_OCTAVES: usize = 4;
/// Frequency multiplier between octaves.
pub const FBM_LACUNARITY: f64 = 2.0;
/// Amplitude multiplier between octaves.
pub const FBM_PERSISTENCE: f64 = 0.5;
/// Scaling factor applied to block coordinates when sampling the noise.
pub const HEIGHT_SCALE_FACTOR: f64 = 0.005;

/// Terrain from a 2D fractal simplex heightmap.
///
/// Each block column is filled from the bottom of the world up to a height that
/// lerps between the lowest and highest block of the world as the noise sample
/// goes from -1 to 1. Columns are stone, except in the two lowest chunk layers
/// which are dirt.
pub struct NoiseWorldGenerator {
    seed: u32,
    fbm: Fbm<Simplex>,
}

impl NoiseWorldGenerator {
    /// Creates a generator for the world with the given seed.
    pub fn new(seed: u32) -> Self {
        let fbm = Fbm::<Simplex>::new(seed)
            .set_octaves(FBM_OCTAVES)
            .set_frequency(1.0)
            .set_lacunarity(FBM_LACUNARITY)
            .set_persistence(FBM_PERSISTENCE);

        Self { seed, fbm }
    }

    /// The world seed this generator was built with.
    pub fn seed(&self) -> u32 {
        self.seed
    }

    /// Height of the terrain surface (in blocks) at a block column.
    pub fn height_at(&self, block_x: i64, block_z: i64) -> f64 {
        let sample = self
            .fbm
            .get([
                block_x as f64 * HEIGHT_SCALE_FACTOR,
                block_z as f64 * HEIGHT_SCALE_FACTOR,
            ])
            .clamp(-1.0, 1.0);

        let min_height = (MIN_CHUNK_Y * CHUNK_DIMENSION) as f64;
        let max_height = (MAX_CHUNK_Y * CHUNK_DIMENSION) as f64;
        min_height + (max_height - min_height) * (sample + 1.0) / 2.0
    }
}

impl WorldGenerator for NoiseWorldGenerator {
    fn generate(&self, position: ChunkCoordinate) -> Chunk {
        let block = if position.y < MIN_CHUNK_Y + 2 {
            Block::new(BlockType::DIRT)
        } else {
            Block::new(BlockType::STONE)
        };

        let dimension = CHUNK_DIMENSION as i64;
        let chunk_floor = position.y as i64 * dimension;
        let mut chunk = Chunk::empty();

        for z in 0..CHUNK_DIMENSION as usize {
            for x in 0..CHUNK_DIMENSION as usize {
                let height = self.height_at(
                    position.x as i64 * dimension + x as i64,
                    position.z as i64 * dimension + z as i64,
                );
                let height_here = (height.floor() as i64 - chunk_floor).clamp(0, dimension);

                for y in 0..height_here as usize {
                    chunk.set_block_at(x, y, z, block);
                }
            }
        }

        chunk
    }
}
