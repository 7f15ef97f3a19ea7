//! # Configuration
//!
//! Compile-time constants that shape the streamed world, plus `StreamingConfig`,
//! a runtime value seeded from those constants.
//!
//! The constants are what the engine ships with. `StreamingConfig` exists so that
//! the same manager can be started with a tiny window and cache in tests or demos,
//! and so that a JSON override file can be dropped next to the binary without
//! recompiling.
//!
//! ## Coordinate bounds
//!
//! Chunk x and z are packed into 24 bits and chunk y into 16 bits when keying the
//! chunk cache, so the bounds below must stay within `-2^23..2^23 - 1` and
//! `-2^15..2^15 - 1` respectively.

use std::{
    fmt, fs, io,
    num::NonZeroUsize,
    path::Path,
    thread,
};

use serde::{Deserialize, Serialize};
use web_time::Duration;

/// Size of a single block in world units.
pub const BLOCK_SIZE: u32 = 80;

/// Period of one manager tick (20 ticks per second).
pub const MGR_TICK_DURATION: Duration = Duration::from_millis(1000 / 20);

/// Smallest chunk x index that can exist.
pub const MIN_CHUNK_X: i32 = -8_000_000;
/// Largest chunk x index that can exist.
pub const MAX_CHUNK_X: i32 = 8_000_000 - 1;
/// Smallest chunk z index that can exist.
pub const MIN_CHUNK_Z: i32 = -8_000_000;
/// Largest chunk z index that can exist.
pub const MAX_CHUNK_Z: i32 = 8_000_000 - 1;

/// Smallest chunk y index that can exist.
pub const MIN_CHUNK_Y: i32 = -3;
/// Largest chunk y index that can exist.
pub const MAX_CHUNK_Y: i32 = 2;

/// Render distance in chunks. Should not be more than a few thousand.
pub const RENDER_DISTANCE: i32 = 10;

/// Extra chunks loaded beyond the render distance so that chunks are resident
/// before they come into view.
pub const PREFETCH_MARGIN: i32 = 2;

/// The maximum number of chunks that can be loaded at once.
///
/// Twice the volume of the prefetch window, so that a full window stays resident
/// while the next one (after the viewer crosses a chunk boundary) is loading.
pub const MAX_CHUNKS_LOADED: usize = cache_capacity_for(RENDER_DISTANCE, PREFETCH_MARGIN);

/// Environment variable holding an optional path to a JSON `StreamingConfig`.
pub const CONFIG_PATH_ENV: &str = "VOXEL_STREAMER_CONFIG";

/// Cache capacity needed to hold two full prefetch windows.
pub const fn cache_capacity_for(render_distance: i32, prefetch_margin: i32) -> usize {
    let side = (2 * (render_distance + prefetch_margin) + 1) as usize;
    2 * side * side * side
}

/// Number of chunk worker threads: hardware parallelism minus one (for the
/// render thread), never less than one.
pub fn manager_thread_count() -> usize {
    thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .saturating_sub(1)
        .max(1)
}

/// Runtime streaming parameters.
///
/// Every field has a default derived from the constants in this module, so a
/// config file only needs to name the values it overrides.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamingConfig {
    /// Manager tick period in milliseconds.
    pub tick_period_ms: u64,
    /// Radius (in chunks) of the window the render thread draws.
    pub render_distance: i32,
    /// Extra radius the manager loads beyond the render distance.
    pub prefetch_margin: i32,
    /// Maximum number of resident chunks.
    pub cache_capacity: usize,
    /// Number of chunk worker threads.
    pub worker_count: usize,
    /// World generation seed. A random seed is chosen when unset.
    pub world_seed: Option<u32>,
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            tick_period_ms: MGR_TICK_DURATION.as_millis() as u64,
            render_distance: RENDER_DISTANCE,
            prefetch_margin: PREFETCH_MARGIN,
            cache_capacity: MAX_CHUNKS_LOADED,
            worker_count: manager_thread_count(),
            world_seed: None,
        }
    }
}

impl StreamingConfig {
    /// Loads a config from a JSON file. Missing fields keep their defaults.
    ///
    /// # Arguments
    /// * `path` - Path of the JSON file
    ///
    /// # Returns
    /// The parsed config, or a `ConfigError` if the file can't be read or parsed
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Parses a config from a JSON string. Missing fields keep their defaults.
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    /// The manager tick period.
    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.tick_period_ms)
    }

    /// Radius of the window the manager keeps resident around the viewer.
    pub fn window_radius(&self) -> i32 {
        self.render_distance + self.prefetch_margin
    }

    /// Cache capacity, clamped to at least one entry.
    pub fn capacity(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.cache_capacity).unwrap_or(NonZeroUsize::MIN)
    }
}

/// Errors raised while loading a `StreamingConfig`.
#[derive(Debug)]
pub enum ConfigError {
    /// The config file couldn't be read.
    Io(io::Error),
    /// The config file isn't valid JSON for a `StreamingConfig`.
    Parse(serde_json::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(error) => write!(f, "failed to read streaming config: {error}"),
            Self::Parse(error) => write!(f, "failed to parse streaming config: {error}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(error) => Some(error),
            Self::Parse(error) => Some(error),
        }
    }
}

impl From<io::Error> for ConfigError {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(value: serde_json::Error) -> Self {
        Self::Parse(value)
    }
}
