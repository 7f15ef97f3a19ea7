#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![warn(rustdoc::invalid_rust_codeblocks)]

//! # Voxel Streamer
//!
//! Streams a bounded but effectively endless voxel world around a moving viewer.
//!
//! A background manager thread decides which chunks must be resident near the
//! viewer, a worker pool generates and meshes the missing ones, and a
//! capacity-bounded LRU cache holds the results until they fall out of use.
//! The render thread reads the cache every frame to build its draw list.
//!
//! ## Key Modules
//!
//! * `config` - Engine constants and the runtime `StreamingConfig`
//! * `core` - Shared-state container used between threads
//! * `engine_state` - Chunk store, worker pool, manager, voxels and meshing
//!
//! ## Usage
//!
//! ```no_run
//! fn main() {
//!     voxel_streamer::run();
//! }
//! ```

use cgmath::Point3;
use log::{error, info, warn};
use web_time::{Duration, Instant};

use config::{StreamingConfig, BLOCK_SIZE, CONFIG_PATH_ENV};
use engine_state::{
    manager::{Manager, ViewState},
    rendering::DrawList,
    voxels::coordinate::ChunkCoordinate,
};

pub mod config;
pub mod core;
pub mod engine_state;

/// How long the headless demo runs.
const DEMO_DURATION: Duration = Duration::from_secs(5);
/// Simulated frame time of the headless demo.
const FRAME_DURATION: Duration = Duration::from_millis(16);
/// Viewer speed along +x, in blocks per second.
const VIEWER_SPEED: f32 = 64.0;

/// Loads the config named by `VOXEL_STREAMER_CONFIG`, falling back to defaults.
fn load_config() -> StreamingConfig {
    let Ok(path) = std::env::var(CONFIG_PATH_ENV) else {
        return StreamingConfig::default();
    };

    match StreamingConfig::from_json_file(&path) {
        Ok(config) => {
            info!("Loaded config from {path}");
            config
        }
        Err(error) => {
            warn!("Ignoring config {path}: {error}");
            StreamingConfig::default()
        }
    }
}

/// Runs the headless streaming demo.
///
/// Starts a manager, flies a simulated viewer along +x while gathering a draw
/// list every frame, then shuts everything down.
pub fn run() {
    let mut log_builder = env_logger::Builder::new();
    log_builder
        .target(env_logger::Target::Stdout)
        .parse_env("RUST_LOG")
        .init();

    info!("Logger initialized");

    let config = load_config();
    let manager = match Manager::new(&config, ViewState::default()) {
        Ok(manager) => manager,
        Err(error) => {
            error!("Couldn't start the chunk manager: {error}");
            return;
        }
    };

    let view_state = manager.shared_state();
    let chunk_store = manager.chunk_store();
    let start = Instant::now();
    let mut last_report = start;

    while start.elapsed() < DEMO_DURATION {
        let frame_start = Instant::now();

        let viewer = Point3::new(
            start.elapsed().as_secs_f32() * VIEWER_SPEED * BLOCK_SIZE as f32,
            0.0,
            0.0,
        );
        let chunk = ChunkCoordinate::containing(viewer);
        view_state.modify(|view| view.chunk = chunk);

        let draw_list = DrawList::gather(&chunk_store, chunk, manager.render_distance());

        if last_report.elapsed() >= Duration::from_secs(1) {
            last_report = Instant::now();
            let resident = chunk_store.use_handle(|handle| handle.len());
            info!(
                "Viewer at {chunk:?}: {} chunks / {} instances drawn, {resident} resident, {} ticks{}",
                draw_list.chunk_count,
                draw_list.instance_count,
                manager.ticks(),
                if draw_list.still_loading { ", world still loading" } else { "" }
            );
        }

        if let Some(remaining) = FRAME_DURATION.checked_sub(frame_start.elapsed()) {
            std::thread::sleep(remaining);
        }
    }

    drop(manager);
    info!("Demo finished");
}
