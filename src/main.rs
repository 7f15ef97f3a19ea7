//! # Voxel Streamer Entry Point
//!
//! Runs the headless streaming demo from the library's `run()` function.
//!
//! ## Usage
//!
//! ```bash
//! RUST_LOG=info cargo run --release
//! ```
//!
//! Set `VOXEL_STREAMER_CONFIG` to the path of a JSON `StreamingConfig` to override
//! the defaults.

fn main() {
    voxel_streamer::run();
}
