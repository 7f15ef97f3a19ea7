//! # Chunk Manager
//!
//! The `Manager` keeps the chunks around the viewer resident. It owns the chunk
//! store and the worker pool, and runs a dedicated thread that ticks at a fixed
//! rate:
//!
//! 1. Snapshot the shared `ViewState`
//! 2. Ask the store to load every missing chunk within the render distance plus
//!    the prefetch margin, on the worker pool
//! 3. Sleep until the next tick boundary
//!
//! Ticks are scheduled against absolute wake times, so time spent scanning doesn't
//! accumulate as drift. A tick that overruns its period restarts the schedule from
//! the current time instead of trying to catch up.
//!
//! ## Shutdown
//!
//! Dropping the `Manager` stops the tick thread, then stops the worker pool
//! (discarding queued loads and waiting for running ones), and only then releases
//! the chunk store.

use std::{
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Arc,
    },
    thread::{self, JoinHandle},
};

use log::{error, info, warn};
use web_time::{Duration, Instant};

use crate::{
    config::StreamingConfig,
    core::SharedState,
    engine_state::{
        chunk_store::ChunkStore,
        rendering::meshing::StripMesher,
        task_management::{PoolError, ThreadPool},
        voxels::{coordinate::ChunkCoordinate, generator::NoiseWorldGenerator},
    },
};

/// What the manager needs to know about the viewer.
///
/// Written by the render thread once per frame, read by the manager once per tick.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ViewState {
    /// The chunk containing the viewer.
    pub chunk: ChunkCoordinate,
}

/// Everything the tick thread works with.
struct TickContext {
    chunk_store: Arc<ChunkStore>,
    view_state: SharedState<ViewState>,
    pool: Arc<ThreadPool>,
    should_stop: Arc<AtomicBool>,
    ticks: Arc<AtomicU64>,
    tick_period: Duration,
    window_radius: i32,
}

/// Streams chunks around the viewer on a background thread.
///
/// # Examples
///
/// ```no_run
/// use voxel_streamer::{
///     config::StreamingConfig,
///     engine_state::{manager::{Manager, ViewState}, voxels::coordinate::ChunkCoordinate},
/// };
///
/// let manager = Manager::new(&StreamingConfig::default(), ViewState::default()).unwrap();
///
/// // Once per frame, publish where the viewer is.
/// manager
///     .shared_state()
///     .modify(|view| view.chunk = ChunkCoordinate::new(1, 0, 0));
/// ```
pub struct Manager {
    chunk_store: Arc<ChunkStore>,
    view_state: SharedState<ViewState>,
    pool: Arc<ThreadPool>,
    should_stop: Arc<AtomicBool>,
    ticks: Arc<AtomicU64>,
    manager_thread: Option<JoinHandle<()>>,
    render_distance: i32,
}

impl Manager {
    /// Starts a manager streaming noise terrain.
    ///
    /// The world seed comes from `config`, or is picked at random when unset.
    ///
    /// # Returns
    /// The running manager, or a `PoolError` if its threads couldn't be started
    pub fn new(config: &StreamingConfig, initial_view: ViewState) -> Result<Self, PoolError> {
        let seed = config.world_seed.unwrap_or_else(|| fastrand::u32(..));
        info!("World seed: {seed}");

        let chunk_store = ChunkStore::new(
            config.capacity(),
            NoiseWorldGenerator::new(seed),
            StripMesher,
        );

        Self::with_store(config, initial_view, Arc::new(chunk_store))
    }

    /// Starts a manager that fills an existing store.
    ///
    /// # Arguments
    /// * `config` - Tick period, window size and worker count
    /// * `initial_view` - Where the viewer starts
    /// * `chunk_store` - The store to keep filled
    pub fn with_store(
        config: &StreamingConfig,
        initial_view: ViewState,
        chunk_store: Arc<ChunkStore>,
    ) -> Result<Self, PoolError> {
        let pool = Arc::new(ThreadPool::new(config.worker_count)?);
        let view_state = SharedState::new(initial_view);
        let should_stop = Arc::new(AtomicBool::new(false));
        let ticks = Arc::new(AtomicU64::new(0));

        let context = TickContext {
            chunk_store: chunk_store.clone(),
            view_state: view_state.clone(),
            pool: pool.clone(),
            should_stop: should_stop.clone(),
            ticks: ticks.clone(),
            tick_period: config.tick_period(),
            window_radius: config.window_radius(),
        };

        let manager_thread = thread::Builder::new()
            .name("chunk-manager".to_string())
            .spawn(move || manager_main(context))
            .map_err(PoolError::Spawn)?;

        info!(
            "Manager started: tick period {:?}, window radius {}",
            config.tick_period(),
            config.window_radius()
        );

        Ok(Manager {
            chunk_store,
            view_state,
            pool,
            should_stop,
            ticks,
            manager_thread: Some(manager_thread),
            render_distance: config.render_distance,
        })
    }

    /// The view state the render thread publishes the viewer's chunk to.
    pub fn shared_state(&self) -> SharedState<ViewState> {
        self.view_state.clone()
    }

    /// The store the manager fills.
    pub fn chunk_store(&self) -> Arc<ChunkStore> {
        self.chunk_store.clone()
    }

    /// Number of ticks completed so far.
    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }

    /// Radius (in chunks) of the window the render thread should draw.
    pub fn render_distance(&self) -> i32 {
        self.render_distance
    }

    /// Number of worker threads loading chunks.
    pub fn worker_count(&self) -> usize {
        self.pool.worker_count()
    }
}

impl Drop for Manager {
    fn drop(&mut self) {
        self.should_stop.store(true, Ordering::Relaxed);

        if let Some(manager_thread) = self.manager_thread.take() {
            if manager_thread.join().is_err() {
                error!("Manager thread exited abnormally");
            }
        }

        self.pool.stop();
        info!("Manager stopped after {} ticks", self.ticks());
    }
}

/// Main loop of the manager thread.
fn manager_main(context: TickContext) {
    let mut next_tick = Instant::now();

    while !context.should_stop.load(Ordering::Relaxed) {
        let view = context.view_state.get();

        if let Err(error) =
            context
                .chunk_store
                .load_n_around_on_pool(&context.pool, view.chunk, context.window_radius)
        {
            warn!("Manager stopping early: {error}");
            break;
        }

        for failure in context.pool.drain_failures() {
            warn!("Chunk load failed: {failure}");
        }

        context.ticks.fetch_add(1, Ordering::Relaxed);

        next_tick += context.tick_period;
        let now = Instant::now();
        if next_tick > now {
            thread::sleep(next_tick - now);
        } else {
            next_tick = now;
        }
    }
}
