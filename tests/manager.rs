use std::{
    num::NonZeroUsize,
    sync::Arc,
    thread,
};

use voxel_streamer::{
    config::StreamingConfig,
    engine_state::{
        chunk_store::ChunkStore,
        manager::{Manager, ViewState},
        rendering::{meshing::ChunkMesh, ChunkMesher},
        voxels::{
            chunk::Chunk,
            coordinate::{ChunkCoordinate, CoordinateBounds},
            generator::WorldGenerator,
        },
    },
};
use web_time::{Duration, Instant};

struct SlowWorld(Duration);

impl WorldGenerator for SlowWorld {
    fn generate(&self, _position: ChunkCoordinate) -> Chunk {
        thread::sleep(self.0);
        Chunk::empty()
    }
}

struct OneInstanceMesher;

impl ChunkMesher for OneInstanceMesher {
    fn mesh(&self, _chunk: &Chunk, _position: ChunkCoordinate) -> ChunkMesh {
        ChunkMesh {
            vertex_data: vec![0; 4],
            instance_count: 1,
        }
    }
}

fn small_config() -> StreamingConfig {
    StreamingConfig {
        tick_period_ms: 5,
        render_distance: 1,
        prefetch_margin: 0,
        cache_capacity: 64,
        worker_count: 2,
        world_seed: Some(1),
    }
}

fn flat_store(generation_time: Duration) -> Arc<ChunkStore> {
    Arc::new(ChunkStore::with_bounds(
        NonZeroUsize::new(64).unwrap(),
        CoordinateBounds::new(
            ChunkCoordinate::new(-50, 0, -50),
            ChunkCoordinate::new(50, 0, 50),
        ),
        SlowWorld(generation_time),
        OneInstanceMesher,
    ))
}

fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let start = Instant::now();
    while start.elapsed() < timeout {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(2));
    }
    condition()
}

#[test]
fn manager_keeps_the_window_around_the_viewer_loaded() {
    let store = flat_store(Duration::ZERO);
    let manager = Manager::with_store(&small_config(), ViewState::default(), store.clone()).unwrap();

    assert!(wait_until(Duration::from_secs(10), || {
        store.use_handle(|handle| handle.len()) == 9
    }));
    assert!(manager.ticks() >= 1);
    assert_eq!(manager.worker_count(), 2);

    manager
        .shared_state()
        .modify(|view| view.chunk = ChunkCoordinate::new(10, 0, 10));

    assert!(wait_until(Duration::from_secs(10), || {
        store.use_handle(|handle| {
            CoordinateBounds::WORLD
                .window(ChunkCoordinate::new(10, 0, 10), 1)
                .filter(|position| position.y == 0)
                .all(|position| handle.contains(position))
        })
    }));
}

#[test]
fn shutdown_waits_for_every_thread() {
    let store = flat_store(Duration::ZERO);
    let manager = Manager::with_store(&small_config(), ViewState::default(), store.clone()).unwrap();

    assert!(wait_until(Duration::from_secs(10), || manager.ticks() >= 1));
    drop(manager);

    // Every job and thread that held the store is gone.
    assert_eq!(Arc::strong_count(&store), 1);
    assert_eq!(store.in_flight_len(), 0);
}

#[test]
fn shutdown_with_loads_in_flight_does_not_crash() {
    let store = flat_store(Duration::from_millis(30));
    let mut config = small_config();
    config.render_distance = 4;
    config.worker_count = 1;

    let manager = Manager::with_store(&config, ViewState::default(), store.clone()).unwrap();
    assert!(wait_until(Duration::from_secs(10), || manager.ticks() >= 1));
    drop(manager);

    assert_eq!(Arc::strong_count(&store), 1);
    assert_eq!(store.in_flight_len(), 0);
    let resident = store.use_handle(|handle| handle.len());
    assert!(resident < 81, "{resident} chunks loaded before shutdown");
}

#[test]
fn manager_with_default_store_starts_and_stops() {
    let manager = Manager::new(&small_config(), ViewState::default()).unwrap();
    assert!(wait_until(Duration::from_secs(10), || manager.ticks() >= 2));
    assert_eq!(manager.render_distance(), 1);
    assert_eq!(manager.chunk_store().use_handle(|handle| handle.capacity()), 64);
}
