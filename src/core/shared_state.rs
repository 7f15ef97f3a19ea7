use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// A thread-safe, reference-counted container for small state shared between threads.
///
/// `SharedState` wraps an `Arc<Mutex<T>>` and only exposes two operations: taking a
/// snapshot of the value and modifying it in place. Readers never hold the lock past
/// the copy, so a `get` always observes a consistent value even while another thread
/// is writing.
///
/// # Type Parameters
/// - `T`: The contained state, must be `Clone + Send`
///
/// # Examples
///
/// ## Basic Usage
/// ```
/// use voxel_streamer::core::SharedState;
///
/// let state = SharedState::new((0, 0, 0));
///
/// state.modify(|position| position.0 += 1);
///
/// assert_eq!(state.get(), (1, 0, 0));
/// ```
///
/// ## Sharing Between Threads
/// ```
/// # use std::thread;
/// use voxel_streamer::core::SharedState;
///
/// let state = SharedState::new(0u32);
/// let state_clone = state.clone();
///
/// let handle = thread::spawn(move || {
///     state_clone.modify(|value| *value = 7);
/// });
///
/// handle.join().unwrap();
/// assert_eq!(state.get(), 7);
/// ```
///
/// # Performance Considerations
/// - Both `get()` and `modify()` take the same exclusive lock
/// - Closures passed to `modify()` run while the lock is held: they must not block
///   or perform I/O, or every other reader and writer stalls behind them
pub struct SharedState<T: Clone + Send> {
    state: Arc<Mutex<T>>,
}

impl<T: Clone + Send> SharedState<T> {
    /// Creates a new `SharedState` holding the given initial value.
    ///
    /// # Arguments
    /// * `initial_state` - The value to be stored
    ///
    /// # Returns
    /// A new `SharedState` containing the provided value
    pub fn new(initial_state: T) -> Self {
        Self {
            state: Arc::new(Mutex::new(initial_state)),
        }
    }

    /// Returns a snapshot (copy) of the current value.
    ///
    /// A poisoned lock is recovered rather than propagated.
    pub fn get(&self) -> T {
        self.lock().clone()
    }

    /// Runs `f` with mutable access to the value while holding the lock.
    ///
    /// This is the only way to write the state.
    ///
    /// # Arguments
    /// * `f` - The modification to apply; must not block
    pub fn modify<F: FnOnce(&mut T)>(&self, f: F) {
        f(&mut *self.lock());
    }

    fn lock(&self) -> MutexGuard<'_, T> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T: Clone + Send> Clone for SharedState<T> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
        }
    }
}
