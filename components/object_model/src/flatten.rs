//! Background shape flattening.
//!
//! Flattening turns a shape's O(depth) parent walk into an O(1) table. Its
//! cost grows with the depth of the chain, so it is kept off the property
//! write path: shapes are queued here and a background worker builds their
//! tables.
//!
//! # Worker protocol
//!
//! The pending queue and the `running` flag live behind one lock:
//!
//! - `request` pushes a shape and, in the same critical section, decides
//!   whether a worker must be spawned (`running` was false) and sets the flag.
//! - The worker pops shapes one at a time. When it observes the queue empty it
//!   clears `running` in that same critical section and exits.
//!
//! Because "queue observed empty" and "flag cleared" happen atomically with
//! respect to `request`, a shape can never be left in the queue without a
//! worker to drain it.

use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

use once_cell::sync::Lazy;
use parking_lot::{Condvar, Mutex, RwLock};
use serde::{Deserialize, Serialize};

use crate::shape::Shape;

static GLOBAL_FLATTENER: Lazy<Arc<ShapeFlattener>> =
    Lazy::new(|| ShapeFlattener::new(FlattenConfig::default()));

/// Configuration for shape flattening.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlattenConfig {
    /// Flatten on a background worker thread; otherwise flatten inline when
    /// requested.
    pub use_worker_thread: bool,
    /// Minimum shape depth at which a slow lookup requests flattening.
    pub min_depth: u32,
}

impl Default for FlattenConfig {
    fn default() -> Self {
        FlattenConfig {
            use_worker_thread: true,
            min_depth: 8,
        }
    }
}

/// Counters describing flattener activity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlattenStats {
    /// Shapes handed to `request`
    pub requests: usize,
    /// Tables installed (ancestors included)
    pub tables_installed: usize,
    /// Worker threads started
    pub workers_spawned: usize,
    /// Flattens that panicked and were abandoned
    pub failures: usize,
}

#[derive(Default)]
struct QueueState {
    pending: VecDeque<Arc<Shape>>,
    running: bool,
}

/// Queue of shapes awaiting flattening plus its single worker.
pub struct ShapeFlattener {
    config: RwLock<FlattenConfig>,
    state: Mutex<QueueState>,
    idle: Condvar,
    requests: AtomicUsize,
    tables_installed: AtomicUsize,
    workers_spawned: AtomicUsize,
    failures: AtomicUsize,
}

impl ShapeFlattener {
    /// Creates a flattener with its own queue.
    pub fn new(config: FlattenConfig) -> Arc<Self> {
        Arc::new(ShapeFlattener {
            config: RwLock::new(config),
            state: Mutex::new(QueueState::default()),
            idle: Condvar::new(),
            requests: AtomicUsize::new(0),
            tables_installed: AtomicUsize::new(0),
            workers_spawned: AtomicUsize::new(0),
            failures: AtomicUsize::new(0),
        })
    }

    /// The process-wide flattener used by [`Shape::lookup`].
    pub fn global() -> &'static Arc<ShapeFlattener> {
        &GLOBAL_FLATTENER
    }

    /// Replaces the configuration. Shapes already queued are unaffected.
    pub fn set_config(&self, config: FlattenConfig) {
        *self.config.write() = config;
    }

    /// Current configuration.
    pub fn config(&self) -> FlattenConfig {
        self.config.read().clone()
    }

    /// Depth at which lookups start requesting flattening.
    #[inline]
    pub fn min_depth(&self) -> u32 {
        self.config.read().min_depth
    }

    /// Queue `shape` (and implicitly its ancestors) for flattening.
    pub fn request(self: &Arc<Self>, shape: Arc<Shape>) {
        self.requests.fetch_add(1, Ordering::Relaxed);

        if !self.config.read().use_worker_thread {
            self.flatten_one(&shape);
            return;
        }

        let spawn = {
            let mut state = self.state.lock();
            state.pending.push_back(shape);
            if state.running {
                false
            } else {
                state.running = true;
                true
            }
        };

        if spawn {
            self.spawn_worker();
        }
    }

    fn spawn_worker(self: &Arc<Self>) {
        let this = Arc::clone(self);
        let spawned = thread::Builder::new()
            .name("shape-flatten".into())
            .spawn(move || this.drain());

        match spawned {
            Ok(_) => {
                self.workers_spawned.fetch_add(1, Ordering::Relaxed);
                tracing::debug!("spawned shape flatten worker");
            }
            Err(err) => {
                // `running` is still set, so no one else will drain the queue.
                tracing::warn!(error = %err, "cannot spawn flatten worker, flattening inline");
                self.drain();
            }
        }
    }

    /// Worker loop: flatten until the queue is observed empty.
    fn drain(&self) {
        loop {
            let next = {
                let mut state = self.state.lock();
                match state.pending.pop_front() {
                    Some(shape) => shape,
                    None => {
                        state.running = false;
                        self.idle.notify_all();
                        tracing::debug!("shape flatten worker idle");
                        return;
                    }
                }
            };
            self.flatten_one(&next);
        }
    }

    fn flatten_one(&self, shape: &Arc<Shape>) {
        let result = panic::catch_unwind(AssertUnwindSafe(|| shape.flatten_with_ancestors()));
        match result {
            Ok(installed) => {
                self.tables_installed.fetch_add(installed, Ordering::Relaxed);
                tracing::trace!(shape = shape.id().raw(), installed, "flattened shape");
            }
            Err(_) => {
                self.failures.fetch_add(1, Ordering::Relaxed);
                tracing::error!(shape = shape.id().raw(), "shape flatten panicked, left unflattened");
            }
        }
    }

    /// Block until the queue is empty and no worker is running.
    pub fn wait_idle(&self) {
        let mut state = self.state.lock();
        while state.running || !state.pending.is_empty() {
            self.idle.wait(&mut state);
        }
    }

    /// True when nothing is queued and no worker is running.
    pub fn is_idle(&self) -> bool {
        let state = self.state.lock();
        !state.running && state.pending.is_empty()
    }

    /// Snapshot of the activity counters.
    pub fn stats(&self) -> FlattenStats {
        FlattenStats {
            requests: self.requests.load(Ordering::Relaxed),
            tables_installed: self.tables_installed.load(Ordering::Relaxed),
            workers_spawned: self.workers_spawned.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
        }
    }
}
