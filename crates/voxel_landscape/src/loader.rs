//! Background chunk generation keyed by position.
//!
//! [`ChunkLoader`] runs [`Chunk::generate`] on a rayon thread pool and hands
//! finished chunks back through [`ChunkLoader::get`]. All bookkeeping lives
//! behind one mutex:
//!
//! - `wanted`: positions the caller currently asks for
//! - `in_flight`: positions with a queued or running job (at most one each)
//! - `completed`: finished chunks that are still wanted
//! - `orphaned`: finished chunks nobody wants any more
//!
//! Cancellation is cooperative. A job checks whether its position is still
//! wanted before starting; a job that finishes after its position was
//! dropped parks the result in `orphaned`, where it is either revived by a
//! later [`ChunkLoader::add`] or swept by [`ChunkLoader::delete_dead_chunks`].
//! Orphaned chunks never own GPU resources.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};

use bevy::log::{debug, error};
use rayon::{ThreadPool, ThreadPoolBuildError, ThreadPoolBuilder};

use crate::chunk::Chunk;
use crate::coords::ChunkPos;
use crate::terrain::TerrainGenerator;

/// Error creating a chunk loader.
#[derive(Debug)]
pub enum LoaderError {
  /// The worker pool could not be started.
  ThreadPool(ThreadPoolBuildError),
}

impl fmt::Display for LoaderError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::ThreadPool(e) => write!(f, "failed to start generation workers: {e}"),
    }
  }
}

impl std::error::Error for LoaderError {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match self {
      Self::ThreadPool(e) => Some(e),
    }
  }
}

impl From<ThreadPoolBuildError> for LoaderError {
  fn from(err: ThreadPoolBuildError) -> Self {
    Self::ThreadPool(err)
  }
}

/// Snapshot of loader bookkeeping.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LoaderStats {
  pub wanted: usize,
  pub in_flight: usize,
  pub completed: usize,
  pub orphaned: usize,
  /// Chunks generated since the loader was created.
  pub generated: usize,
}

#[derive(Default)]
struct LoaderState {
  wanted: HashSet<ChunkPos>,
  in_flight: HashSet<ChunkPos>,
  completed: HashMap<ChunkPos, Chunk>,
  orphaned: HashMap<ChunkPos, Chunk>,
  generated: usize,
}

#[derive(Default)]
struct Shared {
  state: Mutex<LoaderState>,
  idle: Condvar,
}

impl Shared {
  fn lock(&self) -> MutexGuard<'_, LoaderState> {
    self.state.lock().unwrap_or_else(PoisonError::into_inner)
  }

  /// Finishes a job for `pos` and wakes idle waiters.
  fn finish(&self, state: &mut LoaderState, pos: ChunkPos) {
    state.in_flight.remove(&pos);
    if state.in_flight.is_empty() {
      self.idle.notify_all();
    }
  }
}

/// Asynchronous, position-keyed chunk cache.
pub struct ChunkLoader {
  shared: Arc<Shared>,
  generator: Arc<TerrainGenerator>,
  pool: ThreadPool,
}

impl ChunkLoader {
  /// Starts a loader with `workers` generation threads (0 picks one per
  /// logical CPU).
  pub fn new(generator: Arc<TerrainGenerator>, workers: usize) -> Result<Self, LoaderError> {
    let pool = ThreadPoolBuilder::new()
      .num_threads(workers)
      .thread_name(|i| format!("landscape-gen-{i}"))
      .build()?;
    debug!(
      "Chunk loader started with {} worker threads",
      pool.current_num_threads()
    );
    Ok(Self {
      shared: Arc::default(),
      generator,
      pool,
    })
  }

  /// Requests the chunk at `pos`.
  ///
  /// Does nothing if `pos` is already wanted or finished. A previously
  /// orphaned chunk is revived instead of regenerated, and a position whose
  /// job is still running reuses that job.
  pub fn add(&self, pos: ChunkPos) {
    let mut state = self.shared.lock();

    if let Some(chunk) = state.orphaned.remove(&pos) {
      state.wanted.insert(pos);
      state.completed.insert(pos, chunk);
      debug!("Revived orphaned chunk {pos}");
      return;
    }
    if !state.wanted.insert(pos) || state.completed.contains_key(&pos) {
      return;
    }
    if !state.in_flight.insert(pos) {
      return;
    }
    drop(state);

    let shared = Arc::clone(&self.shared);
    let generator = Arc::clone(&self.generator);
    self.pool.spawn(move || run_job(&shared, &generator, pos));
  }

  /// Takes the finished chunk at exactly `pos`, if any.
  ///
  /// A returned chunk is no longer tracked by the loader.
  pub fn get(&self, pos: ChunkPos) -> Option<Chunk> {
    let mut state = self.shared.lock();
    let chunk = state.completed.remove(&pos)?;
    state.wanted.remove(&pos);
    Some(chunk)
  }

  /// Forgets every request. Finished but unclaimed chunks become orphans;
  /// running jobs will orphan their results.
  pub fn clear(&self) {
    let mut state = self.shared.lock();
    state.wanted.clear();
    let completed = std::mem::take(&mut state.completed);
    state.orphaned.extend(completed);
  }

  /// Drops every orphaned chunk and returns how many there were.
  pub fn delete_dead_chunks(&self) -> usize {
    let dead = std::mem::take(&mut self.shared.lock().orphaned);
    let count = dead.len();
    if count > 0 {
      debug!("Deleted {count} dead chunks");
    }
    count
  }

  /// Returns true if `pos` is requested but not finished.
  pub fn is_pending(&self, pos: ChunkPos) -> bool {
    let state = self.shared.lock();
    state.wanted.contains(&pos) && !state.completed.contains_key(&pos)
  }

  /// Blocks until no job is queued or running.
  pub fn block_until_idle(&self) {
    let mut state = self.shared.lock();
    while !state.in_flight.is_empty() {
      state = self
        .shared
        .idle
        .wait(state)
        .unwrap_or_else(PoisonError::into_inner);
    }
  }

  pub fn stats(&self) -> LoaderStats {
    let state = self.shared.lock();
    LoaderStats {
      wanted: state.wanted.len(),
      in_flight: state.in_flight.len(),
      completed: state.completed.len(),
      orphaned: state.orphaned.len(),
      generated: state.generated,
    }
  }

  pub fn generator(&self) -> &Arc<TerrainGenerator> {
    &self.generator
  }

  /// Number of generation threads.
  pub fn workers(&self) -> usize {
    self.pool.current_num_threads()
  }
}

impl Drop for ChunkLoader {
  fn drop(&mut self) {
    // Queued jobs see nothing wanted and exit without generating.
    self.clear();
  }
}

fn run_job(shared: &Shared, generator: &TerrainGenerator, pos: ChunkPos) {
  {
    let mut state = shared.lock();
    if !state.wanted.contains(&pos) {
      shared.finish(&mut state, pos);
      return;
    }
  }

  let result = Chunk::generate(pos, generator);

  let mut state = shared.lock();
  match result {
    Ok(chunk) => {
      state.generated += 1;
      if state.wanted.contains(&pos) {
        state.completed.insert(pos, chunk);
      } else {
        debug!("Chunk {pos} finished after being dropped");
        state.orphaned.insert(pos, chunk);
      }
    }
    Err(e) => {
      error!("Failed to generate chunk {pos}: {e}");
      state.wanted.remove(&pos);
    }
  }
  shared.finish(&mut state, pos);
}
