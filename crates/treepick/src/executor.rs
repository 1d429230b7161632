//! Order-preserving chunked execution.
//!
//! A sequence is split into `workers` contiguous chunks of
//! `ceil(len / workers)` items. Each chunk is handed to a pure function and the
//! per-chunk outputs are concatenated in chunk order, so a parallel run always
//! produces the same sequence as a sequential one.

use std::fmt;
use std::sync::Arc;

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::error::{PickerError, Result};

/// Resolves a requested job count to a number of workers.
///
/// - `None` runs sequentially (one worker).
/// - `0` is a configuration error.
/// - Negative `n` means `cpu_count + 1 + n`, never less than one.
pub fn resolve_workers(n_jobs: Option<i64>) -> Result<usize> {
    match n_jobs {
        None => Ok(1),
        Some(0) => Err(PickerError::config("n_jobs must not be 0")),
        Some(n) if n > 0 => Ok(n as usize),
        Some(n) => {
            let cpus = std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1) as i64;
            Ok((cpus + 1 + n).max(1) as usize)
        }
    }
}

/// Returns the `(start, end)` bounds of each chunk for a sequence of `len`
/// items split across `workers`.
pub fn chunk_bounds(len: usize, workers: usize) -> Vec<(usize, usize)> {
    if len == 0 {
        return Vec::new();
    }
    let size = len.div_ceil(workers.max(1));
    (0..len)
        .step_by(size)
        .map(|start| (start, (start + size).min(len)))
        .collect()
}

/// Runs per-chunk functions for one node tree.
///
/// Cloning is cheap: the thread pool is shared by every node of the tree.
#[derive(Clone)]
pub struct Executor {
    workers: usize,
    pool: Option<Arc<ThreadPool>>,
}

impl Executor {
    /// Builds an executor for the requested job count.
    pub fn new(n_jobs: Option<i64>) -> Result<Self> {
        let workers = resolve_workers(n_jobs)?;
        let pool = if workers > 1 {
            let pool = ThreadPoolBuilder::new()
                .num_threads(workers)
                .thread_name(|i| format!("treepick-{i}"))
                .build()
                .map_err(|err| PickerError::config(format!("cannot start worker pool: {err}")))?;
            Some(Arc::new(pool))
        } else {
            None
        };
        Ok(Executor { workers, pool })
    }

    /// A single-worker executor.
    pub fn sequential() -> Self {
        Executor {
            workers: 1,
            pool: None,
        }
    }

    /// Number of workers (and therefore chunks) used.
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Applies `f` to each chunk of `items` and concatenates the results in
    /// chunk order. The first failing chunk fails the whole call.
    pub fn map_chunks<T, R, F>(&self, items: &[T], f: F) -> Result<Vec<R>>
    where
        T: Sync,
        R: Send,
        F: Fn(&[T]) -> Result<Vec<R>> + Sync,
    {
        let pool = match &self.pool {
            Some(pool) if items.len() > 1 => pool,
            _ => return f(items),
        };

        let bounds = chunk_bounds(items.len(), self.workers);
        tracing::debug!(
            items = items.len(),
            workers = self.workers,
            chunks = bounds.len(),
            "dispatching chunks"
        );

        let outputs: Vec<Vec<R>> = pool.install(|| {
            bounds
                .par_iter()
                .map(|&(start, end)| f(&items[start..end]))
                .collect::<Result<Vec<_>>>()
        })?;

        Ok(outputs.into_iter().flatten().collect())
    }
}

impl Default for Executor {
    fn default() -> Self {
        Executor::sequential()
    }
}

impl fmt::Debug for Executor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Executor")
            .field("workers", &self.workers)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_workers_rules() {
        assert_eq!(resolve_workers(None).unwrap(), 1);
        assert_eq!(resolve_workers(Some(3)).unwrap(), 3);
        assert!(matches!(resolve_workers(Some(0)), Err(PickerError::Config(_))));

        let cpus = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        assert_eq!(resolve_workers(Some(-1)).unwrap(), cpus);
        assert_eq!(resolve_workers(Some(-10_000)).unwrap(), 1);
    }

    #[test]
    fn chunk_bounds_cover_sequence() {
        assert_eq!(chunk_bounds(10, 3), vec![(0, 4), (4, 8), (8, 10)]);
        assert_eq!(chunk_bounds(2, 4), vec![(0, 1), (1, 2)]);
        assert_eq!(chunk_bounds(5, 1), vec![(0, 5)]);
        assert!(chunk_bounds(0, 4).is_empty());
    }

    #[test]
    fn map_chunks_preserves_order() {
        let items: Vec<u32> = (0..103).collect();
        let executor = Executor::new(Some(4)).unwrap();
        let doubled = executor
            .map_chunks(&items, |chunk| Ok(chunk.iter().map(|n| n * 2).collect()))
            .unwrap();
        let expected: Vec<u32> = items.iter().map(|n| n * 2).collect();
        assert_eq!(doubled, expected);
    }

    #[test]
    fn map_chunks_propagates_errors() {
        let items: Vec<u32> = (0..20).collect();
        let executor = Executor::new(Some(2)).unwrap();
        let result: Result<Vec<u32>> = executor.map_chunks(&items, |chunk| {
            if chunk.contains(&15) {
                Err(PickerError::missing("n"))
            } else {
                Ok(chunk.to_vec())
            }
        });
        assert!(matches!(result, Err(PickerError::MissingField { .. })));
    }

    #[test]
    fn sequential_runs_once() {
        let items = vec![1, 2, 3];
        let calls = std::sync::atomic::AtomicUsize::new(0);
        let out = Executor::sequential()
            .map_chunks(&items, |chunk| {
                calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
                Ok(chunk.to_vec())
            })
            .unwrap();
        assert_eq!(out, items);
        assert_eq!(calls.into_inner(), 1);
    }
}
