//! Bounded fan-out/fan-in over scoped threads.

use std::{num::NonZeroUsize, thread};

/// A panic inside a worker, identified by the first task of its chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerPanic {
    pub task: usize,
}

/// Runs independent tasks on at most `workers` threads and collects their
/// results in input order.
///
/// Tasks are split into contiguous chunks, one per worker. Each worker builds
/// its own state with `init` once and reuses it for every task of its chunk,
/// which is how a worker owns a private copy of data it mutates and restores.
/// The call returns after all workers finished; nothing is streamed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskGroup {
    workers: NonZeroUsize,
}

impl Default for TaskGroup {
    fn default() -> Self {
        Self::new(thread::available_parallelism().unwrap_or(NonZeroUsize::MIN))
    }
}

impl TaskGroup {
    #[must_use]
    pub fn new(workers: NonZeroUsize) -> Self {
        Self { workers }
    }

    #[must_use]
    pub fn workers(&self) -> NonZeroUsize {
        self.workers
    }

    /// Applies `task` to every item.
    ///
    /// Returns the results in the order of `items`, or the error of the
    /// first failing task in input order. A panicking worker is reported as
    /// [`WorkerPanic`] converted into `E`.
    pub fn map_with<T, S, R, E, I, F>(&self, items: &[T], init: I, task: F) -> Result<Vec<R>, E>
    where
        T: Sync,
        R: Send,
        E: Send + From<WorkerPanic>,
        I: Fn() -> S + Sync,
        F: Fn(&mut S, usize, &T) -> Result<R, E> + Sync,
    {
        if items.is_empty() {
            return Ok(vec![]);
        }
        let chunk_len = items.len().div_ceil(self.workers.get());
        let (init, task) = (&init, &task);

        thread::scope(|s| {
            let handles = items
                .chunks(chunk_len)
                .enumerate()
                .map(|(c, chunk)| {
                    let offset = c * chunk_len;
                    let handle = s.spawn(move || {
                        let mut state = init();
                        chunk
                            .iter()
                            .enumerate()
                            .map(|(k, item)| task(&mut state, offset + k, item))
                            .collect::<Result<Vec<_>, E>>()
                    });
                    (offset, handle)
                })
                .collect::<Vec<_>>();

            let mut results = Vec::with_capacity(items.len());
            for (offset, handle) in handles {
                let chunk = handle
                    .join()
                    .map_err(|_| E::from(WorkerPanic { task: offset }))??;
                results.extend(chunk);
            }
            Ok(results)
        })
    }
}
