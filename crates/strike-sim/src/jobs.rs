//! Worker pool for stage-parallel system execution.
//!
//! A fixed set of OS threads drains a FIFO queue of job closures. The engine
//! submits every system of a stage, then blocks on [`JobPool::wait`] — the
//! barrier that gives stages their happens-before ordering. Jobs carry no
//! ordering guarantee among themselves.

use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};

type Job = Box<dyn FnOnce() + Send + 'static>;

struct State {
    queue: VecDeque<Job>,
    /// Jobs submitted but not yet finished executing.
    pending: usize,
    stop: bool,
}

struct Shared {
    state: Mutex<State>,
    signal: Condvar,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, State> {
        // A poisoned queue means a job panicked; keep draining so shutdown
        // can still join the workers.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Fixed-size worker pool with submit/wait barrier semantics.
///
/// Submitting from within a job is permitted. Calling [`JobPool::wait`] from
/// within a job is not: a worker waiting on its own completion never drains.
pub struct JobPool {
    shared: Arc<Shared>,
    workers: Vec<JoinHandle<()>>,
}

impl JobPool {
    /// Spawns `workers` threads; `0` means hardware parallelism, floor 1.
    pub fn new(workers: usize) -> Self {
        let count = if workers == 0 {
            thread::available_parallelism().map_or(1, |n| n.get())
        } else {
            workers
        };
        tracing::debug!(workers = count, "job pool starting");

        let shared = Arc::new(Shared {
            state: Mutex::new(State {
                queue: VecDeque::new(),
                pending: 0,
                stop: false,
            }),
            signal: Condvar::new(),
        });

        let workers = (0..count)
            .map(|i| {
                let shared = Arc::clone(&shared);
                thread::Builder::new()
                    .name(format!("strike-worker-{i}"))
                    .spawn(move || worker_loop(&shared))
                    .expect("failed to spawn worker thread")
            })
            .collect();

        Self { shared, workers }
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Enqueues a job for execution on some worker.
    pub fn submit(&self, job: impl FnOnce() + Send + 'static) {
        {
            let mut state = self.shared.lock();
            state.queue.push_back(Box::new(job));
            state.pending += 1;
        }
        self.shared.signal.notify_one();
    }

    /// Blocks until every previously submitted job has finished executing.
    /// Acts as a happens-before fence for all of them.
    pub fn wait(&self) {
        let mut state = self.shared.lock();
        while state.pending > 0 {
            state = self
                .shared
                .signal
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }
}

impl Drop for JobPool {
    fn drop(&mut self) {
        self.shared.lock().stop = true;
        self.shared.signal.notify_all();
        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }
    }
}

fn worker_loop(shared: &Shared) {
    loop {
        let job = {
            let mut state = shared.lock();
            loop {
                if let Some(job) = state.queue.pop_front() {
                    break job;
                }
                if state.stop {
                    return;
                }
                state = shared
                    .signal
                    .wait(state)
                    .unwrap_or_else(PoisonError::into_inner);
            }
        };

        job();

        shared.lock().pending -= 1;
        // notify_all: both the barrier waiter and idle workers listen here.
        shared.signal.notify_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn wait_returns_after_all_jobs_ran() {
        let pool = JobPool::new(4);
        let counter = Arc::new(AtomicUsize::new(0));
        const JOBS: usize = 100;

        for _ in 0..JOBS {
            let counter = Arc::clone(&counter);
            pool.submit(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        }
        pool.wait();
        assert_eq!(counter.load(Ordering::SeqCst), JOBS);
    }

    #[test]
    fn wait_with_no_jobs_is_immediate() {
        let pool = JobPool::new(1);
        pool.wait();
    }

    #[test]
    fn submit_from_within_a_job() {
        let pool = Arc::new(JobPool::new(2));
        let counter = Arc::new(AtomicUsize::new(0));

        let inner_pool = Arc::clone(&pool);
        let inner_counter = Arc::clone(&counter);
        pool.submit(move || {
            for _ in 0..8 {
                let counter = Arc::clone(&inner_counter);
                inner_pool.submit(move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                });
            }
        });
        pool.wait();
        assert_eq!(counter.load(Ordering::SeqCst), 8);
    }

    #[test]
    fn zero_workers_defaults_to_at_least_one() {
        let pool = JobPool::new(0);
        assert!(pool.worker_count() >= 1);
    }

    #[test]
    fn barrier_reusable_across_batches() {
        let pool = JobPool::new(3);
        let counter = Arc::new(AtomicUsize::new(0));
        for batch in 1..=5 {
            for _ in 0..10 {
                let counter = Arc::clone(&counter);
                pool.submit(move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                });
            }
            pool.wait();
            assert_eq!(counter.load(Ordering::SeqCst), batch * 10);
        }
    }
}
