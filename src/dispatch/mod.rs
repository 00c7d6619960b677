//! Dispatch wrappers: moving notification fan-out off the calling thread.
//!
//! All wrappers share the [`WorkerPool`] and the same lifecycle contract:
//! `stop` is one-shot and idempotent, later submissions are no-ops, in-flight
//! work runs to completion, and a pool injected from outside is never shut
//! down by the wrapper that borrowed it.

pub mod queued;
pub mod targeted;
pub mod threaded;

pub use queued::QueuedDispatch;
pub use targeted::TargetedDispatch;
pub use threaded::SerializedDispatch;

use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex};
use std::thread::{self, JoinHandle};

type Job = Box<dyn FnOnce() + Send + 'static>;

struct PoolState {
    queue: VecDeque<Job>,
    stopped: bool,
}

struct PoolInner {
    state: Mutex<PoolState>,
    signal: Condvar,
}

impl PoolInner {
    fn run(self: &Arc<Self>) {
        let mut state = self.state.lock().expect("worker pool lock poisoned");
        loop {
            match state.queue.pop_front() {
                Some(job) => {
                    drop(state);
                    job();
                    state = self.state.lock().expect("worker pool lock poisoned");
                }
                None => {
                    if state.stopped {
                        return;
                    }
                    state = self
                        .signal
                        .wait(state)
                        .expect("worker pool lock poisoned");
                }
            }
        }
    }
}

/// Fixed-size thread pool; submitted jobs run to completion even across
/// `stop`, which drains the queue before joining the workers.
pub struct WorkerPool {
    name: String,
    inner: Arc<PoolInner>,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl WorkerPool {
    pub fn new(name: impl Into<String>, threads: usize) -> Arc<Self> {
        let name = name.into();
        let inner = Arc::new(PoolInner {
            state: Mutex::new(PoolState {
                queue: VecDeque::new(),
                stopped: false,
            }),
            signal: Condvar::new(),
        });
        let workers = (0..threads.max(1))
            .map(|index| {
                let runner = Arc::clone(&inner);
                thread::Builder::new()
                    .name(format!("{name}-worker-{index}"))
                    .spawn(move || runner.run())
                    .expect("failed to spawn pool worker thread")
            })
            .collect();
        Arc::new(Self {
            name,
            inner,
            workers: Mutex::new(workers),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Submits a job; returns false (and drops the job) after `stop`.
    pub fn execute(&self, job: impl FnOnce() + Send + 'static) -> bool {
        {
            let mut state = self.inner.state.lock().expect("worker pool lock poisoned");
            if state.stopped {
                return false;
            }
            state.queue.push_back(Box::new(job));
        }
        self.inner.signal.notify_one();
        true
    }

    /// Stops the pool: no further submissions, queued jobs still run, all
    /// workers are joined. Idempotent. Must not be called from a pool thread.
    pub fn stop(&self) {
        {
            let mut state = self.inner.state.lock().expect("worker pool lock poisoned");
            if state.stopped {
                return;
            }
            state.stopped = true;
        }
        self.inner.signal.notify_all();
        let workers = std::mem::take(
            &mut *self.workers.lock().expect("worker pool handle lock poisoned"),
        );
        for handle in workers {
            let _ = handle.join();
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.stop();
    }
}
