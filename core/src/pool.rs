use anyhow::Result;
use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::io;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

type Task = Box<dyn FnOnce() -> Result<()> + Send + 'static>;

/// Count of submitted-but-unfinished tasks with a blocking wait-until-zero.
#[derive(Debug, Default)]
pub struct Pending {
    count: Mutex<usize>,
    idle: Condvar,
}

impl Pending {
    pub fn new() -> Self { Self::default() }

    pub fn increment(&self) {
        let mut count = self.count.lock();
        *count += 1;
        tracing::trace!(pending = *count, "pending incremented");
    }

    pub fn decrement(&self) {
        self.decrement_by(1);
    }

    fn decrement_by(&self, n: usize) {
        let mut count = self.count.lock();
        debug_assert!(*count >= n, "pending count underflow: {} - {n}", *count);
        *count -= n;
        tracing::trace!(pending = *count, "pending decremented");
        if *count == 0 {
            self.idle.notify_all();
        }
    }

    pub fn get(&self) -> usize { *self.count.lock() }

    /// Blocks until the count reaches zero. Spurious wakeups re-check the count.
    pub fn wait_zero(&self) {
        let mut count = self.count.lock();
        while *count > 0 {
            self.idle.wait(&mut count);
        }
    }
}

#[derive(Default)]
struct Queue {
    tasks: VecDeque<Task>,
    shutdown: bool,
}

struct Shared {
    queue: Mutex<Queue>,
    available: Condvar,
    pending: Pending,
}

/// Cloneable submission handle onto a [`WorkQueue`].
///
/// Tasks capture an `Executor` to fan out follow-up work. It does not own the
/// worker threads, so dropping the last handle inside a task is harmless.
#[derive(Clone)]
pub struct Executor {
    shared: Arc<Shared>,
}

impl Executor {
    /// Queues `task` for one of the workers and returns immediately.
    /// Errors returned by the task are logged, never propagated.
    pub fn submit<F>(&self, task: F)
    where
        F: FnOnce() -> Result<()> + Send + 'static,
    {
        let mut queue = self.shared.queue.lock();
        if queue.shutdown {
            tracing::warn!("work queue is shut down, dropping task");
            return;
        }
        self.shared.pending.increment();
        queue.tasks.push_back(Box::new(task));
        self.shared.available.notify_one();
    }

    /// Blocks until every submitted task, including tasks submitted by tasks,
    /// has finished. Must not be called from inside a task.
    pub fn await_idle(&self) {
        tracing::debug!(pending = self.shared.pending.get(), "waiting for work queue to drain");
        self.shared.pending.wait_zero();
    }

    pub fn pending(&self) -> usize { self.shared.pending.get() }
}

/// Fixed-size pool of worker threads fed from a FIFO queue.
pub struct WorkQueue {
    executor: Executor,
    workers: Mutex<Vec<JoinHandle<()>>>,
    threads: usize,
}

impl WorkQueue {
    /// Starts `threads` workers (at least one). Workers that fail to spawn are
    /// logged and left out; fails only when none could be started.
    pub fn new(threads: usize) -> io::Result<Self> {
        let requested = threads.max(1);
        let shared = Arc::new(Shared { queue: Mutex::new(Queue::default()), available: Condvar::new(), pending: Pending::new() });
        let mut workers = Vec::with_capacity(requested);
        let mut last_err = None;
        for id in 0..requested {
            let shared = shared.clone();
            let spawned = thread::Builder::new().name(format!("pindex-worker-{id}")).spawn(move || worker_loop(id, &shared));
            match spawned {
                Ok(handle) => workers.push(handle),
                Err(err) => {
                    tracing::error!(worker = id, error = %err, "unable to spawn worker thread");
                    last_err = Some(err);
                }
            }
        }
        if workers.is_empty() {
            return Err(last_err.unwrap_or_else(|| io::Error::new(io::ErrorKind::Other, "no worker thread started")));
        }
        let threads = workers.len();
        tracing::debug!(threads, requested, "work queue started");
        Ok(Self { executor: Executor { shared }, workers: Mutex::new(workers), threads })
    }

    pub fn executor(&self) -> Executor { self.executor.clone() }

    /// Number of workers actually running, which may be fewer than requested.
    pub fn threads(&self) -> usize { self.threads }

    pub fn submit<F>(&self, task: F)
    where
        F: FnOnce() -> Result<()> + Send + 'static,
    {
        self.executor.submit(task);
    }

    pub fn await_idle(&self) { self.executor.await_idle(); }

    /// Waits for outstanding work, then stops and joins every worker.
    /// Tasks still queued once the stop flag is raised are dropped.
    pub fn shutdown(&self) {
        let handles: Vec<_> = std::mem::take(&mut *self.workers.lock());
        if handles.is_empty() {
            return;
        }
        self.executor.await_idle();
        let dropped = {
            let mut queue = self.executor.shared.queue.lock();
            queue.shutdown = true;
            let dropped = queue.tasks.len();
            queue.tasks.clear();
            self.executor.shared.available.notify_all();
            dropped
        };
        if dropped > 0 {
            tracing::debug!(dropped, "dropped unstarted tasks");
            self.executor.shared.pending.decrement_by(dropped);
        }
        for handle in handles {
            if handle.join().is_err() {
                tracing::error!("worker thread terminated abnormally");
            }
        }
        tracing::debug!("work queue shut down");
    }
}

impl Drop for WorkQueue {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn worker_loop(id: usize, shared: &Shared) {
    loop {
        let task = {
            let mut queue = shared.queue.lock();
            loop {
                if queue.shutdown {
                    return;
                }
                if let Some(task) = queue.tasks.pop_front() {
                    break task;
                }
                shared.available.wait(&mut queue);
            }
        };
        match catch_unwind(AssertUnwindSafe(task)) {
            Ok(Ok(())) => {}
            Ok(Err(err)) => tracing::warn!(worker = id, error = %format!("{err:#}"), "task failed"),
            Err(_) => tracing::error!(worker = id, "task panicked"),
        }
        shared.pending.decrement();
    }
}
