use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

type Task = Box<dyn FnOnce() + Send + 'static>;

/// Worker count used when none is configured.
pub const DEFAULT_THREADS: usize = 5;

struct QueueState {
    tasks: VecDeque<Task>,
    shutdown: bool,
}

struct Inner {
    state: Mutex<QueueState>,
    task_available: Condvar,
    // Pending work is tracked under its own lock so the finish() barrier
    // never contends with queue push/pop.
    pending: Mutex<usize>,
    all_done: Condvar,
}

/// Fixed pool of worker threads draining a FIFO of one-shot tasks. Cloning
/// yields another handle to the same pool, which is how tasks enqueue
/// follow-up work.
#[derive(Clone)]
pub struct WorkQueue {
    inner: Arc<Inner>,
    workers: Arc<Mutex<Vec<JoinHandle<()>>>>,
    threads: usize,
}

impl WorkQueue {
    /// Start `threads` workers (at least one) waiting for work.
    pub fn new(threads: usize) -> Self {
        let threads = threads.max(1);
        let inner = Arc::new(Inner {
            state: Mutex::new(QueueState {
                tasks: VecDeque::new(),
                shutdown: false,
            }),
            task_available: Condvar::new(),
            pending: Mutex::new(0),
            all_done: Condvar::new(),
        });

        let mut workers = Vec::with_capacity(threads);
        for id in 0..threads {
            let inner = Arc::clone(&inner);
            let handle = thread::Builder::new()
                .name(format!("worker-{id}"))
                .spawn(move || worker_loop(&inner))
                .expect("spawn worker thread");
            workers.push(handle);
        }

        Self {
            inner,
            workers: Arc::new(Mutex::new(workers)),
            threads,
        }
    }

    /// Enqueue a task without blocking on worker availability. The pending
    /// counter is raised before the task becomes visible so `finish` can
    /// never observe a momentary zero while work is still being handed over.
    pub fn execute<F>(&self, task: F)
    where
        F: FnOnce() + Send + 'static,
    {
        *self.inner.pending.lock() += 1;
        let mut state = self.inner.state.lock();
        state.tasks.push_back(Box::new(task));
        self.inner.task_available.notify_one();
    }

    /// Block until every enqueued task has completed. The workers stay alive
    /// and the queue remains usable afterwards.
    pub fn finish(&self) {
        let mut pending = self.inner.pending.lock();
        while *pending != 0 {
            self.inner.all_done.wait(&mut pending);
        }
        tracing::debug!("all queued work is done");
    }

    /// Ask the workers to exit. Workers re-check the flag before taking new
    /// work, so tasks still queued at this point may be discarded; tasks
    /// already running complete normally.
    pub fn shutdown(&self) {
        let mut state = self.inner.state.lock();
        state.shutdown = true;
        self.inner.task_available.notify_all();
    }

    /// Drain the queue, shut it down, and wait for every worker to exit.
    pub fn join(&self) {
        self.finish();
        self.shutdown();
        let handles: Vec<JoinHandle<()>> = {
            let mut workers = self.workers.lock();
            workers.drain(..).collect()
        };
        for handle in handles {
            if handle.join().is_err() {
                tracing::warn!("worker thread terminated by panic");
            }
        }
    }

    /// Whether any enqueued task has not yet completed.
    pub fn is_active(&self) -> bool {
        *self.inner.pending.lock() > 0
    }

    pub fn thread_count(&self) -> usize {
        self.threads
    }

    pub fn size(&self) -> usize {
        self.threads
    }
}

fn worker_loop(inner: &Inner) {
    loop {
        let task = {
            let mut state = inner.state.lock();
            while state.tasks.is_empty() && !state.shutdown {
                inner.task_available.wait(&mut state);
            }
            // Awake for one of two reasons: work is available, or shutdown
            // was requested. Shutdown wins, discarding any backlog.
            if state.shutdown {
                break;
            }
            match state.tasks.pop_front() {
                Some(task) => task,
                None => continue,
            }
        };

        // A panicking task must not take the worker down, and must still be
        // counted as finished or finish() would wait forever.
        if catch_unwind(AssertUnwindSafe(task)).is_err() {
            let current = thread::current();
            let name = current.name().unwrap_or("worker");
            tracing::error!(worker = name, "task panicked while running");
        }

        let mut pending = inner.pending.lock();
        *pending -= 1;
        if *pending == 0 {
            inner.all_done.notify_all();
        }
    }
}
