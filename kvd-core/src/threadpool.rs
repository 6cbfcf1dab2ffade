//! A fixed pool of worker threads pulling tasks off a blocking MPMC
//! queue, used by the RPC server's completion workers and by ad-hoc
//! batched workloads (e.g. parallel multi-op fan-out).

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// How long a worker waits for a task before re-checking the stop
/// flag. Bounds shutdown latency.
const POLL_TIMEOUT: Duration = Duration::from_millis(100);

type Task = Box<dyn FnOnce() + Send + 'static>;

pub struct ThreadPool {
    sender: Option<Sender<Task>>,
    receiver: Receiver<Task>,
    workers: Vec<JoinHandle<()>>,
    stopped: Arc<AtomicBool>,
}

impl ThreadPool {
    /// Create a pool with no workers running. Call [`ThreadPool::start`]
    /// to spawn them.
    pub fn new() -> Self {
        let (sender, receiver) = bounded(4096);
        Self {
            sender: Some(sender),
            receiver,
            workers: Vec::new(),
            stopped: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Spawn `n` worker threads. A no-op if the pool is already
    /// running.
    pub fn start(&mut self, n: usize) {
        if !self.workers.is_empty() {
            return;
        }
        self.stopped.store(false, Ordering::SeqCst);
        for _ in 0..n {
            let receiver = self.receiver.clone();
            let stopped = Arc::clone(&self.stopped);
            self.workers.push(thread::spawn(move || worker_loop(receiver, stopped)));
        }
    }

    /// Enqueue one task. Never blocks the caller beyond the cost of
    /// pushing onto the channel.
    pub fn post(&self, task: impl FnOnce() + Send + 'static) {
        if let Some(sender) = &self.sender {
            let _ = sender.send(Box::new(task));
        }
    }

    /// Enqueue many tasks. They are pushed in order, but there is no
    /// all-or-nothing guarantee across the batch.
    pub fn post_batch(&self, tasks: impl IntoIterator<Item = Task>) {
        for task in tasks {
            if let Some(sender) = &self.sender {
                let _ = sender.send(task);
            }
        }
    }

    /// Signal all workers to stop, let them drain whatever remains on
    /// the queue, then join them. The pool may be started again
    /// afterward.
    pub fn stop(&mut self) {
        self.stopped.store(true, Ordering::SeqCst);
        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }
    }
}

impl Default for ThreadPool {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        self.stop();
    }
}

fn worker_loop(receiver: Receiver<Task>, stopped: Arc<AtomicBool>) {
    loop {
        match receiver.recv_timeout(POLL_TIMEOUT) {
            Ok(task) => task(),
            Err(RecvTimeoutError::Timeout) => {
                if stopped.load(Ordering::SeqCst) {
                    // Drain whatever is left without blocking, then exit.
                    while let Ok(task) = receiver.try_recv() {
                        task();
                    }
                    return;
                }
            }
            Err(RecvTimeoutError::Disconnected) => return,
        }
    }
}
