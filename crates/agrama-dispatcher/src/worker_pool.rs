//! OS-thread worker pool (spec §5: "the dispatcher reads input on a
//! single thread; each request is handed to a worker pool").

use agrama_core::{Error, Result};
use crossbeam_channel::{bounded, Sender};
use std::thread::JoinHandle;

type Job = Box<dyn FnOnce() + Send + 'static>;

/// A bounded pool of OS threads executing submitted closures.
///
/// `submit` never blocks: a full queue immediately returns
/// [`Error::Busy`] rather than waiting (spec §4.G: "queue full → reply
/// with code −32020 (busy), no call executed").
pub struct WorkerPool {
    sender: Option<Sender<Job>>,
    workers: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// `size` is clamped to `[2, 32]` (spec §5 default sizing rule).
    pub fn new(size: usize, queue_capacity: usize) -> Self {
        let size = size.clamp(2, 32);
        let (sender, receiver) = bounded::<Job>(queue_capacity.max(1));

        let workers = (0..size)
            .map(|i| {
                let receiver = receiver.clone();
                std::thread::Builder::new()
                    .name(format!("agrama-worker-{i}"))
                    .spawn(move || {
                        while let Ok(job) = receiver.recv() {
                            job();
                        }
                    })
                    .expect("failed to spawn worker thread")
            })
            .collect();

        WorkerPool {
            sender: Some(sender),
            workers,
        }
    }

    pub fn submit(&self, job: Job) -> Result<()> {
        self.sender
            .as_ref()
            .expect("pool not yet shut down")
            .try_send(job)
            .map_err(|_| Error::Busy)
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        // Dropping the sender closes the channel; workers exit their
        // `recv` loop once drained and we join them so the process
        // doesn't exit mid-job.
        self.sender.take();
        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }
    }
}
