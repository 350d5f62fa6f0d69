use std::panic::{self, AssertUnwindSafe};
use std::thread;

use crossbeam::channel::{self, Receiver, Sender};
use log::{debug, error};

use super::ThreadPool;
use crate::Result;

type Job = Box<dyn FnOnce() + Send + 'static>;

/// A fixed set of workers pulling jobs from one shared channel.
///
/// Dropping the pool closes the channel and the workers exit once the queue
/// is drained.
pub struct SharedQueueThreadPool {
    jobs: Sender<Job>,
}

impl ThreadPool for SharedQueueThreadPool {
    fn new(threads: u32) -> Result<Self> {
        let (jobs, queue) = channel::unbounded::<Job>();
        for id in 0..threads {
            start_worker(id, queue.clone())?;
        }
        Ok(SharedQueueThreadPool { jobs })
    }

    fn spawn<F>(&self, job: F)
    where
        F: FnOnce() + Send + 'static,
    {
        if self.jobs.send(Box::new(job)).is_err() {
            error!("Job dropped: every worker has exited");
        }
    }
}

fn start_worker(id: u32, queue: Receiver<Job>) -> Result<()> {
    thread::Builder::new()
        .name(format!("store-worker-{id}"))
        .spawn(move || {
            for job in queue.iter() {
                if panic::catch_unwind(AssertUnwindSafe(job)).is_err() {
                    error!("Worker {id}: job panicked");
                }
            }
            debug!("Worker {id}: queue closed, exiting");
        })?;
    Ok(())
}
