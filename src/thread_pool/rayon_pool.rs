use super::ThreadPool;
use crate::{CacheError, Result};

/// A thread pool on top of rayon's work-stealing scheduler.
pub struct RayonThreadPool(rayon::ThreadPool);

impl ThreadPool for RayonThreadPool {
    fn new(threads: u32) -> Result<Self> {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads as usize)
            .thread_name(|i| format!("rayon-store-{i}"))
            .build()
            .map(RayonThreadPool)
            .map_err(|e| CacheError::StringError(e.to_string()))
    }

    fn spawn<F>(&self, job: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.0.spawn(job);
    }
}
