// Worker pool for non-blocking query execution
//
// A dedicated multi-thread tokio runtime whose blocking pool runs queries.
// Every submitted job owns a `Completion`; if the job is dropped before it
// runs, the completion still fires with `EngineShutdown`.

use crate::error::{Error, Result};
use tokio::runtime::{Builder, Runtime};
use tokio::task::JoinHandle;
use tracing::debug;

type Callback = Box<dyn FnOnce(Result<String>) + Send + 'static>;

/// Delivers exactly one result to a callback.
pub struct Completion {
    callback: Option<Callback>,
}

impl Completion {
    pub fn new<F>(callback: F) -> Self
    where
        F: FnOnce(Result<String>) + Send + 'static,
    {
        Self {
            callback: Some(Box::new(callback)),
        }
    }

    pub fn complete(mut self, result: Result<String>) {
        if let Some(callback) = self.callback.take() {
            callback(result);
        }
    }
}

impl Drop for Completion {
    fn drop(&mut self) {
        if let Some(callback) = self.callback.take() {
            callback(Err(Error::EngineShutdown));
        }
    }
}

pub struct WorkerPool {
    runtime: Option<Runtime>,
}

impl WorkerPool {
    pub fn new(threads: usize) -> Result<Self> {
        let runtime = Builder::new_multi_thread()
            .worker_threads(1)
            .max_blocking_threads(threads.max(1))
            .thread_name("routekit-worker")
            .enable_time()
            .build()
            .map_err(|e| Error::Io(format!("failed to start worker pool: {e}")))?;
        debug!("Worker pool started with {} threads", threads);
        Ok(Self {
            runtime: Some(runtime),
        })
    }

    /// Run `job` on the pool and hand its result to `completion`.
    pub fn submit<F>(&self, job: F, completion: Completion)
    where
        F: FnOnce() -> Result<String> + Send + 'static,
    {
        match &self.runtime {
            Some(runtime) => {
                runtime.spawn_blocking(move || completion.complete(job()));
            }
            None => drop(completion),
        }
    }

    /// Run `job` on the pool, returning a handle to await its result.
    pub fn spawn<F>(&self, job: F) -> Option<JoinHandle<Result<String>>>
    where
        F: FnOnce() -> Result<String> + Send + 'static,
    {
        self.runtime.as_ref().map(|runtime| runtime.spawn_blocking(job))
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        if let Some(runtime) = self.runtime.take() {
            // Must not block: engines may be dropped inside an async context
            runtime.shutdown_background();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::time::Duration;

    #[test]
    fn test_dropped_completion_reports_shutdown() {
        let (tx, rx) = mpsc::channel();
        let completion = Completion::new(move |r| tx.send(r).unwrap());
        drop(completion);
        assert_eq!(rx.recv().unwrap(), Err(Error::EngineShutdown));
    }

    #[test]
    fn test_completion_fires_once() {
        let (tx, rx) = mpsc::channel();
        Completion::new(move |r| tx.send(r).unwrap()).complete(Ok("done".into()));
        assert_eq!(rx.recv().unwrap(), Ok("done".to_string()));
        assert!(rx.recv_timeout(Duration::from_millis(50)).is_err());
    }

    #[test]
    fn test_submit_delivers_result() {
        let pool = WorkerPool::new(2).unwrap();
        let (tx, rx) = mpsc::channel();
        pool.submit(
            || Ok("routed".to_string()),
            Completion::new(move |r| tx.send(r).unwrap()),
        );
        assert_eq!(
            rx.recv_timeout(Duration::from_secs(5)).unwrap(),
            Ok("routed".to_string())
        );
    }

    #[test]
    fn test_pool_drop_still_completes_every_job() {
        let pool = WorkerPool::new(1).unwrap();
        let (gate_tx, gate_rx) = mpsc::channel::<()>();
        let (tx, rx) = mpsc::channel();

        let first = tx.clone();
        pool.submit(
            move || {
                let _ = gate_rx.recv_timeout(Duration::from_secs(5));
                Ok("first".to_string())
            },
            Completion::new(move |r| first.send(r).unwrap()),
        );
        pool.submit(
            || Ok("second".to_string()),
            Completion::new(move |r| tx.send(r).unwrap()),
        );

        drop(pool);
        let _ = gate_tx.send(());

        // Queued work either runs or reports shutdown, exactly once each
        let results: Vec<Result<String>> = (0..2)
            .map(|_| rx.recv_timeout(Duration::from_secs(5)).unwrap())
            .collect();
        assert_eq!(results.len(), 2);
        assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());
    }

    #[tokio::test]
    async fn test_spawn_is_awaitable() {
        let pool = WorkerPool::new(1).unwrap();
        let handle = pool.spawn(|| Ok("async".to_string())).unwrap();
        assert_eq!(handle.await.unwrap(), Ok("async".to_string()));
    }
}
