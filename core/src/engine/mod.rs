//! Engine — runs queries against one dataset handle
//!
//! Three entry points share a single `compute`:
//! - `run`: blocking, on the caller's thread
//! - `run_with_callback`: scheduled on the worker pool, result handed to a callback
//! - `run_async`: scheduled on the worker pool, result awaited as a future
//!
//! The engine keeps no per-query state, so one engine serves any number of
//! concurrent callers.

pub mod worker;

use crate::config::DatasetHandle;
use crate::dataset::Dataset;
use crate::error::{Error, Result};
use crate::query::Query;
use crate::routing::{GraphRoutingCore, RoutePlan, RoutingCore, SearchMode};
use crate::settings::EngineSettings;
use std::future::Future;
use std::sync::Arc;
use tracing::debug;
use worker::{Completion, WorkerPool};

pub struct Engine {
    handle: DatasetHandle,
    core: Arc<dyn RoutingCore>,
    settings: EngineSettings,
    pool: WorkerPool,
}

impl Engine {
    pub fn new(handle: DatasetHandle) -> Result<Self> {
        Self::with_settings(handle, EngineSettings::default())
    }

    pub fn with_settings(handle: DatasetHandle, settings: EngineSettings) -> Result<Self> {
        settings.validate()?;
        let core = Arc::new(GraphRoutingCore::new(settings.clone()));
        Self::with_core(handle, settings, core)
    }

    /// Build an engine around a custom routing core.
    pub fn with_core(
        handle: DatasetHandle,
        settings: EngineSettings,
        core: Arc<dyn RoutingCore>,
    ) -> Result<Self> {
        settings.validate()?;
        let pool = WorkerPool::new(settings.worker_threads)?;
        debug!(
            "Engine ready on {} (checksum {}, {} workers)",
            handle.dataset().source(),
            handle.checksum(),
            settings.worker_threads
        );
        Ok(Self {
            handle,
            core,
            settings,
            pool,
        })
    }

    /// Run `query` on the calling thread.
    pub fn run(&self, query: &Query) -> Result<String> {
        compute(self.core.as_ref(), self.handle.dataset(), query)
    }

    /// Run `query` on the worker pool; `callback` receives the result exactly
    /// once, possibly on another thread.
    pub fn run_with_callback<F>(&self, query: &Query, callback: F)
    where
        F: FnOnce(Result<String>) + Send + 'static,
    {
        self.pool.submit(self.job(query), Completion::new(callback));
    }

    /// Run `query` on the worker pool and await the result.
    pub fn run_async(&self, query: &Query) -> impl Future<Output = Result<String>> + Send + 'static {
        let handle = self.pool.spawn(self.job(query));
        async move {
            match handle {
                Some(handle) => handle.await.map_err(|_| Error::EngineShutdown)?,
                None => Err(Error::EngineShutdown),
            }
        }
    }

    fn job(&self, query: &Query) -> impl FnOnce() -> Result<String> + Send + 'static {
        let dataset = self.handle.shared_dataset();
        let core = Arc::clone(&self.core);
        let query = query.clone();
        move || compute(core.as_ref(), &dataset, &query)
    }

    pub fn handle(&self) -> &DatasetHandle {
        &self.handle
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Dataset timestamp, `n/a` when the dataset has none.
    pub fn timestamp(&self) -> &str {
        self.handle.timestamp()
    }

    pub fn checksum(&self) -> u32 {
        self.handle.checksum()
    }
}

fn compute(core: &dyn RoutingCore, dataset: &Dataset, query: &Query) -> Result<String> {
    let plan = RoutePlan::resolve(query, dataset.checksum());
    debug!(
        "Routing {} coordinates ({})",
        plan.coordinates.len(),
        match plan.mode {
            SearchMode::FullSearch => "full search",
            SearchMode::ReplaySearch { .. } => "replay",
        }
    );
    core.route(dataset, &plan)?.to_json()
}
