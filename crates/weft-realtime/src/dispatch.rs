//! Mutation dispatch
//!
//! When data in a scope changes, the dispatcher re-runs each registered
//! query, hands the fresh data to the named mutation handler against a
//! recorder, and publishes the resulting transformation on the
//! registration's channel. One bad registration never takes down the
//! others.

use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::Mutex;
use tracing::{debug, warn};
use weft_presenter::DataObject;
use weft_transform::Recorder;

use crate::broker::Broker;
use crate::error::RealtimeError;
use crate::registry::MutationRegistry;

/// Supplies data sets for registered queries
///
/// Implemented by whatever owns the application's data. Queries are
/// re-run on every dispatch, so the result must reflect current state.
pub trait QuerySource: Send + Sync {
    /// Run a named query with its original arguments
    fn run(
        &self,
        query: &str,
        args: &[serde_json::Value],
    ) -> Result<Vec<DataObject>, RealtimeError>;
}

/// Records view operations for one mutation given fresh data
pub type MutationHandler = Box<dyn Fn(&mut Recorder, &[DataObject]) + Send + Sync>;

/// Named mutation handlers
#[derive(Default)]
pub struct MutationHandlers {
    by_name: DashMap<String, MutationHandler>,
}

impl MutationHandlers {
    /// Create an empty handler set
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler under a mutation name, replacing any previous one
    pub fn insert(
        &self,
        name: impl Into<String>,
        handler: impl Fn(&mut Recorder, &[DataObject]) + Send + Sync + 'static,
    ) {
        self.by_name.insert(name.into(), Box::new(handler));
    }

    /// Whether a handler exists under this name
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    fn record(
        &self,
        name: &str,
        recorder: &mut Recorder,
        data: &[DataObject],
    ) -> Result<(), RealtimeError> {
        let handler = self
            .by_name
            .get(name)
            .ok_or_else(|| RealtimeError::UnknownMutation(name.to_string()))?;
        (handler.value())(recorder, data);
        Ok(())
    }
}

impl std::fmt::Debug for MutationHandlers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MutationHandlers")
            .field("count", &self.by_name.len())
            .finish()
    }
}

/// Running dispatch counters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchStats {
    /// Scope change notifications processed
    pub dispatches: usize,
    /// Transformations published
    pub published: usize,
    /// Registrations that failed during dispatch
    pub failures: usize,
}

/// Re-runs registrations on scope changes and publishes the results
pub struct Dispatcher {
    registry: Arc<MutationRegistry>,
    handlers: MutationHandlers,
    broker: Arc<Broker>,
    source: Arc<dyn QuerySource>,
    stats: Mutex<DispatchStats>,
}

impl Dispatcher {
    /// Create a dispatcher over shared registry, broker, and data source
    #[must_use]
    pub fn new(
        registry: Arc<MutationRegistry>,
        handlers: MutationHandlers,
        broker: Arc<Broker>,
        source: Arc<dyn QuerySource>,
    ) -> Self {
        Self {
            registry,
            handlers,
            broker,
            source,
            stats: Mutex::new(DispatchStats::default()),
        }
    }

    /// Notify the dispatcher that data in a scope changed
    ///
    /// Every registration watching the scope is re-run independently; a
    /// failing query or missing handler is logged and skipped. Returns the
    /// number of transformations published.
    pub fn on_change(&self, scope: &str) -> usize {
        let registrations = self.registry.registrations_for(scope);
        debug!(scope, count = registrations.len(), "dispatching scope change");

        let mut published = 0;
        let mut failures = 0;
        for registration in &registrations {
            let data = match self.source.run(&registration.query, &registration.query_args) {
                Ok(data) => data,
                Err(error) => {
                    warn!(
                        scope,
                        query = %registration.query,
                        %error,
                        "query failed, skipping registration"
                    );
                    failures += 1;
                    continue;
                }
            };

            let mut recorder = Recorder::new();
            if let Err(error) = self
                .handlers
                .record(&registration.mutation, &mut recorder, &data)
            {
                warn!(scope, %error, "skipping registration");
                failures += 1;
                continue;
            }

            let channel = registration.address.build(&data);
            let transformation = recorder.finalize(registration.transform_id.clone());
            self.broker.publish(&channel, transformation);
            published += 1;
        }

        let mut stats = self.stats.lock();
        stats.dispatches += 1;
        stats.published += published;
        stats.failures += failures;
        published
    }

    /// Snapshot of the running counters
    #[must_use]
    pub fn stats(&self) -> DispatchStats {
        self.stats.lock().clone()
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("registrations", &self.registry.len())
            .field("handlers", &self.handlers)
            .finish()
    }
}
