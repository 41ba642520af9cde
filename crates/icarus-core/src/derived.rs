//! Derived ("synthetic") events.
//!
//! A derived event is a notification computed from journal state whenever
//! one of its trigger events is parsed, e.g. `GameLoadedEvent` after
//! `LoadGame`. The [`DerivedEventRegistry`] is built once from a list of
//! definitions and inverts their trigger sets into a lookup index. The
//! [`Dispatcher`] launches one task per matching definition; each task
//! broadcasts its own result as soon as it resolves. Tasks are never joined,
//! and a failing resolver only affects its own broadcast.

use std::collections::{BTreeSet, HashMap};
use std::future::Future;
use std::sync::Arc;

use futures::FutureExt as _;
use futures::future::BoxFuture;
use serde_json::Value;
use tokio::runtime::Handle;
use tracing::{debug, warn};

use crate::broadcast::BroadcastSink;
use crate::queries;
use crate::source::LogSource;

/// Errors a resolver can produce.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// The payload could not be serialized.
    #[error("payload serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The resolver could not produce a payload.
    #[error("resolver failed: {0}")]
    Resolve(String),
}

/// What a resolver can read.
#[derive(Clone)]
pub struct ResolveContext {
    /// The journal source, for latest-record lookups.
    pub log: Arc<dyn LogSource>,
}

/// Asynchronous payload producer for one derived event.
pub type Resolver =
    Arc<dyn Fn(ResolveContext) -> BoxFuture<'static, Result<Value, DispatchError>> + Send + Sync>;

/// One derived event: its broadcast name, triggers, and resolver.
#[derive(Clone)]
pub struct DerivedEventDefinition {
    name: String,
    triggers: BTreeSet<String>,
    resolver: Resolver,
}

impl DerivedEventDefinition {
    /// Define a derived event fired by any of `triggers`.
    pub fn new<F, Fut>(name: impl Into<String>, triggers: &[&str], resolve: F) -> Self
    where
        F: Fn(ResolveContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, DispatchError>> + Send + 'static,
    {
        Self {
            name: name.into(),
            triggers: triggers.iter().map(|t| (*t).to_owned()).collect(),
            resolver: Arc::new(move |ctx| resolve(ctx).boxed()),
        }
    }

    /// Broadcast channel name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Raw event names that fire this definition.
    pub const fn triggers(&self) -> &BTreeSet<String> {
        &self.triggers
    }
}

impl std::fmt::Debug for DerivedEventDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DerivedEventDefinition")
            .field("name", &self.name)
            .field("triggers", &self.triggers)
            .finish_non_exhaustive()
    }
}

/// Immutable table of derived events with a `raw name -> definitions` index.
#[derive(Debug, Default)]
pub struct DerivedEventRegistry {
    definitions: Vec<DerivedEventDefinition>,
    index: HashMap<String, Vec<usize>>,
}

impl DerivedEventRegistry {
    /// Build the registry and its trigger index.
    pub fn new(definitions: Vec<DerivedEventDefinition>) -> Self {
        let mut index: HashMap<String, Vec<usize>> = HashMap::new();
        for (position, definition) in definitions.iter().enumerate() {
            for trigger in &definition.triggers {
                index.entry(trigger.clone()).or_default().push(position);
            }
        }
        Self { definitions, index }
    }

    /// The built-in derived events: `GameLoadedEvent` on `LoadGame`.
    pub fn standard() -> Self {
        Self::new(vec![DerivedEventDefinition::new(
            "GameLoadedEvent",
            &["LoadGame"],
            |ctx: ResolveContext| async move {
                serde_json::to_value(queries::commander(ctx.log.as_ref()))
                    .map_err(DispatchError::from)
            },
        )])
    }

    /// Whether any definition is triggered by `event_name`.
    pub fn is_trigger(&self, event_name: &str) -> bool {
        self.index.contains_key(event_name)
    }

    /// Definitions triggered by `event_name`, in registration order.
    pub fn triggered_by<'a>(
        &'a self,
        event_name: &str,
    ) -> impl Iterator<Item = &'a DerivedEventDefinition> + 'a {
        self.index
            .get(event_name)
            .into_iter()
            .flatten()
            .filter_map(|position| self.definitions.get(*position))
    }
}

/// Fans a raw event out to its derived events.
pub struct Dispatcher {
    registry: Arc<DerivedEventRegistry>,
    context: ResolveContext,
    sink: Arc<dyn BroadcastSink>,
}

impl Dispatcher {
    /// Create a dispatcher over `registry`.
    pub fn new(
        registry: Arc<DerivedEventRegistry>,
        context: ResolveContext,
        sink: Arc<dyn BroadcastSink>,
    ) -> Self {
        Self {
            registry,
            context,
            sink,
        }
    }

    /// The registry this dispatcher serves.
    pub fn registry(&self) -> &DerivedEventRegistry {
        &self.registry
    }

    /// Launch one resolver task per definition triggered by `event_name`.
    ///
    /// Returns the number of tasks launched. Must be called from within a
    /// Tokio runtime; outside one nothing is launched.
    pub fn dispatch(&self, event_name: &str) -> usize {
        let Ok(runtime) = Handle::try_current() else {
            warn!(event = event_name, "No runtime available, derived events skipped");
            return 0;
        };

        let mut launched: usize = 0;
        for definition in self.registry.triggered_by(event_name) {
            let name = definition.name.clone();
            let resolve = Arc::clone(&definition.resolver);
            let context = self.context.clone();
            let sink = Arc::clone(&self.sink);

            runtime.spawn(async move {
                match resolve(context).await {
                    Ok(message) => {
                        debug!(derived = %name, "Derived event resolved");
                        sink.emit(&name, message);
                    }
                    Err(e) => {
                        warn!(derived = %name, error = %e, "Derived event resolver failed");
                    }
                }
            });
            launched = launched.saturating_add(1);
        }
        launched
    }
}
