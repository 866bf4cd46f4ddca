//! Process execution contract.
//!
//! The engine that actually runs a named operation is an external
//! collaborator; the core only hands it a resolved process name and an
//! ordered argument list. [`ProcessSet`] is a small in-process default used
//! by the server and by tests.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("the process {0} does not exist")]
    NotFound(String),
    #[error("process {name} failed")]
    Failed {
        name: String,
        #[source]
        source: anyhow::Error,
    },
}

/// `Invoke(processName, orderedArgs) → result | error`.
#[async_trait]
pub trait ProcessEngine: Send + Sync {
    async fn invoke(&self, name: &str, args: Vec<Value>) -> Result<Value, ProcessError>;
}

type ProcessFuture = Pin<Box<dyn Future<Output = anyhow::Result<Value>> + Send>>;

/// A registered process implementation.
pub type ProcessHandler = Arc<dyn Fn(Vec<Value>) -> ProcessFuture + Send + Sync>;

/// In-process engine: a name → handler table modules register into at
/// startup. Request-time lookups are concurrent reads.
#[derive(Default)]
pub struct ProcessSet {
    handlers: DashMap<String, ProcessHandler>,
}

impl ProcessSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F, Fut>(&self, name: impl Into<String>, handler: F)
    where
        F: Fn(Vec<Value>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<Value>> + Send + 'static,
    {
        self.handlers
            .insert(name.into(), Arc::new(move |args| Box::pin(handler(args))));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

#[async_trait]
impl ProcessEngine for ProcessSet {
    async fn invoke(&self, name: &str, args: Vec<Value>) -> Result<Value, ProcessError> {
        let handler = self
            .handlers
            .get(name)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| ProcessError::NotFound(name.to_string()))?;
        debug!(process = name, argc = args.len(), "invoking process");
        handler(args).await.map_err(|source| ProcessError::Failed {
            name: name.to_string(),
            source,
        })
    }
}
