//! Authorization guards.
//!
//! A guard is a named check (token validation, permission lookup, …) that
//! runs exactly once per request, strictly before any process side effect.
//! Guards may suspend on I/O; callers never hold a lock across a check, and
//! a cancelled request drops the guard future together with the dispatch it
//! would have authorized.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use http::HeaderMap;
use serde_json::Value;

use crate::api::problem::Problem;

/// Raw request data delivered by the transport.
///
/// At guard time the body has not been read: `payload` and `file` are
/// populated later by dispatch, only for endpoints that declare them.
#[derive(Debug, Default, Clone)]
pub struct RequestContext {
    /// Canonical matched route template, e.g. `/api/__weft/list/{id}/save`.
    pub route: String,
    pub params: HashMap<String, String>,
    pub query: HashMap<String, String>,
    pub headers: HeaderMap,
    pub payload: Option<Value>,
    pub file: Option<UploadedFile>,
}

/// An uploaded multipart file.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub field: String,
    pub name: String,
    pub content_type: Option<String>,
    pub content: Bytes,
}

/// A named authorization check. On rejection the boundary layer serializes
/// the [`Problem`] and aborts the request with no further processing.
#[async_trait]
pub trait Guard: Send + Sync {
    async fn check(&self, widget_id: &str, ctx: &RequestContext) -> Result<(), Problem>;
}

/// Named guard lookup shared by all widget kinds. Registered at startup,
/// read concurrently at request time.
#[derive(Default)]
pub struct GuardSet {
    guards: DashMap<String, Arc<dyn Guard>>,
}

impl GuardSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, name: impl Into<String>, guard: Arc<dyn Guard>) {
        self.guards.insert(name.into(), guard);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Guard>> {
        self.guards.get(name).map(|entry| entry.value().clone())
    }
}
