//! Widget instance registry.
//!
//! An owned, read-mostly map from widget ID to a fully-loaded instance.
//! Request-time lookups are lock-free (`ArcSwap` snapshot loads); mutation
//! happens only during load/reload, which callers serialize externally.
//! A reload builds the complete replacement set first and swaps it in
//! atomically, so a partially-resolved instance is never routable.

use std::collections::HashMap;
use std::sync::Arc;

use arc_swap::ArcSwap;
use thiserror::Error;

/// A loaded widget instance routable by its process-wide unique ID.
pub trait Widget: Send + Sync + 'static {
    /// Widget kind name, e.g. `"list"`.
    const KIND: &'static str;

    fn id(&self) -> &str;
}

#[derive(Debug, Error)]
pub enum WidgetError {
    #[error("the {kind} widget {id} is already registered")]
    DuplicateWidgetId { kind: &'static str, id: String },
}

#[derive(Debug)]
pub struct WidgetRegistry<W> {
    widgets: ArcSwap<HashMap<String, Arc<W>>>,
}

impl<W: Widget> WidgetRegistry<W> {
    pub fn new() -> Self {
        Self {
            widgets: ArcSwap::from_pointee(HashMap::new()),
        }
    }

    pub fn get(&self, id: &str) -> Option<Arc<W>> {
        self.widgets.load().get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.widgets.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.widgets.load().is_empty()
    }

    pub fn ids(&self) -> Vec<String> {
        self.widgets.load().keys().cloned().collect()
    }

    /// Register a fully-loaded instance. An explicit reload must
    /// remove-then-insert (or [`replace_all`](Self::replace_all)); a
    /// duplicate ID is rejected, never silently overwritten.
    ///
    /// Registration runs during the externally-serialized load phase;
    /// concurrent registrations are not supported.
    pub fn register(&self, widget: W) -> Result<Arc<W>, WidgetError> {
        let current = self.widgets.load_full();
        if current.contains_key(widget.id()) {
            return Err(WidgetError::DuplicateWidgetId {
                kind: W::KIND,
                id: widget.id().to_string(),
            });
        }
        let instance = Arc::new(widget);
        let mut next = HashMap::clone(&current);
        next.insert(instance.id().to_string(), instance.clone());
        self.widgets.store(Arc::new(next));
        Ok(instance)
    }

    pub fn remove(&self, id: &str) -> Option<Arc<W>> {
        let current = self.widgets.load_full();
        if !current.contains_key(id) {
            return None;
        }
        let mut next = HashMap::clone(&current);
        let removed = next.remove(id);
        self.widgets.store(Arc::new(next));
        removed
    }

    /// Atomically swap in a complete replacement set (reload support).
    pub fn replace_all(&self, widgets: HashMap<String, Arc<W>>) {
        self.widgets.store(Arc::new(widgets));
    }

    /// Snapshot of the current set; cheap, lock-free and stable for the
    /// lifetime of the returned Arc.
    pub fn snapshot(&self) -> Arc<HashMap<String, Arc<W>>> {
        self.widgets.load_full()
    }
}

impl<W: Widget> Default for WidgetRegistry<W> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Dummy(String);

    impl Widget for Dummy {
        const KIND: &'static str = "dummy";
        fn id(&self) -> &str {
            &self.0
        }
    }

    #[test]
    fn register_then_get() {
        let registry = WidgetRegistry::new();
        registry.register(Dummy("pet".into())).unwrap();
        assert_eq!(registry.get("pet").unwrap().id(), "pet");
        assert!(registry.get("missing").is_none());
    }

    #[test]
    fn duplicate_id_is_rejected() {
        let registry = WidgetRegistry::new();
        registry.register(Dummy("pet".into())).unwrap();
        let err = registry.register(Dummy("pet".into())).unwrap_err();
        match err {
            WidgetError::DuplicateWidgetId { kind, id } => {
                assert_eq!(kind, "dummy");
                assert_eq!(id, "pet");
            }
        }
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn remove_then_insert_supports_explicit_reload() {
        let registry = WidgetRegistry::new();
        registry.register(Dummy("pet".into())).unwrap();
        assert!(registry.remove("pet").is_some());
        registry.register(Dummy("pet".into())).unwrap();
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn replace_all_swaps_the_whole_set() {
        let registry = WidgetRegistry::new();
        registry.register(Dummy("old".into())).unwrap();

        let snapshot = registry.snapshot();

        let mut next = HashMap::new();
        next.insert("new".to_string(), Arc::new(Dummy("new".into())));
        registry.replace_all(next);

        assert!(registry.get("old").is_none());
        assert!(registry.get("new").is_some());
        // Earlier snapshots keep observing the set they loaded.
        assert!(snapshot.contains_key("old"));
    }
}
