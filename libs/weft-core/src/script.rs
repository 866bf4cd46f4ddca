//! Script-engine contract.
//!
//! Auxiliary business logic files (`.js`) found next to fragment libraries
//! are handed off by name to an external scripting engine. A failed script
//! load is logged and skipped by the caller; it is never fatal to a load.

use dashmap::DashMap;

/// Receives named callable scripts during a library load.
pub trait ScriptEngine: Send + Sync {
    fn load(&self, name: &str, source: &str) -> anyhow::Result<()>;
}

/// Default engine that records scripts by name for later lookup by the
/// embedding application.
#[derive(Debug, Default)]
pub struct ScriptStore {
    scripts: DashMap<String, String>,
}

impl ScriptStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<String> {
        self.scripts.get(name).map(|s| s.value().clone())
    }

    pub fn names(&self) -> Vec<String> {
        self.scripts.iter().map(|e| e.key().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.scripts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scripts.is_empty()
    }
}

impl ScriptEngine for ScriptStore {
    fn load(&self, name: &str, source: &str) -> anyhow::Result<()> {
        self.scripts.insert(name.to_string(), source.to_string());
        Ok(())
    }
}
