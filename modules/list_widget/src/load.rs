//! Directory loader for list definitions.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use weft_core::fragment::{spec_name, walk};
use weft_core::{FieldDecoder, WidgetRegistry};

use crate::dsl::ListDsl;

/// Load every `.json` definition under `root` and atomically swap the
/// resulting set into `registry`. IDs derive from the relative file path
/// the same way fragment names do (`crm/pet.list.json` → `crm.pet.list`).
///
/// Any malformed or unresolvable definition fails the whole load and
/// leaves the registry untouched, so a partially-built set never becomes
/// routable. Called at startup and by explicit, externally-serialized
/// reloads.
pub fn load_dir(
    registry: &WidgetRegistry<ListDsl>,
    root: &Path,
    decoder: FieldDecoder,
) -> anyhow::Result<usize> {
    let mut widgets: HashMap<String, Arc<ListDsl>> = HashMap::new();

    if root.is_dir() {
        for path in walk(root, "json")? {
            let id = spec_name(root, &path);
            let content = fs::read(&path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            let raw: serde_json::Value = serde_json::from_slice(&content)
                .with_context(|| format!("the list widget file {} is not valid JSON", path.display()))?;
            let dsl = ListDsl::from_raw(&id, &raw, decoder)
                .with_context(|| format!("failed to load {}", path.display()))?;
            widgets.insert(id, Arc::new(dsl));
        }
    }

    let count = widgets.len();
    registry.replace_all(widgets);
    info!(root = %root.display(), widgets = count, "list widgets loaded");
    Ok(count)
}
