//! Default processes of the list kind.
//!
//! Only the definition-driven processes live here: `setting` returns the
//! composed instance spec and `component` navigates it by xpath. The
//! data-backed processes (`weft.list.find`, `save`, `upload`, `download`)
//! touch the data layer and are registered by the embedding application.

use std::sync::Arc;

use serde_json::Value;

use weft_core::{ProcessSet, WidgetRegistry};

use crate::dsl::ListDsl;

/// Register the definition-driven list processes on `set`.
pub fn register_processes(set: &ProcessSet, registry: Arc<WidgetRegistry<ListDsl>>) {
    let reg = registry.clone();
    set.register("weft.list.setting", move |args| {
        let reg = reg.clone();
        async move {
            let widget = lookup(&reg, &args)?;
            Ok(serde_json::to_value(widget.as_ref())?)
        }
    });

    set.register("weft.list.component", move |args| {
        let reg = registry.clone();
        async move {
            let widget = lookup(&reg, &args)?;
            let xpath = args
                .get(1)
                .and_then(Value::as_str)
                .ok_or_else(|| anyhow::anyhow!("the xpath argument is required"))?;
            let spec = serde_json::to_value(widget.as_ref())?;
            navigate(&spec, xpath).cloned().ok_or_else(|| {
                anyhow::anyhow!("the list widget {} component {xpath} does not exist", widget.id)
            })
        }
    });
}

fn lookup(registry: &WidgetRegistry<ListDsl>, args: &[Value]) -> anyhow::Result<Arc<ListDsl>> {
    let id = args
        .first()
        .and_then(Value::as_str)
        .ok_or_else(|| anyhow::anyhow!("the widget id argument is required"))?;
    registry
        .get(id)
        .ok_or_else(|| anyhow::anyhow!("the list widget {id} does not exist"))
}

/// Walk a dotted xpath (`columns.name.edit`, `filters.0`, …) through the
/// composed spec. Array segments are numeric indices.
fn navigate<'a>(spec: &'a Value, xpath: &str) -> Option<&'a Value> {
    let mut current = spec;
    for segment in xpath.split('.') {
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}
