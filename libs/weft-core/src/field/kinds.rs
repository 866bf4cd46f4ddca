//! Typed shapes for the importable field kinds.
//!
//! Every kind carries a flattened [`ImportDirective`]: empty after a normal
//! decode, populated as literal data when a bound fragment itself contained
//! a directive (single-level import policy).

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::ImportDirective;

/// A rendered component description: a cell view, an input, a row action.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Render {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub props: Map<String, Value>,
    #[serde(flatten)]
    pub directive: ImportDirective,
}

/// A list/table column: how a bound record field is viewed and edited.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Column {
    #[serde(default)]
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view: Option<Render>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edit: Option<Render>,
    #[serde(flatten)]
    pub directive: ImportDirective,
}

/// A query filter control above a list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    #[serde(default)]
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<Render>,
    #[serde(flatten)]
    pub directive: ImportDirective,
}

/// Page-level presentation of a widget.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Page {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary: Option<String>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub layout: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub option: Map<String, Value>,
    #[serde(flatten)]
    pub directive: ImportDirective,
}

/// A widget API action descriptor: which process backs an action, which
/// guard protects it and the action's default arguments.
///
/// `defaults` (the definition's `default` array) is carried on the
/// composed spec as data; the dispatcher does not merge it into call
/// arguments. Merging defaults is the responsibility of the process
/// backing the action.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiSpec {
    #[serde(default)]
    pub process: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guard: Option<String>,
    #[serde(rename = "default", default, skip_serializing_if = "Vec::is_empty")]
    pub defaults: Vec<Value>,
    #[serde(default)]
    pub disable: bool,
    #[serde(flatten)]
    pub directive: ImportDirective,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn api_spec_decodes_with_defaults() {
        let spec: ApiSpec = serde_json::from_value(json!({
            "process": "flows.list.save",
            "guard": "bearer-jwt",
            "default": [null, {"notify": true}]
        }))
        .unwrap();
        assert_eq!(spec.process, "flows.list.save");
        assert_eq!(spec.guard.as_deref(), Some("bearer-jwt"));
        assert_eq!(spec.defaults.len(), 2);
        assert!(!spec.disable);
        assert!(spec.directive.is_empty());
    }

    #[test]
    fn render_round_trips_without_empty_noise() {
        let raw = json!({"type": "select", "props": {"options": ["a", "b"]}});
        let render: Render = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(serde_json::to_value(&render).unwrap(), raw);
    }
}
