//! The list definition shape.
//!
//! A definition file decodes in two steps: the raw serde shape keeps every
//! importable section as untyped JSON, then [`ListDsl::from_raw`] runs each
//! section through the field decoder so columns, filters, layout and action
//! descriptors can import library fragments.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use weft_core::field::kinds::{ApiSpec, Column, Filter, Page};
use weft_core::{FieldDecoder, FieldError, Widget};

use crate::action::ListAction;

#[derive(Debug, Error)]
pub enum DslError {
    #[error("the list widget definition is not a valid shape")]
    Shape {
        #[from]
        source: serde_json::Error,
    },
    #[error("the {section} section of the list widget {id} is invalid")]
    Section {
        id: String,
        section: &'static str,
        #[source]
        source: FieldError,
    },
}

#[derive(Debug, Default, Deserialize)]
struct RawListDsl {
    #[serde(default)]
    name: String,
    #[serde(default)]
    action: Map<String, Value>,
    #[serde(default)]
    columns: Map<String, Value>,
    #[serde(default)]
    filters: Map<String, Value>,
    #[serde(default)]
    layout: Option<Value>,
}

/// The six action descriptors of a list instance. Every entry holds a
/// non-empty process name after construction: absent or empty processes
/// fall back to the kind's `weft.list.*` defaults.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ActionSet {
    pub setting: ApiSpec,
    pub get: ApiSpec,
    pub component: ApiSpec,
    pub upload: ApiSpec,
    pub download: ApiSpec,
    pub save: ApiSpec,
}

impl ActionSet {
    fn from_raw(id: &str, raw: &Map<String, Value>, decoder: FieldDecoder) -> Result<Self, DslError> {
        let mut set = Self::default();
        for action in ListAction::ALL {
            let mut spec = match raw.get(action.key()) {
                Some(value) => decoder.decode::<ApiSpec>(value).map_err(|source| {
                    DslError::Section {
                        id: id.to_string(),
                        section: action.key(),
                        source,
                    }
                })?,
                None => ApiSpec::default(),
            };
            if spec.process.is_empty() {
                spec.process = action.default_process().to_string();
            }
            *set.entry_mut(action) = spec;
        }
        Ok(set)
    }

    pub fn get(&self, action: ListAction) -> &ApiSpec {
        match action {
            ListAction::Setting => &self.setting,
            ListAction::Get => &self.get,
            ListAction::Component => &self.component,
            ListAction::Upload => &self.upload,
            ListAction::Download => &self.download,
            ListAction::Save => &self.save,
        }
    }

    fn entry_mut(&mut self, action: ListAction) -> &mut ApiSpec {
        match action {
            ListAction::Setting => &mut self.setting,
            ListAction::Get => &mut self.get,
            ListAction::Component => &mut self.component,
            ListAction::Upload => &mut self.upload,
            ListAction::Download => &mut self.download,
            ListAction::Save => &mut self.save,
        }
    }
}

/// A fully-resolved list instance. Every importable section has been bound
/// against the fragment library; serializing the value yields the composed
/// spec handed to clients by the setting action.
#[derive(Debug, Serialize)]
pub struct ListDsl {
    pub id: String,
    pub name: String,
    pub action: ActionSet,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub columns: BTreeMap<String, Column>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub filters: BTreeMap<String, Filter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layout: Option<Page>,
}

impl ListDsl {
    /// Decode a raw definition into a routable instance. Fails on the first
    /// malformed or unresolvable section; a partially-resolved instance is
    /// never produced.
    pub fn from_raw(id: &str, raw: &Value, decoder: FieldDecoder) -> Result<Self, DslError> {
        let raw: RawListDsl = serde_json::from_value(raw.clone())?;

        let columns = decoder
            .decode_map::<Column>(&raw.columns)
            .map_err(|source| DslError::Section {
                id: id.to_string(),
                section: "columns",
                source,
            })?;
        let filters = decoder
            .decode_map::<Filter>(&raw.filters)
            .map_err(|source| DslError::Section {
                id: id.to_string(),
                section: "filters",
                source,
            })?;
        let layout = raw
            .layout
            .as_ref()
            .map(|value| decoder.decode::<Page>(value))
            .transpose()
            .map_err(|source| DslError::Section {
                id: id.to_string(),
                section: "layout",
                source,
            })?;
        let action = ActionSet::from_raw(id, &raw.action, decoder)?;

        let name = if raw.name.is_empty() {
            id.to_string()
        } else {
            raw.name
        };

        Ok(Self {
            id: id.to_string(),
            name,
            action,
            columns,
            filters,
            layout,
        })
    }
}

impl Widget for ListDsl {
    const KIND: &'static str = "list";

    fn id(&self) -> &str {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use weft_core::FragmentRegistry;

    fn registry() -> FragmentRegistry {
        let mut registry = FragmentRegistry::new();
        let Value::Object(fragment) = json!({
            "label": "{{ $in.0 }}",
            "view": {"type": "label"},
            "edit": {"type": "input", "props": "?:$in.1"}
        }) else {
            unreachable!()
        };
        registry.insert("ui.text", fragment);
        registry
    }

    #[test]
    fn columns_and_filters_resolve_imports() {
        let registry = registry();
        let decoder = FieldDecoder::new(&registry);

        let dsl = ListDsl::from_raw(
            "pet",
            &json!({
                "name": "Pets",
                "columns": {
                    "name": {"@": "ui.text", "in": ["Name", {"maxLength": 20}], "bind": "name"},
                    "age": {"label": "Age", "bind": "age"}
                },
                "filters": {
                    "keyword": {"label": "Keyword", "bind": "where.name.match"}
                }
            }),
            decoder,
        )
        .unwrap();

        assert_eq!(dsl.name, "Pets");
        assert_eq!(dsl.columns["name"].label, "Name");
        assert_eq!(
            dsl.columns["name"].edit.as_ref().unwrap().props["maxLength"],
            json!(20)
        );
        assert_eq!(dsl.columns["age"].label, "Age");
        assert_eq!(dsl.filters["keyword"].bind.as_deref(), Some("where.name.match"));
    }

    #[test]
    fn actions_default_to_the_kind_processes() {
        let registry = FragmentRegistry::new();
        let decoder = FieldDecoder::new(&registry);

        let dsl = ListDsl::from_raw(
            "pet",
            &json!({
                "action": {
                    "save": {"process": "flows.pet.save", "guard": "bearer-jwt"}
                }
            }),
            decoder,
        )
        .unwrap();

        assert_eq!(dsl.action.setting.process, "weft.list.setting");
        assert_eq!(dsl.action.get.process, "weft.list.find");
        assert_eq!(dsl.action.save.process, "flows.pet.save");
        assert_eq!(dsl.action.save.guard.as_deref(), Some("bearer-jwt"));
        assert!(dsl.name == "pet");
    }

    #[test]
    fn malformed_sections_fail_the_whole_decode() {
        let registry = FragmentRegistry::new();
        let decoder = FieldDecoder::new(&registry);

        let err = ListDsl::from_raw(
            "pet",
            &json!({
                "columns": {
                    "broken": {"@": "missing.fragment"}
                }
            }),
            decoder,
        )
        .unwrap_err();

        match err {
            DslError::Section { id, section, .. } => {
                assert_eq!(id, "pet");
                assert_eq!(section, "columns");
            }
            other => panic!("expected Section error, got {other:?}"),
        }
    }
}
