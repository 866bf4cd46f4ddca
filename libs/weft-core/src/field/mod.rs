//! Importable field decoding.
//!
//! Field definitions inside a widget DSL may either be plain typed literals
//! or declare an import directive (`"@"` + `"in"`) that pulls a shared
//! fragment in with bound arguments. Decoding is a two-stage pipeline:
//!
//! 1. [`FieldSource::parse`] splits the raw value into `Literal` or
//!    `Import { directive, body }`.
//! 2. [`FieldDecoder::decode`] resolves the import (if any) against a
//!    fragment registry, overlays the bound fragment over the inline body
//!    (bound properties win) and decodes the result into the final type.
//!
//! Resolution is single-level by policy: a directive found inside a bound
//! fragment body is decoded as literal data, never chased. That bounds the
//! resolution cost and rules out import cycles.

pub mod kinds;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::fragment::bind::BindError;
use crate::fragment::FragmentRegistry;

/// JSON key of the import name on a field definition.
pub const IMPORT_KEY: &str = "@";
/// JSON key of the ordered import arguments.
pub const ARGS_KEY: &str = "in";

/// `{ "@": fragment name, "in": arguments }`. An empty name means "no
/// import, use the literal value as-is".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImportDirective {
    #[serde(rename = "@", default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(rename = "in", default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<Value>,
}

impl ImportDirective {
    pub fn new(name: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_empty()
    }
}

#[derive(Debug, Error)]
pub enum FieldError {
    #[error("invalid field definition")]
    Decode {
        #[from]
        source: serde_json::Error,
    },
    #[error(transparent)]
    Bind(#[from] BindError),
}

/// Stage one: the raw definition split into its two possible shapes.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldSource {
    /// No import declared; the value decodes as-is.
    Literal(Value),
    /// An import directive plus the remaining inline properties.
    Import {
        directive: ImportDirective,
        body: Map<String, Value>,
    },
}

impl FieldSource {
    pub fn parse(raw: &Value) -> Self {
        let Value::Object(map) = raw else {
            return Self::Literal(raw.clone());
        };
        let name = map
            .get(IMPORT_KEY)
            .and_then(Value::as_str)
            .unwrap_or_default();
        if name.is_empty() {
            return Self::Literal(raw.clone());
        }
        let args = map
            .get(ARGS_KEY)
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        let mut body = map.clone();
        body.remove(IMPORT_KEY);
        body.remove(ARGS_KEY);
        Self::Import {
            directive: ImportDirective::new(name, args),
            body,
        }
    }
}

/// Stage two: resolve against a fragment registry and produce typed fields.
#[derive(Clone, Copy)]
pub struct FieldDecoder<'a> {
    registry: &'a FragmentRegistry,
}

impl<'a> FieldDecoder<'a> {
    pub fn new(registry: &'a FragmentRegistry) -> Self {
        Self { registry }
    }

    /// Decode a raw field definition into `T`, resolving at most one level
    /// of import. After a successful decode the outer directive is gone;
    /// directives contained in the bound fragment body survive as literal
    /// data on the typed field.
    pub fn decode<T: DeserializeOwned>(&self, raw: &Value) -> Result<T, FieldError> {
        match FieldSource::parse(raw) {
            FieldSource::Literal(value) => Ok(serde_json::from_value(value)?),
            FieldSource::Import { directive, mut body } => {
                let bound = self
                    .registry
                    .resolve(&directive.name, &directive.args)?
                    .unwrap_or_else(|| Value::Object(Map::new()));
                if let Value::Object(props) = bound {
                    // Bound fragment properties overlay the inline literals.
                    for (key, value) in props {
                        body.insert(key, value);
                    }
                }
                Ok(serde_json::from_value(Value::Object(body))?)
            }
        }
    }

    /// Decode a map of named raw field definitions, e.g. a widget's columns.
    /// Sorted by name so load errors and serialized output are stable.
    pub fn decode_map<T: DeserializeOwned>(
        &self,
        raw: &Map<String, Value>,
    ) -> Result<std::collections::BTreeMap<String, T>, FieldError> {
        let mut out = std::collections::BTreeMap::new();
        for (name, value) in raw {
            out.insert(name.clone(), self.decode(value)?);
        }
        Ok(out)
    }
}
