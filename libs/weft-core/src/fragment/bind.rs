//! Import argument binding.
//!
//! When a field imports a fragment, the directive's ordered `in` arguments
//! are exposed through a binding context addressable as `$in`, `$in.0`,
//! `$in.0.label`, …; every placeholder in the fragment body that references
//! the context is replaced before the fragment is applied.
//!
//! Substitution is a typed walk over the JSON value tree, not a regex pass
//! over serialized text: whole-value placeholders (`?:$in.0`) keep the
//! addressed value's type, and `{{ $in.0 }}` occurrences inside strings are
//! stringified in place. Strings that do not reference the binding context
//! pass through untouched; they may belong to other engines and are not
//! ours to resolve.

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;
use serde_json::{Map, Value};
use thiserror::Error;

use super::FragmentRegistry;

/// Root path of the binding context.
pub const IN_ROOT: &str = "$in";

const VALUE_PREFIX: &str = "?:";

#[derive(Debug, Error)]
pub enum BindError {
    #[error("the shared fragment {0} does not exist")]
    FragmentNotFound(String),
    #[error("the placeholder {path} cannot be resolved")]
    Unresolved { path: String },
}

fn template_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{\{\s*([^{}]+?)\s*\}\}").expect("placeholder pattern is valid"))
}

/// Flattened view of the directive's `in` arguments.
///
/// Every nested path is individually addressable, so `?:$in.1.props` works
/// the same as `?:$in.1`.
#[derive(Debug, Default)]
pub struct BindingContext {
    entries: HashMap<String, Value>,
}

impl BindingContext {
    pub fn with_args(args: &[Value]) -> Self {
        let mut entries = HashMap::new();
        entries.insert(IN_ROOT.to_string(), Value::Array(args.to_vec()));
        for (index, arg) in args.iter().enumerate() {
            flatten(&format!("{IN_ROOT}.{index}"), arg, &mut entries);
        }
        Self { entries }
    }

    pub fn get(&self, path: &str) -> Option<&Value> {
        self.entries.get(path)
    }

    /// Whether an expression addresses this context at all. Out-of-context
    /// expressions are left alone by substitution.
    pub fn references(path: &str) -> bool {
        path == IN_ROOT || path.starts_with("$in.")
    }
}

fn flatten(prefix: &str, value: &Value, out: &mut HashMap<String, Value>) {
    out.insert(prefix.to_string(), value.clone());
    match value {
        Value::Object(map) => {
            for (key, nested) in map {
                flatten(&format!("{prefix}.{key}"), nested, out);
            }
        }
        Value::Array(items) => {
            for (index, nested) in items.iter().enumerate() {
                flatten(&format!("{prefix}.{index}"), nested, out);
            }
        }
        _ => {}
    }
}

/// Replace every binding-context placeholder in `value`.
///
/// A reference to an out-of-range index or unresolvable path is malformed
/// configuration and fails the bind; nothing is ever silently defaulted.
pub fn substitute(value: &Value, ctx: &BindingContext) -> Result<Value, BindError> {
    match value {
        Value::String(s) => substitute_str(s, ctx),
        Value::Array(items) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                out.push(substitute(item, ctx)?);
            }
            Ok(Value::Array(out))
        }
        Value::Object(map) => {
            let mut out = Map::with_capacity(map.len());
            for (key, nested) in map {
                out.insert(key.clone(), substitute(nested, ctx)?);
            }
            Ok(Value::Object(out))
        }
        other => Ok(other.clone()),
    }
}

fn substitute_str(s: &str, ctx: &BindingContext) -> Result<Value, BindError> {
    // Whole-value replacement keeps the addressed value's JSON type.
    if let Some(expr) = s.strip_prefix(VALUE_PREFIX) {
        let expr = expr.trim();
        if BindingContext::references(expr) {
            return ctx
                .get(expr)
                .cloned()
                .ok_or_else(|| BindError::Unresolved {
                    path: expr.to_string(),
                });
        }
        return Ok(Value::String(s.to_string()));
    }

    if !s.contains("{{") {
        return Ok(Value::String(s.to_string()));
    }

    let mut missing: Option<String> = None;
    let rendered = template_re().replace_all(s, |caps: &regex::Captures<'_>| {
        let expr = caps[1].trim();
        if !BindingContext::references(expr) {
            return caps[0].to_string();
        }
        match ctx.get(expr) {
            Some(value) => stringify(value),
            None => {
                missing.get_or_insert_with(|| expr.to_string());
                String::new()
            }
        }
    });
    if let Some(path) = missing {
        return Err(BindError::Unresolved { path });
    }
    Ok(Value::String(rendered.into_owned()))
}

fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

impl FragmentRegistry {
    /// Resolve an import directive against this registry.
    ///
    /// An empty fragment name is a pass-through: `Ok(None)`, no
    /// transformation. Otherwise the fragment body is returned with every
    /// binding-context placeholder substituted.
    pub fn resolve(&self, name: &str, args: &[Value]) -> Result<Option<Value>, BindError> {
        if name.is_empty() {
            return Ok(None);
        }
        let fragment = self
            .get(name)
            .ok_or_else(|| BindError::FragmentNotFound(name.to_string()))?;
        let ctx = BindingContext::with_args(args);
        let bound = substitute(&Value::Object(fragment.clone()), &ctx)?;
        Ok(Some(bound))
    }
}
