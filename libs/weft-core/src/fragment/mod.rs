//! Shared definition fragments.
//!
//! A fragment is a JSON object (property name → value) that widget field
//! definitions can import by dotted name. Fragments are loaded once from a
//! library directory at startup; the registry is read-mostly afterwards.
//! Reload support builds a fresh registry and swaps it in at the holder
//! rather than mutating the live one.

pub mod bind;

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::script::ScriptEngine;

/// Reserved fragment property stripped at load time.
pub const COMMENT_KEY: &str = "__comment";

const FRAGMENT_EXT: &str = "json";
const SCRIPT_EXT: &str = "js";

/// A single library fragment: property name → raw definition value.
pub type Fragment = Map<String, Value>;

/// What to do when two files resolve to the same dotted fragment name.
///
/// The historical behavior is last-loaded-wins; strict mode turns the
/// conflict into a load failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplicatePolicy {
    #[default]
    Overwrite,
    Fail,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("the fragment file {path} is not a map of fragment name to field map")]
    Shape {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("duplicate fragment '{name}' loaded from {path}")]
    DuplicateFragment { name: String, path: PathBuf },
}

/// Dotted-name registry of library fragments.
///
/// Loading is a single-pass initialization step and is not reentrant;
/// callers serialize it externally (startup or an explicit reload). Reads
/// after load are pure.
#[derive(Debug, Default)]
pub struct FragmentRegistry {
    fragments: HashMap<String, Fragment>,
    duplicates: DuplicatePolicy,
}

impl FragmentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_duplicate_policy(policy: DuplicatePolicy) -> Self {
        Self {
            fragments: HashMap::new(),
            duplicates: policy,
        }
    }

    pub fn get(&self, name: &str) -> Option<&Fragment> {
        self.fragments.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fragments.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.fragments.keys().map(String::as_str).collect()
    }

    /// Insert a fragment under a dotted name, stripping the reserved
    /// comment property. Returns the previous fragment when overwriting.
    pub fn insert(&mut self, name: impl Into<String>, mut fragment: Fragment) -> Option<Fragment> {
        fragment.remove(COMMENT_KEY);
        self.fragments.insert(name.into(), fragment)
    }

    /// Recursively load every fragment file under `root`.
    ///
    /// Each `.json` file must decode as `map<fragment-key, fragment>`; its
    /// fragments are registered under `<dotted-relative-path>.<key>`. A file
    /// with any other top-level shape fails the whole load.
    ///
    /// `.js` files found in the same walk are handed to `scripts` by the
    /// same dotted name; a script that fails to load is logged and skipped.
    ///
    /// A missing `root` is treated as an empty library.
    pub fn load_dir(
        &mut self,
        root: impl AsRef<Path>,
        scripts: Option<&dyn ScriptEngine>,
    ) -> Result<(), LoadError> {
        let root = root.as_ref();
        if !root.is_dir() {
            debug!(root = %root.display(), "fragment library directory does not exist, skipping");
            return Ok(());
        }

        for path in walk(root, FRAGMENT_EXT)? {
            let name = spec_name(root, &path);
            let content = fs::read(&path).map_err(|source| LoadError::Io {
                path: path.clone(),
                source,
            })?;
            let libs: HashMap<String, Fragment> =
                serde_json::from_slice(&content).map_err(|source| LoadError::Shape {
                    path: path.clone(),
                    source,
                })?;
            for (key, fragment) in libs {
                let full = format!("{name}.{key}");
                if self.insert(full.clone(), fragment).is_some()
                    && self.duplicates == DuplicatePolicy::Fail
                {
                    return Err(LoadError::DuplicateFragment { name: full, path });
                }
            }
        }

        if let Some(scripts) = scripts {
            for path in walk(root, SCRIPT_EXT)? {
                let name = spec_name(root, &path);
                let source = fs::read_to_string(&path).map_err(|source| LoadError::Io {
                    path: path.clone(),
                    source,
                })?;
                if let Err(e) = scripts.load(&name, &source) {
                    warn!(script = %name, error = %e, "failed to load script, skipping");
                }
            }
        }

        info!(
            root = %root.display(),
            fragments = self.fragments.len(),
            "fragment library loaded"
        );
        Ok(())
    }
}

/// Derive the dotted definition name for `file` relative to `root`:
/// path separators become dots and the final extension is stripped.
pub fn spec_name(root: &Path, file: &Path) -> String {
    let rel = file.strip_prefix(root).unwrap_or(file);
    let mut parts: Vec<String> = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    if let Some(last) = parts.last_mut() {
        if let Some(dot) = last.rfind('.') {
            last.truncate(dot);
        }
    }
    parts.join(".")
}

/// Lexically ordered recursive walk collecting files with `ext`.
///
/// The ordering makes duplicate resolution (last-loaded-wins) deterministic.
pub fn walk(root: &Path, ext: &str) -> Result<Vec<PathBuf>, LoadError> {
    fn visit(dir: &Path, ext: &str, out: &mut Vec<PathBuf>) -> std::io::Result<()> {
        let mut entries = fs::read_dir(dir)?.collect::<Result<Vec<_>, _>>()?;
        entries.sort_by_key(|e| e.path());
        for entry in entries {
            let path = entry.path();
            if path.is_dir() {
                visit(&path, ext, out)?;
            } else if path.extension().and_then(|e| e.to_str()) == Some(ext) {
                out.push(path);
            }
        }
        Ok(())
    }

    let mut files = Vec::new();
    visit(root, ext, &mut files).map_err(|source| LoadError::Io {
        path: root.to_path_buf(),
        source,
    })?;
    Ok(files)
}
