use serde::{Deserialize, Serialize};

/// Key of this module's section in the per-module configuration bag.
pub const MODULE_NAME: &str = "list";

/// List widget module configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ListConfig {
    /// Directory of list definition files, relative to the application root
    /// unless absolute.
    #[serde(default = "default_dir")]
    pub dir: String,
}

fn default_dir() -> String {
    "lists".to_string()
}

impl Default for ListConfig {
    fn default() -> Self {
        Self { dir: default_dir() }
    }
}
