use crate::config::AppConfig;
use std::sync::Arc;

/// Configuration provider trait for widget modules.
pub trait ConfigProvider: Send + Sync {
    /// Get the configuration section for a specific module.
    fn get_module_config(&self, module_name: &str) -> Option<&serde_json::Value>;
}

/// Implementation of ConfigProvider that uses AppConfig.
pub struct AppConfigProvider(Arc<AppConfig>);

impl AppConfigProvider {
    pub fn new(config: AppConfig) -> Self {
        Self(Arc::new(config))
    }

    pub fn from_arc(config: Arc<AppConfig>) -> Self {
        Self(config)
    }

    pub fn inner(&self) -> &AppConfig {
        &self.0
    }
}

impl ConfigProvider for AppConfigProvider {
    fn get_module_config(&self, module_name: &str) -> Option<&serde_json::Value> {
        self.0.modules.get(module_name)
    }
}

/// Decode a module's config section into a typed struct, falling back to
/// its `Default` when the section is absent.
pub fn module_config_typed<T>(provider: &dyn ConfigProvider, module_name: &str) -> anyhow::Result<T>
where
    T: serde::de::DeserializeOwned + Default,
{
    match provider.get_module_config(module_name) {
        Some(value) => serde_json::from_value(value.clone()).map_err(|e| {
            anyhow::anyhow!("invalid configuration for module '{module_name}': {e}")
        }),
        None => Ok(T::default()),
    }
}
