//! Startup orchestration: load definitions, wire the widget surface,
//! serve.
//!
//! Load ordering is strict: fragments (and scripts) first, then widgets —
//! field decoding resolves imports against the fragment library, so a
//! widget never becomes routable with unresolved references.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::Router;
use tokio_util::sync::CancellationToken;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use list_widget::{ListDsl, ListState};
use weft_bootstrap::{module_config_typed, wait_for_shutdown, AppConfig, AppConfigProvider};
use weft_core::{
    DuplicatePolicy, FieldDecoder, FragmentRegistry, GuardSet, ProcessSet, ScriptStore,
    WidgetRegistry,
};

#[derive(Debug)]
struct Loaded {
    fragments: FragmentRegistry,
    scripts: ScriptStore,
    widgets: Arc<WidgetRegistry<ListDsl>>,
    list_count: usize,
}

fn load_definitions(config: &AppConfig) -> Result<Loaded> {
    let policy = if config.app.strict_fragments {
        DuplicatePolicy::Fail
    } else {
        DuplicatePolicy::Overwrite
    };

    let mut fragments = FragmentRegistry::with_duplicate_policy(policy);
    let scripts = ScriptStore::new();
    fragments
        .load_dir(config.app.lib_path(), Some(&scripts))
        .context("failed to load the fragment library")?;

    let provider = AppConfigProvider::new(config.clone());
    let list_config: list_widget::ListConfig =
        module_config_typed(&provider, list_widget::config::MODULE_NAME)?;

    let widgets = Arc::new(WidgetRegistry::new());
    let list_count = list_widget::load_dir(
        &widgets,
        &config.app.widget_path(&list_config.dir),
        FieldDecoder::new(&fragments),
    )?;

    Ok(Loaded {
        fragments,
        scripts,
        widgets,
        list_count,
    })
}

pub async fn run_server(config: AppConfig) -> Result<()> {
    info!("Weft Server starting");

    let loaded = load_definitions(&config)?;
    info!(
        fragments = loaded.fragments.len(),
        scripts = loaded.scripts.len(),
        lists = loaded.list_count,
        "definitions loaded"
    );

    let processes = Arc::new(ProcessSet::new());
    list_widget::register_processes(&processes, loaded.widgets.clone());

    let guards = Arc::new(GuardSet::new());
    let state = ListState::new(loaded.widgets.clone(), guards);
    let mut router: Router = list_widget::router(state, processes)?
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid));

    if config.server.timeout_sec > 0 {
        router = router.layer(TimeoutLayer::new(Duration::from_secs(config.server.timeout_sec)));
    }

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(addr = %addr, "listening");

    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        if let Err(e) = wait_for_shutdown().await {
            error!(error = %e, "signal handler failed");
        }
        signal_cancel.cancel();
    });

    axum::serve(listener, router)
        .with_graceful_shutdown(async move { cancel.cancelled().await })
        .await
        .context("server error")?;

    info!("Weft Server stopped");
    Ok(())
}

/// Validate configuration and every definition without serving. Exits
/// non-zero (via the propagated error) on any load failure.
pub fn check(config: AppConfig) -> Result<()> {
    let loaded = load_definitions(&config)?;
    println!("Configuration is valid");
    println!(
        "home_dir: {}\napp root: {}\nfragments: {}\nscripts: {}\nlist widgets: {}",
        config.server.home_dir,
        PathBuf::from(&config.app.root).display(),
        loaded.fragments.len(),
        loaded.scripts.len(),
        loaded.list_count,
    );
    for id in loaded.widgets.ids() {
        println!("  list: {id}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;

    fn write(dir: &Path, rel: &str, content: &str) {
        let path = dir.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    fn config_for(root: &Path) -> AppConfig {
        let mut config = AppConfig::default();
        config.app.root = root.to_string_lossy().to_string();
        config
    }

    #[test]
    fn definitions_load_in_dependency_order() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "libs/ui.json",
            r#"{"text": {"label": "{{ $in.0 }}"}}"#,
        );
        write(
            dir.path(),
            "lists/pet.json",
            r#"{"name": "Pets", "columns": {"name": {"@": "ui.text", "in": ["Name"], "bind": "name"}}}"#,
        );

        let loaded = load_definitions(&config_for(dir.path())).unwrap();
        assert_eq!(loaded.fragments.len(), 1);
        assert_eq!(loaded.list_count, 1);
        let pet = loaded.widgets.get("pet").unwrap();
        assert_eq!(pet.columns["name"].label, "Name");
    }

    #[test]
    fn unresolvable_widgets_fail_the_check() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "lists/pet.json",
            r#"{"columns": {"name": {"@": "missing.fragment"}}}"#,
        );

        let err = check(config_for(dir.path())).unwrap_err();
        assert!(err.to_string().contains("pet.json"));
    }

    #[test]
    fn strict_fragments_reject_duplicate_names() {
        let dir = tempfile::tempdir().unwrap();
        // Both files derive the dotted name "ui.text".
        write(dir.path(), "libs/ui.text.json", r#"{"label": {"bind": "a"}}"#);
        write(dir.path(), "libs/ui/text.json", r#"{"label": {"bind": "b"}}"#);

        let mut config = config_for(dir.path());
        assert!(load_definitions(&config).is_ok());

        config.app.strict_fragments = true;
        let err = load_definitions(&config).unwrap_err();
        assert!(err.to_string().contains("fragment library"));
    }
}
