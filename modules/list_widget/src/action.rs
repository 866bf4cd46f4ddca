//! Route-to-action matching.
//!
//! The list kind exposes a closed set of six actions. Matching is an exact
//! lookup on the canonical route template the transport already resolved
//! (axum's `MatchedPath`), never pattern matching on the request path.

use std::sync::Arc;
use thiserror::Error;

use weft_core::{Problem, WidgetRegistry};

use crate::dsl::ListDsl;

/// Route prefix shared by every list endpoint.
pub const ROUTE_GROUP: &str = "/api/__weft/list";

/// The closed action table of the list kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListAction {
    Setting,
    Get,
    Component,
    Upload,
    Download,
    Save,
}

impl ListAction {
    pub const ALL: [ListAction; 6] = [
        Self::Setting,
        Self::Get,
        Self::Component,
        Self::Upload,
        Self::Download,
        Self::Save,
    ];

    /// Key of this action in a definition file's `action` section.
    pub fn key(self) -> &'static str {
        match self {
            Self::Setting => "setting",
            Self::Get => "get",
            Self::Component => "component",
            Self::Upload => "upload",
            Self::Download => "download",
            Self::Save => "save",
        }
    }

    /// Process invoked when the definition does not override it.
    pub fn default_process(self) -> &'static str {
        match self {
            Self::Setting => "weft.list.setting",
            Self::Get => "weft.list.find",
            Self::Component => "weft.list.component",
            Self::Upload => "weft.list.upload",
            Self::Download => "weft.list.download",
            Self::Save => "weft.list.save",
        }
    }

    /// Canonical route template of this action.
    pub fn route_template(self) -> &'static str {
        match self {
            Self::Setting => "/api/__weft/list/{id}/setting",
            Self::Get => "/api/__weft/list/{id}/get",
            Self::Component => "/api/__weft/list/{id}/component/{xpath}/{method}",
            Self::Upload => "/api/__weft/list/{id}/upload/{xpath}/{method}",
            Self::Download => "/api/__weft/list/{id}/download/{field}",
            Self::Save => "/api/__weft/list/{id}/save",
        }
    }

    /// Exact match over the closed template set; total over all inputs.
    pub fn from_route(template: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|action| action.route_template() == template)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RouteError {
    #[error("the list widget id is required")]
    MissingId,
    #[error("the list widget {0} does not exist")]
    WidgetNotFound(String),
    #[error("the list widget {id} {path} action does not exist")]
    ActionNotFound { id: String, path: String },
}

impl RouteError {
    fn status(&self) -> u16 {
        match self {
            Self::MissingId => 400,
            Self::WidgetNotFound(_) | Self::ActionNotFound { .. } => 404,
        }
    }
}

impl From<RouteError> for Problem {
    fn from(err: RouteError) -> Self {
        Problem::new(err.status(), err.to_string())
    }
}

/// Resolve a request to its widget instance and action. Pure lookup; never
/// touches instance state.
pub fn match_action(
    registry: &WidgetRegistry<ListDsl>,
    id: &str,
    template: &str,
) -> Result<(Arc<ListDsl>, ListAction), RouteError> {
    if id.is_empty() {
        return Err(RouteError::MissingId);
    }
    let widget = registry
        .get(id)
        .ok_or_else(|| RouteError::WidgetNotFound(id.to_string()))?;
    let action = ListAction::from_route(template).ok_or_else(|| RouteError::ActionNotFound {
        id: id.to_string(),
        path: template.to_string(),
    })?;
    Ok((widget, action))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsl::ListDsl;
    use serde_json::json;
    use weft_core::{FieldDecoder, FragmentRegistry};

    fn registry_with_pet() -> WidgetRegistry<ListDsl> {
        let fragments = FragmentRegistry::new();
        let decoder = FieldDecoder::new(&fragments);
        let registry = WidgetRegistry::new();
        registry
            .register(ListDsl::from_raw("pet", &json!({}), decoder).unwrap())
            .unwrap();
        registry
    }

    #[test]
    fn every_template_maps_to_exactly_one_action() {
        for action in ListAction::ALL {
            assert_eq!(ListAction::from_route(action.route_template()), Some(action));
        }
        assert_eq!(ListAction::from_route("/api/__weft/list/{id}/drop"), None);
        assert_eq!(ListAction::from_route(""), None);
    }

    #[test]
    fn match_resolves_widget_and_action() {
        let registry = registry_with_pet();
        let (widget, action) =
            match_action(&registry, "pet", "/api/__weft/list/{id}/setting").unwrap();
        assert_eq!(widget.id, "pet");
        assert_eq!(action, ListAction::Setting);
    }

    #[test]
    fn missing_widget_fails_before_template_matching() {
        let registry = registry_with_pet();
        let err = match_action(&registry, "ghost", "/api/__weft/list/{id}/setting").unwrap_err();
        assert_eq!(err, RouteError::WidgetNotFound("ghost".into()));
        assert_eq!(err.to_string(), "the list widget ghost does not exist");
    }

    #[test]
    fn unknown_template_fails_action_not_found() {
        let registry = registry_with_pet();
        let err = match_action(&registry, "pet", "/api/__weft/list/{id}/drop").unwrap_err();
        assert_eq!(
            err.to_string(),
            "the list widget pet /api/__weft/list/{id}/drop action does not exist"
        );
        let problem = Problem::from(err);
        assert_eq!(problem.code, 404);
    }

    #[test]
    fn empty_id_is_a_bad_request() {
        let registry = registry_with_pet();
        let err = match_action(&registry, "", "/api/__weft/list/{id}/setting").unwrap_err();
        assert_eq!(Problem::from(err).code, 400);
    }
}
