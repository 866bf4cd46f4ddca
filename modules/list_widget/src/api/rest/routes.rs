//! The exported list REST surface.

use std::sync::Arc;

use axum::{middleware, Router};
use http::Method;

use weft_core::api::bind_surface;
use weft_core::{ApiSurface, EndpointSpec, InputSource, OutputContract, ProcessEngine};

use crate::action::{ListAction, ROUTE_GROUP};

use super::guard::{guard, ListState};

/// Build the declarative endpoint table of the list kind. Pure data, built
/// exactly once per process start; never inspects instance state.
pub fn export() -> ApiSurface {
    ApiSurface {
        name: "Widget List API".to_string(),
        description: "Widget List API".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        guard: None,
        group: ROUTE_GROUP.to_string(),
        endpoints: vec![
            EndpointSpec {
                label: "Setting".to_string(),
                description: "Setting".to_string(),
                path: "/{id}/setting".to_string(),
                method: Method::GET,
                process: ListAction::Setting.default_process().to_string(),
                inputs: vec![InputSource::Param("id".to_string())],
                output: OutputContract::json(200),
            },
            EndpointSpec {
                label: "Get".to_string(),
                description: "Get".to_string(),
                path: "/{id}/get".to_string(),
                method: Method::GET,
                process: ListAction::Get.default_process().to_string(),
                inputs: vec![
                    InputSource::Param("id".to_string()),
                    InputSource::QueryMap,
                ],
                output: OutputContract::json(200),
            },
            EndpointSpec {
                label: "Component".to_string(),
                description: "Component".to_string(),
                path: "/{id}/component/{xpath}/{method}".to_string(),
                method: Method::GET,
                process: ListAction::Component.default_process().to_string(),
                inputs: vec![
                    InputSource::Param("id".to_string()),
                    InputSource::Param("xpath".to_string()),
                    InputSource::Param("method".to_string()),
                    InputSource::QueryMap,
                ],
                output: OutputContract::json(200),
            },
            EndpointSpec {
                label: "Upload".to_string(),
                description: "Upload".to_string(),
                path: "/{id}/upload/{xpath}/{method}".to_string(),
                method: Method::POST,
                process: ListAction::Upload.default_process().to_string(),
                inputs: vec![
                    InputSource::Param("id".to_string()),
                    InputSource::Param("xpath".to_string()),
                    InputSource::Param("method".to_string()),
                    InputSource::File("file".to_string()),
                ],
                output: OutputContract::json(200),
            },
            EndpointSpec {
                label: "Download".to_string(),
                description: "Download".to_string(),
                path: "/{id}/download/{field}".to_string(),
                method: Method::GET,
                process: ListAction::Download.default_process().to_string(),
                inputs: vec![
                    InputSource::Param("id".to_string()),
                    InputSource::Param("field".to_string()),
                    InputSource::Query("name".to_string()),
                    InputSource::Query("token".to_string()),
                ],
                output: OutputContract::Templated {
                    status: 200,
                    body: "{{content}}".to_string(),
                    headers: vec![("Content-Type".to_string(), "{{type}}".to_string())],
                },
            },
            EndpointSpec {
                label: "Save".to_string(),
                description: "Save".to_string(),
                path: "/{id}/save".to_string(),
                method: Method::POST,
                process: ListAction::Save.default_process().to_string(),
                inputs: vec![
                    InputSource::Param("id".to_string()),
                    InputSource::Payload,
                ],
                output: OutputContract::json(200),
            },
        ],
    }
}

/// Build the list REST router: one data-driven dispatch route per exported
/// endpoint, with the authorization middleware layered on top so guards
/// always run before dispatch.
pub fn router(state: ListState, engine: Arc<dyn ProcessEngine>) -> anyhow::Result<Router> {
    let surface = export();
    let router = bind_surface(Router::new(), &surface, engine)?;
    Ok(router.layer(middleware::from_fn_with_state(state, guard)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn the_surface_covers_every_action_exactly_once() {
        let surface = export();
        assert_eq!(surface.endpoints.len(), ListAction::ALL.len());
        for action in ListAction::ALL {
            let full: Vec<String> = surface
                .endpoints
                .iter()
                .map(|e| format!("{}{}", surface.group, e.path))
                .collect();
            assert!(
                full.contains(&action.route_template().to_string()),
                "no endpoint for {action:?}"
            );
        }
    }

    #[test]
    fn endpoint_processes_match_the_action_defaults() {
        let surface = export();
        let save = surface
            .endpoints
            .iter()
            .find(|e| e.label == "Save")
            .unwrap();
        assert_eq!(save.method, Method::POST);
        assert_eq!(save.process, "weft.list.save");
        assert_eq!(
            save.inputs,
            vec![InputSource::Param("id".into()), InputSource::Payload]
        );
    }
}
