//! Per-request authorization middleware.
//!
//! Runs before dispatch for every list endpoint: resolve the id, look up
//! the widget, match the canonical route template to an action, then run
//! the action's named guard. Any failure aborts the request with a
//! serialized [`Problem`]; the body is never read here, so a rejected
//! upload is refused before its content is consumed.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{MatchedPath, Path, Query, Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::RequestPartsExt;
use tracing::debug;

use weft_core::{GuardSet, Problem, RequestContext, WidgetRegistry};

use crate::action::{match_action, RouteError};
use crate::dsl::ListDsl;

/// Shared state of the list REST surface.
#[derive(Clone)]
pub struct ListState {
    pub widgets: Arc<WidgetRegistry<ListDsl>>,
    pub guards: Arc<GuardSet>,
}

impl ListState {
    pub fn new(widgets: Arc<WidgetRegistry<ListDsl>>, guards: Arc<GuardSet>) -> Self {
        Self { widgets, guards }
    }
}

pub async fn guard(State(state): State<ListState>, req: Request, next: Next) -> Response {
    match authorize(&state, req).await {
        Ok(req) => next.run(req).await,
        Err(problem) => problem.into_response(),
    }
}

async fn authorize(state: &ListState, req: Request) -> Result<Request, Problem> {
    let (mut parts, body) = req.into_parts();

    let route = parts
        .extensions
        .get::<MatchedPath>()
        .map(|matched| matched.as_str().to_string())
        .unwrap_or_default();

    let params: HashMap<String, String> =
        match parts.extract::<Path<HashMap<String, String>>>().await {
            Ok(Path(map)) => map,
            Err(_) => HashMap::new(),
        };
    let query: HashMap<String, String> =
        match parts.extract::<Query<HashMap<String, String>>>().await {
            Ok(Query(map)) => map,
            Err(_) => HashMap::new(),
        };

    let id = params.get("id").cloned().unwrap_or_default();
    let (widget, action) = match_action(&state.widgets, &id, &route)?;

    let spec = widget.action.get(action);
    if spec.disable {
        return Err(RouteError::ActionNotFound { id, path: route }.into());
    }

    if let Some(name) = &spec.guard {
        let guard = state
            .guards
            .get(name)
            .ok_or_else(|| Problem::internal(format!("the guard {name} is not registered")))?;
        let ctx = RequestContext {
            route: route.clone(),
            params,
            query,
            headers: parts.headers.clone(),
            payload: None,
            file: None,
        };
        guard.check(&id, &ctx).await?;
        debug!(widget = %id, route = %route, guard = %name, "guard passed");
    }

    Ok(Request::from_parts(parts, body))
}
