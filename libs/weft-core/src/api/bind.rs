//! Data-driven transport binding.
//!
//! [`bind_surface`] installs one dispatch route per endpoint of a surface.
//! Dispatch has no per-endpoint code: it extracts the declared inputs from
//! the request, invokes the endpoint's process on the engine and shapes the
//! response per the output contract. Guard middleware is layered on top by
//! the widget module that owns the surface, so authorization always runs
//! before dispatch touches the body.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::OnceLock;

use axum::extract::{FromRequest, Multipart, Path, Query, Request};
use axum::response::{IntoResponse, Response};
use axum::routing::{on, MethodFilter};
use axum::{Json, RequestPartsExt, Router};
use base64::Engine as _;
use bytes::Bytes;
use http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use regex::Regex;
use serde_json::{json, Map, Value};
use tracing::debug;

use crate::api::problem::Problem;
use crate::api::surface::{ApiSurface, EndpointSpec, InputSource, OutputContract};
use crate::process::{ProcessEngine, ProcessError};

/// Install every endpoint of `surface` on the router, dispatching to
/// `engine`. Called exactly once per widget kind at process start.
pub fn bind_surface(
    mut router: Router,
    surface: &ApiSurface,
    engine: Arc<dyn ProcessEngine>,
) -> anyhow::Result<Router> {
    for endpoint in &surface.endpoints {
        let path = format!("{}{}", surface.group, endpoint.path);
        let filter = MethodFilter::try_from(endpoint.method.clone())
            .map_err(|e| anyhow::anyhow!("endpoint {} {}: {e}", endpoint.method, path))?;

        let spec = Arc::new(endpoint.clone());
        let eng = engine.clone();
        let handler = move |req: Request| {
            let spec = spec.clone();
            let eng = eng.clone();
            async move { dispatch(spec, eng, req).await }
        };

        debug!(
            method = %endpoint.method,
            path = %path,
            process = %endpoint.process,
            "endpoint registered"
        );
        router = router.route(&path, on(filter, handler));
    }
    Ok(router)
}

async fn dispatch(
    spec: Arc<EndpointSpec>,
    engine: Arc<dyn ProcessEngine>,
    req: Request,
) -> Response {
    match run(&spec, engine, req).await {
        Ok(response) => response,
        Err(problem) => problem.into_response(),
    }
}

async fn run(
    spec: &EndpointSpec,
    engine: Arc<dyn ProcessEngine>,
    req: Request,
) -> Result<Response, Problem> {
    let (mut parts, body) = req.into_parts();

    let params: HashMap<String, String> = match parts.extract::<Path<HashMap<String, String>>>().await
    {
        Ok(Path(map)) => map,
        Err(_) => HashMap::new(),
    };
    let query: HashMap<String, String> = match parts.extract::<Query<HashMap<String, String>>>().await
    {
        Ok(Query(map)) => map,
        Err(_) => HashMap::new(),
    };

    // The body is consumed at most once, by :payload or $file.
    let mut req = Some(Request::from_parts(parts, body));

    let mut args = Vec::with_capacity(spec.inputs.len());
    for input in &spec.inputs {
        let arg = match input {
            InputSource::Param(name) => Value::String(params.get(name).cloned().ok_or_else(
                || Problem::bad_request(format!("the {name} parameter is required")),
            )?),
            InputSource::Query(name) => query
                .get(name)
                .cloned()
                .map(Value::String)
                .unwrap_or(Value::Null),
            InputSource::QueryMap => Value::Object(
                query
                    .iter()
                    .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                    .collect(),
            ),
            InputSource::Payload => read_payload(&mut req).await?,
            InputSource::File(field) => read_file(&mut req, field).await?,
        };
        args.push(arg);
    }

    let result = engine
        .invoke(&spec.process, args)
        .await
        .map_err(|e| match e {
            ProcessError::NotFound(_) => Problem::not_found(e.to_string()),
            ProcessError::Failed { .. } => Problem::internal(e.to_string()),
        })?;

    render(&spec.output, result)
}

async fn read_payload(req: &mut Option<Request>) -> Result<Value, Problem> {
    let req = req
        .take()
        .ok_or_else(|| Problem::internal("request body already consumed"))?;
    let bytes = Bytes::from_request(req, &())
        .await
        .map_err(|e| Problem::bad_request(format!("failed to read request body: {e}")))?;
    if bytes.is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_slice(&bytes)
        .map_err(|e| Problem::bad_request(format!("invalid request payload: {e}")))
}

async fn read_file(req: &mut Option<Request>, field: &str) -> Result<Value, Problem> {
    let req = req
        .take()
        .ok_or_else(|| Problem::internal("request body already consumed"))?;
    let mut multipart = Multipart::from_request(req, &())
        .await
        .map_err(|e| Problem::bad_request(format!("invalid multipart request: {e}")))?;

    while let Some(part) = multipart
        .next_field()
        .await
        .map_err(|e| Problem::bad_request(format!("invalid multipart field: {e}")))?
    {
        if part.name() != Some(field) {
            continue;
        }
        let name = part.file_name().unwrap_or_default().to_string();
        let content_type = part.content_type().map(str::to_string);
        let content = part
            .bytes()
            .await
            .map_err(|e| Problem::bad_request(format!("failed to read uploaded file: {e}")))?;
        return Ok(json!({
            "name": name,
            "type": content_type,
            "content": base64::engine::general_purpose::STANDARD.encode(&content),
        }));
    }

    Err(Problem::bad_request(format!(
        "the {field} file field is required"
    )))
}

fn render(output: &OutputContract, result: Value) -> Result<Response, Problem> {
    match output {
        OutputContract::Json { status } => {
            let status = StatusCode::from_u16(*status).unwrap_or(StatusCode::OK);
            Ok((status, Json(result)).into_response())
        }
        OutputContract::Templated {
            status,
            body,
            headers,
        } => {
            let fields = match result {
                Value::Object(map) => map,
                other => {
                    // Non-object results are only addressable as a whole.
                    let mut map = Map::new();
                    map.insert("content".to_string(), other);
                    map
                }
            };

            let mut header_map = HeaderMap::new();
            for (name, template) in headers {
                let name = HeaderName::from_bytes(name.as_bytes())
                    .map_err(|_| Problem::internal(format!("invalid response header {name}")))?;
                let value = render_template(template, &fields);
                let value = HeaderValue::from_str(&value).map_err(|_| {
                    Problem::internal(format!("invalid response header value for {name}"))
                })?;
                header_map.insert(name, value);
            }

            let status = StatusCode::from_u16(*status).unwrap_or(StatusCode::OK);
            let body = render_template(body, &fields);
            Ok((status, header_map, body).into_response())
        }
    }
}

fn output_template_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{\{\s*([^{}]+?)\s*\}\}").expect("template pattern is valid"))
}

/// Resolve `{{key}}` occurrences against the process result object. Keys the
/// result does not carry render empty.
fn render_template(template: &str, fields: &Map<String, Value>) -> String {
    output_template_re()
        .replace_all(template, |caps: &regex::Captures<'_>| {
            match fields.get(caps[1].trim()) {
                Some(Value::String(s)) => s.clone(),
                Some(other) => other.to_string(),
                None => String::new(),
            }
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn templates_render_against_the_result_object() {
        let fields: Map<String, Value> = serde_json::from_value(json!({
            "content": "hello",
            "type": "text/plain"
        }))
        .unwrap();
        assert_eq!(render_template("{{content}}", &fields), "hello");
        assert_eq!(render_template("{{ type }}", &fields), "text/plain");
        assert_eq!(render_template("{{missing}}", &fields), "");
        assert_eq!(render_template("plain", &fields), "plain");
    }
}
