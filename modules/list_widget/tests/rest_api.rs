//! End-to-end tests of the list REST surface: routing, authorization
//! ordering and data-driven dispatch.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::Router;
use http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use list_widget::{register_processes, router, ListDsl, ListState};
use weft_core::{
    FieldDecoder, FragmentRegistry, Guard, GuardSet, Problem, ProcessEngine, ProcessError,
    ProcessSet, RequestContext, WidgetRegistry,
};

/// Engine that records every invocation and answers with a fixed value.
#[derive(Default)]
struct RecordingEngine {
    calls: Mutex<Vec<(String, Vec<Value>)>>,
    result: Value,
}

impl RecordingEngine {
    fn with_result(result: Value) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            result,
        }
    }

    fn calls(&self) -> Vec<(String, Vec<Value>)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ProcessEngine for RecordingEngine {
    async fn invoke(&self, name: &str, args: Vec<Value>) -> Result<Value, ProcessError> {
        self.calls.lock().unwrap().push((name.to_string(), args));
        Ok(self.result.clone())
    }
}

struct Reject;

#[async_trait]
impl Guard for Reject {
    async fn check(&self, _widget_id: &str, _ctx: &RequestContext) -> Result<(), Problem> {
        Err(Problem::new(400, "forbidden"))
    }
}

fn widgets(definition: Value) -> Arc<WidgetRegistry<ListDsl>> {
    let fragments = FragmentRegistry::new();
    let decoder = FieldDecoder::new(&fragments);
    let registry = Arc::new(WidgetRegistry::new());
    registry
        .register(ListDsl::from_raw("pet", &definition, decoder).unwrap())
        .unwrap();
    registry
}

fn app(registry: Arc<WidgetRegistry<ListDsl>>, engine: Arc<dyn ProcessEngine>) -> Router {
    let guards = Arc::new(GuardSet::new());
    guards.register("deny", Arc::new(Reject));
    let state = ListState::new(registry, guards);
    router(state, engine).unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn rejecting_guard_short_circuits_before_invoke() {
    let registry = widgets(json!({
        "action": {"save": {"guard": "deny"}}
    }));
    let engine = Arc::new(RecordingEngine::default());
    let app = app(registry, engine.clone());

    let response = app
        .oneshot(
            Request::post("/api/__weft/list/pet/save")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"data": [{"name": "Rex"}]}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await,
        json!({"code": 400, "message": "forbidden"})
    );
    assert!(engine.calls().is_empty(), "guard must run before dispatch");
}

#[tokio::test]
async fn missing_widget_is_a_404_problem() {
    let registry = widgets(json!({}));
    let engine = Arc::new(RecordingEngine::default());
    let app = app(registry, engine.clone());

    let response = app
        .oneshot(
            Request::get("/api/__weft/list/ghost/setting")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        body_json(response).await,
        json!({"code": 404, "message": "the list widget ghost does not exist"})
    );
    assert!(engine.calls().is_empty());
}

#[tokio::test]
async fn setting_returns_the_composed_spec() {
    let registry = widgets(json!({
        "name": "Pets",
        "action": {"get": {"default": [null, {"status": "available"}]}},
        "columns": {"name": {"label": "Name", "bind": "name"}}
    }));
    let processes = Arc::new(ProcessSet::new());
    register_processes(&processes, registry.clone());
    let app = app(registry, processes);

    let response = app
        .oneshot(
            Request::get("/api/__weft/list/pet/setting")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let spec = body_json(response).await;
    assert_eq!(spec["id"], "pet");
    assert_eq!(spec["name"], "Pets");
    assert_eq!(spec["columns"]["name"]["label"], "Name");
    // Default arguments are part of the composed spec handed to callers.
    assert_eq!(
        spec["action"]["get"]["default"],
        json!([null, {"status": "available"}])
    );
}

#[tokio::test]
async fn declared_inputs_reach_the_engine_in_order() {
    let registry = widgets(json!({}));
    let engine = Arc::new(RecordingEngine::with_result(json!({"data": [], "total": 0})));
    let app = app(registry, engine.clone());

    let response = app
        .oneshot(
            Request::get("/api/__weft/list/pet/get?limit=5")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        engine.calls(),
        vec![(
            "weft.list.find".to_string(),
            vec![json!("pet"), json!({"limit": "5"})]
        )]
    );
}

#[tokio::test]
async fn save_payload_reaches_the_engine() {
    let registry = widgets(json!({}));
    let engine = Arc::new(RecordingEngine::with_result(json!({"id": 1})));
    let app = app(registry, engine.clone());

    let response = app
        .oneshot(
            Request::post("/api/__weft/list/pet/save")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"data": [{"name": "Rex"}]}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        engine.calls(),
        vec![(
            "weft.list.save".to_string(),
            vec![json!("pet"), json!({"data": [{"name": "Rex"}]})]
        )]
    );
}

fn multipart_body(boundary: &str, field: &str) -> Body {
    Body::from(format!(
        "--{boundary}\r\n\
         Content-Disposition: form-data; name=\"{field}\"; filename=\"rex.png\"\r\n\
         Content-Type: image/png\r\n\
         \r\n\
         pngdata\r\n\
         --{boundary}--\r\n"
    ))
}

#[tokio::test]
async fn uploaded_file_reaches_the_engine_base64_encoded() {
    let registry = widgets(json!({}));
    let engine = Arc::new(RecordingEngine::with_result(json!("/files/rex.png")));
    let app = app(registry, engine.clone());

    let boundary = "weft-boundary-7f3a";
    let response = app
        .oneshot(
            Request::post("/api/__weft/list/pet/upload/columns.avatar/edit")
                .header(
                    "content-type",
                    format!("multipart/form-data; boundary={boundary}"),
                )
                .body(multipart_body(boundary, "file"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    // "pngdata" base64-encoded.
    assert_eq!(
        engine.calls(),
        vec![(
            "weft.list.upload".to_string(),
            vec![
                json!("pet"),
                json!("columns.avatar"),
                json!("edit"),
                json!({
                    "name": "rex.png",
                    "type": "image/png",
                    "content": "cG5nZGF0YQ=="
                })
            ]
        )]
    );
}

#[tokio::test]
async fn upload_without_the_file_field_is_rejected() {
    let registry = widgets(json!({}));
    let engine = Arc::new(RecordingEngine::default());
    let app = app(registry, engine.clone());

    let boundary = "weft-boundary-7f3a";
    let response = app
        .oneshot(
            Request::post("/api/__weft/list/pet/upload/columns.avatar/edit")
                .header(
                    "content-type",
                    format!("multipart/form-data; boundary={boundary}"),
                )
                .body(multipart_body(boundary, "attachment"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await,
        json!({"code": 400, "message": "the file file field is required"})
    );
    assert!(engine.calls().is_empty());
}

#[tokio::test]
async fn download_renders_the_templated_output() {
    let registry = widgets(json!({}));
    let engine = Arc::new(RecordingEngine::with_result(json!({
        "content": "hello",
        "type": "text/plain"
    })));
    let app = app(registry, engine.clone());

    let response = app
        .oneshot(
            Request::get("/api/__weft/list/pet/download/avatar?name=rex.txt&token=t0k")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "text/plain"
    );
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..], b"hello");
    assert_eq!(
        engine.calls(),
        vec![(
            "weft.list.download".to_string(),
            vec![json!("pet"), json!("avatar"), json!("rex.txt"), json!("t0k")]
        )]
    );
}

#[tokio::test]
async fn disabled_actions_are_not_routable() {
    let registry = widgets(json!({
        "action": {"save": {"disable": true}}
    }));
    let engine = Arc::new(RecordingEngine::default());
    let app = app(registry, engine.clone());

    let response = app
        .oneshot(
            Request::post("/api/__weft/list/pet/save")
                .header("content-type", "application/json")
                .body(Body::from("{}"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(engine.calls().is_empty());
}
