//! Declarative endpoint tables.
//!
//! A widget kind exports one [`ApiSurface`] per process start: a pure data
//! structure listing every endpoint's path template, method, backing process
//! and input/output contract. The surface never inspects widget instance
//! data; it only declares the shape of the API that the per-instance action
//! router later fills in.

use http::Method;

/// The full endpoint table for a widget kind.
#[derive(Debug, Clone)]
pub struct ApiSurface {
    pub name: String,
    pub description: String,
    pub version: String,
    /// Name of the guard protecting the whole surface (resolved per-action
    /// guards may override it).
    pub guard: Option<String>,
    /// Route prefix shared by every endpoint, e.g. `/api/__weft/list`.
    pub group: String,
    pub endpoints: Vec<EndpointSpec>,
}

/// One endpoint: fixed per widget kind, never varying per instance.
#[derive(Debug, Clone)]
pub struct EndpointSpec {
    pub label: String,
    pub description: String,
    /// Path template relative to the surface group, e.g. `/{id}/setting`.
    pub path: String,
    pub method: Method,
    /// The process invoked when the endpoint is hit.
    pub process: String,
    /// Ordered argument extraction, one process argument per entry.
    pub inputs: Vec<InputSource>,
    pub output: OutputContract,
}

/// Where a process argument comes from in the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSource {
    /// `$param.<name>` — a path parameter (string).
    Param(String),
    /// `$query.<name>` — a single query value, `null` when absent.
    Query(String),
    /// `:query` / `:query-param` — the whole query map as an object.
    QueryMap,
    /// `:payload` — the JSON request body, `null` when empty.
    Payload,
    /// `$file.<field>` — an uploaded multipart file, passed as
    /// `{name, type, content}` with base64 content.
    File(String),
}

/// How the process result becomes an HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputContract {
    /// Serialize the result as `application/json` with the given status.
    Json { status: u16 },
    /// Render body and header values from `{{key}}` templates resolved
    /// against the process result object (binary/file responses).
    Templated {
        status: u16,
        body: String,
        headers: Vec<(String, String)>,
    },
}

impl OutputContract {
    pub fn json(status: u16) -> Self {
        Self::Json { status }
    }
}
