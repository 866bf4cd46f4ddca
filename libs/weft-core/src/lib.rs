//! # Weft Core - Declarative Widget Engine
//!
//! The engine core behind Weft's low-code runtime:
//!
//! - **Fragments**: shared library definitions loaded from a directory tree
//!   and imported into widget fields by dotted name, with positional
//!   argument binding (`$in.0`, `$in.1`, …).
//! - **Fields**: a two-stage decoder that turns raw JSON field definitions
//!   into typed shapes, resolving a single level of imports per decode.
//! - **Widgets**: a read-mostly registry of loaded widget instances with
//!   atomic whole-set replacement for reloads.
//! - **Guards**: named authorization checks that run strictly before any
//!   process dispatch.
//! - **API surface**: the declarative endpoint table a widget kind exports
//!   once per process start, plus the data-driven transport binding that
//!   turns it into live routes.
//!
//! The process execution engine and the script engine are external
//! collaborators; this crate only defines their contracts
//! ([`process::ProcessEngine`], [`script::ScriptEngine`]) and ships small
//! in-process defaults for embedding and tests.

pub mod api;
pub mod field;
pub mod fragment;
pub mod guard;
pub mod process;
pub mod script;
pub mod widget;

pub use api::problem::Problem;
pub use api::surface::{ApiSurface, EndpointSpec, InputSource, OutputContract};
pub use field::{FieldDecoder, FieldError, FieldSource, ImportDirective};
pub use fragment::bind::BindError;
pub use fragment::{DuplicatePolicy, FragmentRegistry, LoadError};
pub use guard::{Guard, GuardSet, RequestContext, UploadedFile};
pub use process::{ProcessEngine, ProcessError, ProcessSet};
pub use script::{ScriptEngine, ScriptStore};
pub use widget::{Widget, WidgetError, WidgetRegistry};
