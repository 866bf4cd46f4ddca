//! The list widget kind: declarative list/table views backed by processes.
//!
//! A list definition file describes columns, filters, layout and the six
//! API actions every list exposes. Definitions are loaded from a directory
//! at startup, resolved against the shared fragment library and registered
//! under an ID derived from the file path. The REST surface is exported
//! once per process start; per-request routing and authorization run
//! against the registered instances.

pub mod action;
pub mod api;
pub mod config;
pub mod dsl;
pub mod load;
pub mod process;

pub use action::{match_action, ListAction, RouteError, ROUTE_GROUP};
pub use api::rest::{export, router, ListState};
pub use config::ListConfig;
pub use dsl::{ActionSet, ListDsl};
pub use load::load_dir;
pub use process::register_processes;
