//! Declarative API surface and its transport binding.

pub mod bind;
pub mod problem;
pub mod surface;

pub use bind::bind_surface;
pub use problem::Problem;
pub use surface::{ApiSurface, EndpointSpec, InputSource, OutputContract};
