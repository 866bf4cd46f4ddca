pub mod guard;
pub mod routes;

pub use guard::ListState;
pub use routes::{export, router};
