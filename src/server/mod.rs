pub mod guards;
pub mod router;
pub mod routes;

pub use router::{AppState, meetmind_router};
