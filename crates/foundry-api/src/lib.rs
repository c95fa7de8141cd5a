pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod render;
pub mod router;
pub mod routes;
pub mod state;
pub mod telemetry;

pub use router::build_router;
pub use state::AppState;
