//! HTTP API: read endpoints for the frontend plus a small bearer-token
//! admin surface. The router is composable and carries no pipeline
//! logic — batch runs are spawned through the scheduler module.

pub mod endpoints;
pub mod error;
pub mod router;
pub mod server;

pub use error::ApiError;
pub use router::api_router;
pub use server::serve;
