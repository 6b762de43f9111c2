//! HTTP layer: router, response envelope, and the internal-secret guard.

pub mod auth;
pub mod response;
pub mod routes;

pub use auth::InternalAuth;
pub use response::{ApiResponse, JsonResponse};
pub use routes::router;
