//! HTTP surface of the clinic engine.
//!
//! `clinic_api_router()` returns a composable `Router` with every endpoint
//! under `/api/`. Clients poll; nothing is pushed.

pub mod endpoints;
pub mod error;
pub mod middleware;
pub mod router;
pub mod server;
pub mod types;

pub use error::ApiError;
pub use router::clinic_api_router;
pub use server::{start_server_on, ClinicServer, ServerSession};
pub use types::ApiContext;
