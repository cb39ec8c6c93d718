//! HTTP service layer for the external API setting registry.
//!
//! - **Router**: maps method + path onto an [`ApiRegOperation`](apireg_model::ApiRegOperation)
//! - **Handler trait**: the boundary between HTTP and registration logic
//! - **Service**: hyper `Service` implementation
//! - **Response helpers**: outcome to status/body mapping

pub mod body;
pub mod dispatch;
pub mod response;
pub mod router;
pub mod service;

pub use body::ApiRegResponseBody;
pub use dispatch::ApiRegHandler;
pub use service::{ApiRegHttpConfig, ApiRegHttpService};
