//! Registry handler trait and operation dispatch.

use std::future::Future;
use std::pin::Pin;

use bytes::Bytes;

use apireg_model::error::ApiRegError;

use crate::body::ApiRegResponseBody;
use crate::router::RoutingContext;

/// Future returned by [`ApiRegHandler::handle_operation`].
pub type HandlerFuture =
    Pin<Box<dyn Future<Output = Result<http::Response<ApiRegResponseBody>, ApiRegError>> + Send>>;

/// Trait that the registry business logic must implement.
///
/// The handler receives the routed operation and the raw request body and
/// returns a complete HTTP response. This is the boundary between the HTTP
/// transport and the registration logic.
pub trait ApiRegHandler: Send + Sync + 'static {
    /// Handle a registry operation and produce an HTTP response.
    fn handle_operation(&self, ctx: RoutingContext, body: Bytes) -> HandlerFuture;
}

/// Dispatch a routed request to the handler.
pub async fn dispatch_operation<H: ApiRegHandler>(
    handler: &H,
    ctx: RoutingContext,
    body: Bytes,
) -> Result<http::Response<ApiRegResponseBody>, ApiRegError> {
    tracing::debug!(operation = %ctx.operation, "dispatching registry operation");
    handler.handle_operation(ctx, body).await
}
