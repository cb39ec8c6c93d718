//! Registry handler implementation bridging HTTP to business logic.

use std::sync::Arc;

use bytes::Bytes;

use apireg_http::body::ApiRegResponseBody;
use apireg_http::dispatch::{ApiRegHandler, HandlerFuture};
use apireg_http::response::output_to_response;
use apireg_http::router::RoutingContext;
use apireg_model::error::ApiRegError;
use apireg_model::operations::ApiRegOperation;

use crate::provider::ApiRegProvider;

/// Handler that bridges the HTTP layer to the registry provider.
#[derive(Debug)]
pub struct ApiRegProviderHandler {
    provider: Arc<ApiRegProvider>,
}

impl ApiRegProviderHandler {
    /// Create a new handler wrapping a provider.
    #[must_use]
    pub fn new(provider: Arc<ApiRegProvider>) -> Self {
        Self { provider }
    }
}

impl ApiRegHandler for ApiRegProviderHandler {
    fn handle_operation(&self, ctx: RoutingContext, body: Bytes) -> HandlerFuture {
        let provider = Arc::clone(&self.provider);
        Box::pin(async move { dispatch(provider.as_ref(), ctx, &body).await })
    }
}

/// Dispatch a registry operation to the appropriate provider method.
async fn dispatch(
    provider: &ApiRegProvider,
    ctx: RoutingContext,
    body: &[u8],
) -> Result<http::Response<ApiRegResponseBody>, ApiRegError> {
    match ctx.operation {
        ApiRegOperation::CreateSetting => {
            let output = provider.handle_create_setting(body).await?;
            output_to_response(&output)
        }
        ApiRegOperation::GetSetting => {
            let setting_id = ctx.setting_id.ok_or_else(ApiRegError::not_found)?;
            let output = provider.handle_get_setting(&setting_id).await?;
            output_to_response(&output)
        }
    }
}
