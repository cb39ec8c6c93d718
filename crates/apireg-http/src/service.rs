//! Registry HTTP service implementing the hyper `Service` trait.

use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use bytes::Bytes;
use http_body_util::{BodyExt, LengthLimitError, Limited};
use hyper::body::Incoming;
use tracing::{Instrument, debug, error, info_span, warn};

use apireg_model::error::ApiRegError;

use crate::body::ApiRegResponseBody;
use crate::dispatch::{ApiRegHandler, dispatch_operation};
use crate::response::{error_to_response, new_request_id, with_common_headers};
use crate::router::resolve_operation;

/// Configuration for the registry HTTP service.
#[derive(Debug, Clone)]
pub struct ApiRegHttpConfig {
    /// Largest accepted request body in bytes.
    pub max_body_bytes: usize,
}

impl Default for ApiRegHttpConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: 1024 * 1024,
        }
    }
}

/// Hyper `Service` implementation for the registry.
///
/// Wraps an [`ApiRegHandler`] and routes incoming HTTP requests to it. Every
/// failure is turned into a response here; nothing propagates to hyper.
#[derive(Debug)]
pub struct ApiRegHttpService<H: ApiRegHandler> {
    handler: Arc<H>,
    config: Arc<ApiRegHttpConfig>,
}

impl<H: ApiRegHandler> ApiRegHttpService<H> {
    /// Create a new `ApiRegHttpService`.
    pub fn new(handler: Arc<H>, config: ApiRegHttpConfig) -> Self {
        Self {
            handler,
            config: Arc::new(config),
        }
    }

    /// Process one request with any body type.
    ///
    /// This is what the hyper `Service` impl calls; it is public so callers
    /// can drive the service with in-memory bodies.
    pub async fn handle<B>(&self, req: http::Request<B>) -> http::Response<ApiRegResponseBody>
    where
        B: http_body::Body<Data = Bytes> + Send,
        B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        let request_id = new_request_id();
        let span = info_span!(
            "request",
            request_id = %request_id,
            method = %req.method(),
            path = %req.uri().path(),
        );

        async {
            let response =
                process_request(req, self.handler.as_ref(), &self.config).await;
            with_common_headers(response, &request_id)
        }
        .instrument(span)
        .await
    }
}

impl<H: ApiRegHandler> Clone for ApiRegHttpService<H> {
    fn clone(&self) -> Self {
        Self {
            handler: Arc::clone(&self.handler),
            config: Arc::clone(&self.config),
        }
    }
}

impl<H: ApiRegHandler> hyper::service::Service<http::Request<Incoming>> for ApiRegHttpService<H> {
    type Response = http::Response<ApiRegResponseBody>;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn call(&self, req: http::Request<Incoming>) -> Self::Future {
        let svc = self.clone();
        Box::pin(async move { Ok(svc.handle(req).await) })
    }
}

/// Run a single request through route, collect, dispatch.
async fn process_request<B, H>(
    req: http::Request<B>,
    handler: &H,
    config: &ApiRegHttpConfig,
) -> http::Response<ApiRegResponseBody>
where
    B: http_body::Body<Data = Bytes> + Send,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    H: ApiRegHandler,
{
    let (parts, incoming) = req.into_parts();

    // 1. Route on method + path.
    let ctx = match resolve_operation(&parts.method, parts.uri.path()) {
        Ok(ctx) => ctx,
        Err(err) => return log_and_respond(&err),
    };

    // 2. Collect the body within the configured limit.
    let body = match collect_body(incoming, config.max_body_bytes).await {
        Ok(body) => body,
        Err(err) => return log_and_respond(&err),
    };

    // 3. Dispatch to the handler.
    match dispatch_operation(handler, ctx, body).await {
        Ok(response) => response,
        Err(err) => log_and_respond(&err),
    }
}

/// Collect the incoming body into a single `Bytes` buffer.
async fn collect_body<B>(incoming: B, limit: usize) -> Result<Bytes, ApiRegError>
where
    B: http_body::Body<Data = Bytes> + Send,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    Limited::new(incoming, limit)
        .collect()
        .await
        .map(http_body_util::Collected::to_bytes)
        .map_err(|e| {
            if e.downcast_ref::<LengthLimitError>().is_some() {
                ApiRegError::payload_too_large()
            } else {
                ApiRegError::validation("Unable to read request body")
            }
        })
}

/// Log an error at a level matching its class and build the response.
fn log_and_respond(err: &ApiRegError) -> http::Response<ApiRegResponseBody> {
    if err.is_server_error() {
        let source = err.source.as_ref().map(ToString::to_string);
        if err.code.is_retryable() {
            warn!(code = %err.code, source = ?source, "request failed with retryable error");
        } else {
            error!(code = %err.code, source = ?source, "request failed");
        }
    } else {
        debug!(code = %err.code, message = %err.message, "request rejected");
    }
    error_to_response(err)
}
