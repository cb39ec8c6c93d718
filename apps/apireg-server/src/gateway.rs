//! Gateway service in front of the registry.
//!
//! Health-check endpoints (`/health`, `/_health`) are intercepted here and
//! answered without touching the store. Everything else goes to the registry
//! HTTP service.

use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;

use bytes::Bytes;
use hyper::body::Incoming;
use hyper::service::Service;

use apireg_http::body::ApiRegResponseBody;
use apireg_http::dispatch::ApiRegHandler;
use apireg_http::response::{new_request_id, with_common_headers};
use apireg_http::service::ApiRegHttpService;

/// Gateway wrapping the registry HTTP service.
#[derive(Debug)]
pub struct GatewayService<H: ApiRegHandler> {
    registry: ApiRegHttpService<H>,
    store_backend: &'static str,
}

impl<H: ApiRegHandler> GatewayService<H> {
    /// Create a new gateway. `store_backend` is reported by the health check.
    pub fn new(registry: ApiRegHttpService<H>, store_backend: &'static str) -> Self {
        Self {
            registry,
            store_backend,
        }
    }

    /// Process one request with any body type.
    pub async fn handle<B>(&self, req: http::Request<B>) -> http::Response<ApiRegResponseBody>
    where
        B: http_body::Body<Data = Bytes> + Send,
        B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        if is_health_check(req.method(), req.uri().path()) {
            let response = health_check_response(self.store_backend);
            return with_common_headers(response, &new_request_id());
        }
        self.registry.handle(req).await
    }
}

impl<H: ApiRegHandler> Clone for GatewayService<H> {
    fn clone(&self) -> Self {
        Self {
            registry: self.registry.clone(),
            store_backend: self.store_backend,
        }
    }
}

impl<H: ApiRegHandler> Service<http::Request<Incoming>> for GatewayService<H> {
    type Response = http::Response<ApiRegResponseBody>;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn call(&self, req: http::Request<Incoming>) -> Self::Future {
        let gateway = self.clone();
        Box::pin(async move { Ok(gateway.handle(req).await) })
    }
}

/// Check if the request is a health check probe.
fn is_health_check(method: &http::Method, path: &str) -> bool {
    *method == http::Method::GET && (path == "/health" || path == "/_health")
}

/// Produce the health check response.
fn health_check_response(store_backend: &str) -> http::Response<ApiRegResponseBody> {
    let body = serde_json::json!({ "status": "running", "store": store_backend }).to_string();
    http::Response::builder()
        .status(http::StatusCode::OK)
        .header("Content-Type", "application/json")
        .body(ApiRegResponseBody::from_bytes(body))
        .expect("health response should be valid")
}
