use crate::errors::SessionError;
use crate::jsonrpc::{JsonRpcRequest, parse_response};
use http::header::CONTENT_TYPE;
use http::{Method, Request, Uri};
use http_body_util::{BodyExt, Full};
use hyper::body::Bytes;
use hyper_util::client::legacy::Client;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::rt::TokioExecutor;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, trace};

/// Request/response sender for arbitrary JSON-RPC methods with positional parameters.
///
/// Implementations perform exactly one round trip per call: no retries, no
/// caching of results.
pub trait RpcChannel: Send + Sync + 'static {
    /// Call `method` with `params`, returning the raw `result` member.
    fn call(
        &self,
        method: &str,
        params: Vec<Value>,
    ) -> impl Future<Output = Result<Value, SessionError>> + Send;
}

/// Call `method` and decode its result into `T`.
pub async fn request<C, T>(channel: &C, method: &str, params: Vec<Value>) -> Result<T, SessionError>
where
    C: RpcChannel,
    T: DeserializeOwned,
{
    let value = channel.call(method, params).await?;
    serde_json::from_value(value)
        .map_err(|error| SessionError::invalid_response(method, error.to_string()))
}

/// [`RpcChannel`] speaking JSON-RPC 2.0 over HTTP POST.
#[derive(Debug)]
pub struct HttpChannel {
    url: Uri,
    client: Client<HttpConnector, Full<Bytes>>,
    next_id: AtomicU64,
    timeout: Duration,
}

impl HttpChannel {
    /// Create a channel targeting `url`, bounding every round trip by `timeout`.
    pub fn new(url: Uri, timeout: Duration) -> Self {
        let mut connector = HttpConnector::new();
        connector.enforce_http(false);
        let client = Client::builder(TokioExecutor::new()).build(connector);

        debug!(%url, ?timeout, "initializing http channel");

        Self {
            url,
            client,
            next_id: AtomicU64::new(1),
            timeout,
        }
    }

    /// Node endpoint this channel talks to.
    pub const fn url(&self) -> &Uri {
        &self.url
    }

    async fn round_trip(&self, method: &str, body: Vec<u8>) -> Result<Value, SessionError> {
        let request = Request::builder()
            .method(Method::POST)
            .uri(self.url.clone())
            .header(CONTENT_TYPE, "application/json")
            .body(Full::new(Bytes::from(body)))
            .map_err(|error| SessionError::transport(method, error))?;

        let response = self
            .client
            .request(request)
            .await
            .map_err(|error| SessionError::transport(method, error))?;
        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .map_err(|error| SessionError::transport(method, error))?
            .to_bytes();

        match parse_response(method, &bytes) {
            Err(SessionError::InvalidResponse { .. }) if !status.is_success() => Err(
                SessionError::transport(method, format!("node answered HTTP {status}")),
            ),
            other => other,
        }
    }
}

impl RpcChannel for HttpChannel {
    async fn call(&self, method: &str, params: Vec<Value>) -> Result<Value, SessionError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = JsonRpcRequest::new(id, method, &params).to_bytes()?;
        trace!(id, method, "sending json-rpc request");

        match tokio::time::timeout(self.timeout, self.round_trip(method, body)).await {
            Ok(result) => result,
            Err(elapsed) => Err(SessionError::transport(method, elapsed)),
        }
    }
}
