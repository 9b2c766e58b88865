//! Transport primitives for gateway requests.
//!
//! The module exposes [`HttpTransport`] alongside the [`HttpCall`] / [`HttpResponse`] pair so
//! downstream crates can plug in custom HTTP stacks (or scripted fakes in tests) without
//! touching the gateway's renewal logic. The gateway resolves every request into a fully
//! qualified [`HttpCall`] (absolute URL, final headers, serialized body, timeout) before
//! handing it to the transport, so transports never see session state.

// crates.io
use http::{HeaderMap, Method, StatusCode};
// self
use crate::{_prelude::*, error::TransportError};

/// Boxed future returned by [`HttpTransport::execute`].
pub type TransportFuture<'a> =
	Pin<Box<dyn Future<Output = Result<HttpResponse, TransportError>> + 'a + Send>>;

/// Abstraction over HTTP stacks capable of executing gateway calls.
///
/// Implementations must be `Send + Sync + 'static` so a single transport can be shared across
/// cloned gateways and concurrently running requests. Non-success statuses are *not* errors at
/// this layer: transports return them as [`HttpResponse`] values and the gateway classifies
/// them. Only failures that produced no response (DNS, TLS, timeout, I/O) map to
/// [`TransportError`].
pub trait HttpTransport
where
	Self: 'static + Send + Sync,
{
	/// Dispatches `call` and resolves with the raw response.
	fn execute(&self, call: HttpCall) -> TransportFuture<'_>;
}

/// Fully resolved outbound call.
#[derive(Clone, Debug)]
pub struct HttpCall {
	/// HTTP method.
	pub method: Method,
	/// Absolute request URL.
	pub url: Url,
	/// Final header set, including authorization when applicable.
	pub headers: HeaderMap,
	/// Serialized JSON body, if any.
	pub body: Option<Vec<u8>>,
	/// Maximum wait before the call fails with [`TransportError::Timeout`].
	pub timeout: std::time::Duration,
}

/// Raw response returned by an [`HttpTransport`].
#[derive(Clone, Debug)]
pub struct HttpResponse {
	/// HTTP status code.
	pub status: StatusCode,
	/// Response headers.
	pub headers: HeaderMap,
	/// Response body bytes.
	pub body: Vec<u8>,
}
impl HttpResponse {
	/// Builds a response with an empty header map.
	pub fn new(status: StatusCode, body: impl Into<Vec<u8>>) -> Self {
		Self { status, headers: HeaderMap::new(), body: body.into() }
	}

	/// Convenience constructor for JSON payloads.
	pub fn json(status: StatusCode, value: &serde_json::Value) -> Self {
		let mut response = Self::new(status, value.to_string());

		response.headers.insert(
			http::header::CONTENT_TYPE,
			http::HeaderValue::from_static("application/json"),
		);

		response
	}

	/// Returns the body as lossy UTF-8 text.
	pub fn text(&self) -> String {
		String::from_utf8_lossy(&self.body).into_owned()
	}
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
///
/// Per-call timeouts come from [`HttpCall::timeout`], so a custom client does not need its own
/// timeout configured.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransport(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestTransport {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}

	/// Builds a transport whose client sends `user_agent` on every call.
	pub fn with_user_agent(user_agent: &str) -> Result<Self> {
		let client = ReqwestClient::builder()
			.user_agent(user_agent)
			.build()
			.map_err(crate::error::ConfigError::from)?;

		Ok(Self(client))
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestTransport {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl HttpTransport for ReqwestTransport {
	fn execute(&self, call: HttpCall) -> TransportFuture<'_> {
		let client = self.0.clone();

		Box::pin(async move {
			let HttpCall { method, url, headers, body, timeout } = call;
			let mut builder = client.request(method, url).headers(headers).timeout(timeout);

			if let Some(body) = body {
				builder = builder.body(body);
			}

			let response = builder.send().await?;
			let status = response.status();
			let headers = response.headers().to_owned();
			let body = response.bytes().await?.to_vec();

			Ok(HttpResponse { status, headers, body })
		})
	}
}
