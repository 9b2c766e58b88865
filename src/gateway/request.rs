//! Request descriptors accepted by the gateway.

// crates.io
use http::{HeaderMap, HeaderName, HeaderValue, Method, header::CONTENT_TYPE};
// self
use crate::{_prelude::*, config::GatewayConfig, transport::HttpCall};

/// Per-request switches that alter the gateway's side effects.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RequestOptions {
	/// Suppresses the error notification for this request's failures.
	pub skip_error_notification: bool,
}

/// Caller-facing description of an API call.
///
/// The retry marker is owned by the gateway: descriptors built through the public API always
/// start unmarked, and the gateway sets the marker before replaying a request after renewal.
#[derive(Clone, Debug)]
pub struct ApiRequest {
	/// HTTP method.
	pub method: Method,
	/// Path relative to the configured base URL.
	pub path: String,
	/// Query pairs appended to the resolved URL.
	pub query: Vec<(String, String)>,
	/// JSON body, if any.
	pub body: Option<serde_json::Value>,
	/// Request-specific headers; these override configured defaults.
	pub headers: HeaderMap,
	/// Side-effect switches.
	pub options: RequestOptions,
	pub(crate) retried: bool,
}
impl ApiRequest {
	/// Creates a descriptor for `method` + `path`.
	pub fn new(method: Method, path: impl Into<String>) -> Self {
		Self {
			method,
			path: path.into(),
			query: Vec::new(),
			body: None,
			headers: HeaderMap::new(),
			options: RequestOptions::default(),
			retried: false,
		}
	}

	/// `GET` descriptor.
	pub fn get(path: impl Into<String>) -> Self {
		Self::new(Method::GET, path)
	}

	/// `POST` descriptor.
	pub fn post(path: impl Into<String>) -> Self {
		Self::new(Method::POST, path)
	}

	/// `PUT` descriptor.
	pub fn put(path: impl Into<String>) -> Self {
		Self::new(Method::PUT, path)
	}

	/// `PATCH` descriptor.
	pub fn patch(path: impl Into<String>) -> Self {
		Self::new(Method::PATCH, path)
	}

	/// `DELETE` descriptor.
	pub fn delete(path: impl Into<String>) -> Self {
		Self::new(Method::DELETE, path)
	}

	/// Sets the JSON body.
	pub fn json(mut self, body: serde_json::Value) -> Self {
		self.body = Some(body);

		self
	}

	/// Appends a query pair.
	pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.query.push((key.into(), value.into()));

		self
	}

	/// Sets a request header, replacing any previous value.
	pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
		self.headers.insert(name, value);

		self
	}

	/// Replaces the side-effect switches.
	pub fn with_options(mut self, options: RequestOptions) -> Self {
		self.options = options;

		self
	}

	/// Suppresses the error notification for this request.
	pub fn skip_error_notification(mut self) -> Self {
		self.options.skip_error_notification = true;

		self
	}

	/// Returns `true` once the gateway has replayed this request after a renewal.
	pub fn is_retried(&self) -> bool {
		self.retried
	}

	/// Short `METHOD path` label used in diagnostics.
	pub fn label(&self) -> String {
		format!("{} {}", self.method, self.path)
	}

	/// Resolves the descriptor into a transport call without credentials attached.
	pub(crate) fn to_call(&self, config: &GatewayConfig) -> Result<HttpCall> {
		let mut url = config.resolve(&self.path)?;

		if !self.query.is_empty() {
			url.query_pairs_mut().extend_pairs(self.query.iter());
		}

		let mut headers = config.default_headers.clone();

		for (name, value) in &self.headers {
			headers.insert(name.clone(), value.clone());
		}

		let body = self.body.as_ref().map(|value| value.to_string().into_bytes());

		if body.is_some() && !headers.contains_key(CONTENT_TYPE) {
			headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
		}

		Ok(HttpCall {
			method: self.method.clone(),
			url,
			headers,
			body,
			timeout: config.std_timeout(),
		})
	}
}
