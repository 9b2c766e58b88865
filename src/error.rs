//! Gateway-level error types shared across the transport, renewal, and session layers.

// self
use crate::_prelude::*;

/// Gateway-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical gateway error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Transport failure (DNS, TCP, TLS, timeout).
	#[error(transparent)]
	Transport(#[from] TransportError),

	/// Upstream answered with a non-success status other than an expired credential.
	#[error("Request failed with HTTP {status}.")]
	Status {
		/// HTTP status code.
		status: u16,
		/// Human-readable message extracted from the response body, if any.
		message: Option<String>,
		/// Raw response body (lossy UTF-8).
		body: String,
	},
	/// Response body could not be decoded into the expected shape.
	#[error("Response body is not valid JSON for the expected shape.")]
	Decode {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// HTTP status code of the decoded response.
		status: u16,
	},
	/// Renewal was required but the session holds no refresh credential.
	#[error("Session has no refresh credential.")]
	NoRefreshToken,
	/// Credential renewal failed; the session has been cleared.
	#[error("Credential renewal failed: {reason}.")]
	RenewalFailed {
		/// Summary of the underlying renewal failure.
		reason: String,
		/// HTTP status returned by the renewal endpoint, when one was received.
		status: Option<u16>,
	},
	/// A request that was already retried after renewal was rejected again.
	#[error("Access credential was rejected again after renewal.")]
	RetryExhausted,
}
impl Error {
	/// Returns the HTTP status associated with the failure, when one exists.
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::Status { status, .. } | Self::Decode { status, .. } => Some(*status),
			Self::RenewalFailed { status, .. } => *status,
			Self::RetryExhausted => Some(401),
			_ => None,
		}
	}

	/// Returns `true` for failures that end the current session.
	pub fn is_session_terminal(&self) -> bool {
		matches!(self, Self::NoRefreshToken | Self::RenewalFailed { .. })
	}

	/// Derives the message shown through the error notifier.
	///
	/// Server-provided messages win over the generic display text.
	pub fn user_message(&self) -> String {
		match self {
			Self::Status { message: Some(message), .. } => message.clone(),
			_ => self.to_string(),
		}
	}
}

/// Configuration and validation failures raised by the gateway.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// Base URL cannot be parsed or joined.
	#[error("Base URL is invalid.")]
	InvalidBaseUrl {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Base URL uses a scheme other than HTTP(S) or cannot act as a base.
	#[error("Base URL must be an absolute http(s) URL: {url}.")]
	UnsupportedScheme {
		/// Offending URL.
		url: String,
	},
	/// Request path must be relative to the base URL.
	#[error("Request path `{path}` must be relative to the base URL.")]
	InvalidPath {
		/// Offending path.
		path: String,
	},
	/// Header name or value is malformed.
	#[error("Header is invalid.")]
	InvalidHeader(#[from] http::Error),
	/// Timeout must be strictly positive.
	#[error("The request timeout must be positive.")]
	NonPositiveTimeout,
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}
impl From<http::header::InvalidHeaderValue> for ConfigError {
	fn from(e: http::header::InvalidHeaderValue) -> Self {
		Self::InvalidHeader(e.into())
	}
}
impl From<http::header::InvalidHeaderName> for ConfigError {
	fn from(e: http::header::InvalidHeaderName) -> Self {
		Self::InvalidHeader(e.into())
	}
}

/// Transport-level failures (network, IO, timeout).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the API.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// The request exceeded the configured timeout.
	#[error("Request timed out.")]
	Timeout,
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the API.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		if e.is_timeout() { Self::Timeout } else { Self::network(e) }
	}
}
