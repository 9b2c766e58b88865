//! Validated gateway configuration and its builder.

// crates.io
use http::{HeaderMap, HeaderName, HeaderValue, header::ACCEPT};
// self
use crate::{_prelude::*, error::ConfigError};

/// Immutable settings shared by every request issued through a gateway.
#[derive(Clone, Debug)]
pub struct GatewayConfig {
	/// Base URL every request path is joined onto. Always ends with `/`.
	pub base_url: Url,
	/// Renewal endpoint, relative to [`base_url`](Self::base_url).
	pub renewal_path: String,
	/// Maximum wait for each call, including renewal.
	pub timeout: Duration,
	/// Message shown through the error notifier when the session cannot be renewed.
	pub session_expired_message: String,
	/// Stores a rotated refresh credential when the renewal response carries one.
	pub rotate_refresh_token: bool,
	/// Headers merged into every call before request-specific headers.
	pub default_headers: HeaderMap,
}
impl GatewayConfig {
	/// Default renewal endpoint.
	pub const DEFAULT_RENEWAL_PATH: &'static str = "auth/refresh/";
	/// Default user-facing message for an unrecoverable session.
	pub const DEFAULT_SESSION_EXPIRED_MESSAGE: &'static str =
		"Session expired. Please log in again.";
	/// Default per-call timeout.
	pub const DEFAULT_TIMEOUT: Duration = Duration::seconds(30);

	/// Returns a builder seeded with defaults for `base_url`.
	pub fn builder(base_url: Url) -> GatewayConfigBuilder {
		GatewayConfigBuilder::new(base_url)
	}

	/// Resolves a relative request path against the base URL.
	pub fn resolve(&self, path: &str) -> Result<Url, ConfigError> {
		let relative = validate_path(path)?;

		self.base_url.join(relative).map_err(|source| ConfigError::InvalidBaseUrl { source })
	}

	/// Absolute URL of the renewal endpoint.
	pub fn renewal_url(&self) -> Result<Url, ConfigError> {
		self.resolve(&self.renewal_path)
	}

	/// Timeout converted for transports that speak `std::time`.
	pub fn std_timeout(&self) -> std::time::Duration {
		std::time::Duration::try_from(self.timeout).unwrap_or(std::time::Duration::ZERO)
	}
}

/// Builder for [`GatewayConfig`] values.
#[derive(Debug)]
pub struct GatewayConfigBuilder {
	/// Base URL for every request.
	pub base_url: Url,
	/// Renewal endpoint relative to the base URL.
	pub renewal_path: String,
	/// Per-call timeout.
	pub timeout: Duration,
	/// Session-expired notification text.
	pub session_expired_message: String,
	/// Whether rotated refresh credentials are stored.
	pub rotate_refresh_token: bool,
	/// Headers sent on every call.
	pub default_headers: Vec<(String, String)>,
}
impl GatewayConfigBuilder {
	/// Creates a new builder seeded with defaults.
	pub fn new(base_url: Url) -> Self {
		Self {
			base_url,
			renewal_path: GatewayConfig::DEFAULT_RENEWAL_PATH.into(),
			timeout: GatewayConfig::DEFAULT_TIMEOUT,
			session_expired_message: GatewayConfig::DEFAULT_SESSION_EXPIRED_MESSAGE.into(),
			rotate_refresh_token: true,
			default_headers: vec![(ACCEPT.as_str().into(), "application/json".into())],
		}
	}

	/// Overrides the renewal endpoint path.
	pub fn renewal_path(mut self, path: impl Into<String>) -> Self {
		self.renewal_path = path.into();

		self
	}

	/// Overrides the per-call timeout.
	pub fn timeout(mut self, timeout: Duration) -> Self {
		self.timeout = timeout;

		self
	}

	/// Overrides the session-expired notification text.
	pub fn session_expired_message(mut self, message: impl Into<String>) -> Self {
		self.session_expired_message = message.into();

		self
	}

	/// Toggles storage of rotated refresh credentials.
	pub fn rotate_refresh_token(mut self, rotate: bool) -> Self {
		self.rotate_refresh_token = rotate;

		self
	}

	/// Adds (or replaces) a default header.
	pub fn default_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		let name = name.into();

		self.default_headers.retain(|(existing, _)| !existing.eq_ignore_ascii_case(&name));
		self.default_headers.push((name, value.into()));

		self
	}

	/// Validates the configuration and produces a [`GatewayConfig`].
	pub fn build(self) -> Result<GatewayConfig, ConfigError> {
		let base_url = normalize_base(self.base_url)?;

		validate_path(&self.renewal_path)?;

		if !self.timeout.is_positive() {
			return Err(ConfigError::NonPositiveTimeout);
		}

		let mut default_headers = HeaderMap::new();

		for (name, value) in self.default_headers {
			default_headers.insert(
				HeaderName::from_bytes(name.as_bytes())?,
				HeaderValue::from_str(&value)?,
			);
		}

		Ok(GatewayConfig {
			base_url,
			renewal_path: self.renewal_path,
			timeout: self.timeout,
			session_expired_message: self.session_expired_message,
			rotate_refresh_token: self.rotate_refresh_token,
			default_headers,
		})
	}
}

fn normalize_base(mut url: Url) -> Result<Url, ConfigError> {
	if !matches!(url.scheme(), "http" | "https") || url.cannot_be_a_base() {
		return Err(ConfigError::UnsupportedScheme { url: url.to_string() });
	}
	if !url.path().ends_with('/') {
		let path = format!("{}/", url.path());

		url.set_path(&path);
	}

	url.set_query(None);
	url.set_fragment(None);

	Ok(url)
}

fn validate_path(path: &str) -> Result<&str, ConfigError> {
	let trimmed = path.trim_start_matches('/');

	if path.starts_with("//") || Url::parse(trimmed).is_ok() {
		return Err(ConfigError::InvalidPath { path: path.into() });
	}

	Ok(trimmed)
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn url(value: &str) -> Url {
		Url::parse(value).expect("Failed to parse test URL.")
	}

	#[test]
	fn base_url_keeps_path_prefix() {
		let config = GatewayConfig::builder(url("https://api.example.com/v1"))
			.build()
			.expect("Configuration should build.");

		assert_eq!(config.base_url.as_str(), "https://api.example.com/v1/");
		assert_eq!(
			config.resolve("/users/?page=2").expect("Path should resolve.").as_str(),
			"https://api.example.com/v1/users/?page=2"
		);
		assert_eq!(
			config.renewal_url().expect("Renewal path should resolve.").as_str(),
			"https://api.example.com/v1/auth/refresh/"
		);
	}

	#[test]
	fn rejects_unsupported_schemes_and_absolute_paths() {
		let err = GatewayConfig::builder(url("ftp://files.example.com"))
			.build()
			.expect_err("Non-HTTP schemes should be rejected.");

		assert!(matches!(err, ConfigError::UnsupportedScheme { .. }));

		let config = GatewayConfig::builder(url("https://api.example.com"))
			.build()
			.expect("Configuration should build.");
		let err = config
			.resolve("https://evil.example.com/steal")
			.expect_err("Absolute URLs should be rejected as request paths.");

		assert!(matches!(err, ConfigError::InvalidPath { .. }));

		let err = GatewayConfig::builder(url("https://api.example.com"))
			.renewal_path("//evil.example.com/refresh")
			.build()
			.expect_err("Protocol-relative renewal paths should be rejected.");

		assert!(matches!(err, ConfigError::InvalidPath { .. }));
	}

	#[test]
	fn rejects_non_positive_timeouts() {
		let err = GatewayConfig::builder(url("https://api.example.com"))
			.timeout(Duration::ZERO)
			.build()
			.expect_err("Zero timeout should be rejected.");

		assert!(matches!(err, ConfigError::NonPositiveTimeout));
	}

	#[test]
	fn default_headers_replace_case_insensitively() {
		let config = GatewayConfig::builder(url("https://api.example.com"))
			.default_header("accept", "text/plain")
			.default_header("X-Client", "dashboard")
			.build()
			.expect("Configuration should build.");

		assert_eq!(config.default_headers.len(), 2);
		assert_eq!(
			config.default_headers.get(ACCEPT).and_then(|v| v.to_str().ok()),
			Some("text/plain")
		);
		assert_eq!(config.std_timeout(), std::time::Duration::from_secs(30));
	}
}
