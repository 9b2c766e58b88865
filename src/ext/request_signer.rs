//! Request signing contracts that attach session credentials to outbound calls.

// crates.io
use http::{HeaderValue, header::AUTHORIZATION};
// self
use crate::{_prelude::*, auth::TokenSecret, error::ConfigError, transport::HttpCall};

/// Shared signer handle stored by the gateway.
pub type SignerHandle = Arc<dyn RequestSignerExt>;

/// Describes how to attach an access credential to a resolved [`HttpCall`].
///
/// The default [`BearerSigner`] covers the common `Authorization: Bearer` scheme; backends
/// that expect a different header or prefix can supply their own implementation.
pub trait RequestSignerExt
where
	Self: Send + Sync,
{
	/// Injects authorization state derived from `access` into `call`.
	fn attach_token(&self, call: &mut HttpCall, access: &TokenSecret) -> Result<(), ConfigError>;
}

/// Signer that sets `Authorization: Bearer <access>`.
#[derive(Clone, Copy, Debug, Default)]
pub struct BearerSigner;
impl RequestSignerExt for BearerSigner {
	fn attach_token(&self, call: &mut HttpCall, access: &TokenSecret) -> Result<(), ConfigError> {
		let mut value = HeaderValue::from_str(&format!("Bearer {}", access.expose()))?;

		value.set_sensitive(true);
		call.headers.insert(AUTHORIZATION, value);

		Ok(())
	}
}
