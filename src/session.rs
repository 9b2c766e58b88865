//! Session state contracts and the built-in in-memory store.
//!
//! A [`SessionStore`] owns the access/refresh credential pair for one signed-in user. The
//! gateway reads it before every request and writes it only through the named actions below,
//! so any store that offers sequentially consistent reads can back the gateway.

pub mod memory;

pub use memory::MemorySessionStore;

// self
use crate::{
	_prelude::*,
	auth::{self, TokenSecret},
};

/// Shared handle to a session store.
pub type SessionHandle = Arc<dyn SessionStore>;

/// Credential state contract consumed by the gateway.
pub trait SessionStore
where
	Self: Send + Sync,
{
	/// Returns the current credentials. Must observe the most recent write.
	fn snapshot(&self) -> SessionCredentials;

	/// Replaces the access credential after a successful renewal.
	fn set_access_credential(&self, access: TokenSecret);

	/// Replaces the refresh credential when the backend rotates it.
	fn set_refresh_credential(&self, refresh: TokenSecret);

	/// Drops both credentials; the session becomes unauthenticated.
	fn clear_session(&self);

	/// Installs a credential pair obtained from a login exchange.
	fn set_session_from_login(&self, access: TokenSecret, refresh: Option<TokenSecret>);

	/// Convenience helper that evaluates [`SessionCredentials::is_authenticated`].
	fn is_authenticated(&self) -> bool {
		self.snapshot().is_authenticated()
	}
}

/// Point-in-time view of the session credentials.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionCredentials {
	/// Short-lived credential attached to every request.
	pub access_token: Option<TokenSecret>,
	/// Longer-lived credential used only for renewal.
	pub refresh_token: Option<TokenSecret>,
	/// Instant of the last mutation.
	pub updated_at: Option<OffsetDateTime>,
}
impl SessionCredentials {
	/// Returns the access credential when present and non-empty.
	pub fn access(&self) -> Option<&TokenSecret> {
		self.access_token.as_ref().filter(|secret| !secret.is_empty())
	}

	/// Returns the refresh credential when present and non-empty.
	pub fn refresh(&self) -> Option<&TokenSecret> {
		self.refresh_token.as_ref().filter(|secret| !secret.is_empty())
	}

	/// Derived authentication flag evaluated at `now`.
	///
	/// Both credentials must be present and non-empty, and a JWT refresh credential must not be
	/// past its `exp` claim.
	pub fn is_authenticated_at(&self, now: OffsetDateTime) -> bool {
		match (self.access(), self.refresh()) {
			(Some(_), Some(refresh)) => !auth::is_expired_at(refresh.expose(), now),
			_ => false,
		}
	}

	/// Derived authentication flag evaluated against the current UTC clock.
	pub fn is_authenticated(&self) -> bool {
		self.is_authenticated_at(OffsetDateTime::now_utc())
	}
}
