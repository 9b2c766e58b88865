//! Thread-safe in-memory [`SessionStore`] implementation.

// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	obs,
	session::{SessionCredentials, SessionStore},
};

type SessionCell = Arc<RwLock<SessionCredentials>>;

/// Session store that keeps credentials in-process behind a shared lock.
///
/// Clones share the same underlying state, so the application shell and the gateway can each
/// hold a handle.
#[derive(Clone, Debug, Default)]
pub struct MemorySessionStore(SessionCell);
impl MemorySessionStore {
	/// Creates a store seeded with the provided credentials.
	pub fn with_tokens(access: Option<&str>, refresh: Option<&str>) -> Self {
		let credentials = SessionCredentials {
			access_token: access.map(TokenSecret::from),
			refresh_token: refresh.map(TokenSecret::from),
			updated_at: Some(OffsetDateTime::now_utc()),
		};

		Self(Arc::new(RwLock::new(credentials)))
	}

	/// Creates a store from previously persisted credentials.
	pub fn rehydrate(credentials: SessionCredentials) -> Self {
		Self(Arc::new(RwLock::new(credentials)))
	}

	fn mutate(&self, action: &'static str, f: impl FnOnce(&mut SessionCredentials)) {
		let mut guard = self.0.write();

		f(&mut *guard);
		guard.updated_at = Some(OffsetDateTime::now_utc());

		obs::session_updated(action, guard.is_authenticated());
	}
}
impl SessionStore for MemorySessionStore {
	fn snapshot(&self) -> SessionCredentials {
		self.0.read().clone()
	}

	fn set_access_credential(&self, access: TokenSecret) {
		self.mutate("set_access_credential", |creds| creds.access_token = Some(access));
	}

	fn set_refresh_credential(&self, refresh: TokenSecret) {
		self.mutate("set_refresh_credential", |creds| creds.refresh_token = Some(refresh));
	}

	fn clear_session(&self) {
		self.mutate("clear_session", |creds| {
			creds.access_token = None;
			creds.refresh_token = None;
		});
	}

	fn set_session_from_login(&self, access: TokenSecret, refresh: Option<TokenSecret>) {
		self.mutate("set_session_from_login", |creds| {
			creds.access_token = Some(access);
			creds.refresh_token = refresh;
		});
	}
}
