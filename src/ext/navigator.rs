//! Navigation contract used when the session cannot be recovered.

// self
use crate::_prelude::*;

/// Shared navigator handle stored by the gateway.
pub type NavigatorHandle = Arc<dyn Navigator>;

/// Application-shell hook that routes the user to re-authentication.
pub trait Navigator
where
	Self: Send + Sync,
{
	/// Navigates to the login entry point. Called at most once per failed renewal.
	fn to_login(&self);
}

/// Navigator that ignores redirect requests.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopNavigator;
impl Navigator for NoopNavigator {
	fn to_login(&self) {}
}
