//! User-facing notification contract (toasts, banners).

// self
use crate::_prelude::*;

/// Shared notifier handle stored by the gateway.
pub type NotifierHandle = Arc<dyn Notifier>;

/// Receives user-visible outcomes produced while serving requests.
pub trait Notifier
where
	Self: Send + Sync,
{
	/// Reports a server-provided success message.
	fn notify_success(&self, message: &str);

	/// Reports a failure message.
	fn notify_error(&self, message: &str);
}

/// Notifier that drops every message.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopNotifier;
impl Notifier for NoopNotifier {
	fn notify_success(&self, _: &str) {}

	fn notify_error(&self, _: &str) {}
}

/// Notifier that forwards messages to `tracing` events (when enabled).
///
/// Handy for headless hosts such as CLIs and background jobs.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingNotifier;
impl Notifier for TracingNotifier {
	fn notify_success(&self, message: &str) {
		#[cfg(feature = "tracing")]
		tracing::info!(message, "Request succeeded.");
		#[cfg(not(feature = "tracing"))]
		let _ = message;
	}

	fn notify_error(&self, message: &str) {
		#[cfg(feature = "tracing")]
		tracing::warn!(message, "Request failed.");
		#[cfg(not(feature = "tracing"))]
		let _ = message;
	}
}
