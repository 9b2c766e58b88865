// self
use crate::{_prelude::*, auth::TokenSecret, obs::FlowKind};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedFlow<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedFlow<F> = F;

/// A span builder used by gateway flows.
#[derive(Clone, Debug)]
pub struct FlowSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl FlowSpan {
	/// Creates a new span tagged with the provided flow kind + stage.
	pub fn new(kind: FlowKind, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!("session_gateway.flow", flow = kind.as_str(), stage);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (kind, stage);

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedFlow<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

/// Emits a debug event after a session store mutation.
pub fn session_updated(action: &'static str, authenticated: bool) {
	#[cfg(feature = "tracing")]
	{
		tracing::debug!(action, authenticated, "Session credentials updated.");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (action, authenticated);
	}
}

/// Emits a debug event for a request-level transition, tagging the credential involved.
pub fn credential_stage(kind: FlowKind, stage: &'static str, credential: Option<&TokenSecret>) {
	#[cfg(feature = "tracing")]
	{
		let credential = credential.map(TokenSecret::fingerprint);

		tracing::debug!(flow = kind.as_str(), stage, credential = ?credential, "Gateway stage reached.");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (kind, stage, credential);
	}
}

/// Emits a debug event when a parked request is released or rejected.
pub fn pending_settled(label: &str, released: bool) {
	#[cfg(feature = "tracing")]
	{
		tracing::debug!(request = label, released, "Pending request settled.");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (label, released);
	}
}

/// Emits a warning for a failure surfaced by a gateway flow.
pub fn flow_failure(kind: FlowKind, stage: &'static str, err: &Error) {
	#[cfg(feature = "tracing")]
	{
		tracing::warn!(flow = kind.as_str(), stage, status = ?err.status(), error = %err, "Gateway flow failed.");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (kind, stage, err);
	}
}
