//! Optional observability helpers for gateway flows.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `session_gateway.flow` with the `flow` and
//!   `stage` (call site) fields, plus debug/warn events for session and renewal transitions.
//!   Credentials only ever appear as [`TokenSecret::fingerprint`](crate::auth::TokenSecret)
//!   values.
//! - Enable `metrics` to increment the `session_gateway_flow_total` counter for every
//!   attempt/success/failure, labeled by `flow` + `outcome`. Renewal admissions that skip the
//!   exchange are counted as `queued` or `stale` under `flow="renewal"`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Gateway flow kinds observed by the instrumentation layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowKind {
	/// Primary dispatch of a caller's request.
	Request,
	/// Credential renewal exchange.
	Renewal,
	/// Replay of a request after renewal.
	Retry,
}
impl FlowKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowKind::Request => "request",
			FlowKind::Renewal => "renewal",
			FlowKind::Retry => "retry",
		}
	}
}
impl Display for FlowKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowOutcome {
	/// Entry to a gateway helper.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
	/// A rejected request parked behind another request's renewal.
	Queued,
	/// A rejected request replayed with a credential renewed after it was dispatched.
	Stale,
}
impl FlowOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowOutcome::Attempt => "attempt",
			FlowOutcome::Success => "success",
			FlowOutcome::Failure => "failure",
			FlowOutcome::Queued => "queued",
			FlowOutcome::Stale => "stale",
		}
	}
}
impl Display for FlowOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
