//! Credential renewal with a single-flight guard and a FIFO queue of waiting requests.
//!
//! When a request is rejected with `401`, the gateway asks the [`RenewalCoordinator`] for
//! admission. Exactly one request becomes the leader and performs the exchange through
//! [`renew`]. Requests rejected while that exchange is in flight park a [`PendingRequest`] and
//! suspend on its completion channel. The leader settles the cycle through its
//! [`RenewalLease`], which clears the in-flight flag and drains the queue in one critical
//! section. A lease dropped before settling rejects its waiters, so no request is stranded when
//! the leader's future is cancelled.

mod metrics;

pub use metrics::RenewalMetrics;

// crates.io
use futures::channel::oneshot;
use http::{HeaderValue, Method, header::CONTENT_TYPE};
// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	config::GatewayConfig,
	gateway,
	obs,
	session::{SessionCredentials, SessionStore},
	transport::{HttpCall, HttpTransport},
};

/// Result broadcast to every request waiting on a renewal cycle.
pub type RenewalOutcome = std::result::Result<TokenSecret, RenewalFailure>;

/// Cloneable summary of a failed renewal, shared with every waiter of the cycle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RenewalFailure {
	/// The session held no refresh credential.
	NoRefreshToken,
	/// The exchange failed or was abandoned.
	Rejected {
		/// Summary of the underlying failure.
		reason: String,
		/// HTTP status returned by the renewal endpoint, when one was received.
		status: Option<u16>,
	},
}
impl RenewalFailure {
	/// Failure reported when the leading request disappeared before settling.
	pub fn abandoned() -> Self {
		Self::Rejected { reason: "renewal was abandoned before it settled".into(), status: None }
	}

	/// Failure reported when the session was cleared after the request was dispatched.
	pub fn session_cleared() -> Self {
		Self::Rejected {
			reason: "session was cleared by an earlier renewal failure".into(),
			status: None,
		}
	}
}
impl From<&Error> for RenewalFailure {
	fn from(err: &Error) -> Self {
		match err {
			Error::NoRefreshToken => Self::NoRefreshToken,
			Error::RenewalFailed { reason, status } =>
				Self::Rejected { reason: reason.clone(), status: *status },
			other => Self::Rejected { reason: other.user_message(), status: other.status() },
		}
	}
}
impl From<RenewalFailure> for Error {
	fn from(failure: RenewalFailure) -> Self {
		match failure {
			RenewalFailure::NoRefreshToken => Error::NoRefreshToken,
			RenewalFailure::Rejected { reason, status } => Error::RenewalFailed { reason, status },
		}
	}
}

/// Credentials returned by a successful renewal exchange.
#[derive(Clone, Debug)]
pub struct RenewedTokens {
	/// Fresh access credential.
	pub access: TokenSecret,
	/// Rotated refresh credential, if the backend issued one.
	pub refresh: Option<TokenSecret>,
}

#[derive(Deserialize)]
struct RenewalEnvelope {
	data: RenewalData,
}
#[derive(Deserialize)]
struct RenewalData {
	tokens: RenewalTokens,
}
#[derive(Deserialize)]
struct RenewalTokens {
	access: String,
	#[serde(default)]
	refresh: Option<String>,
}

/// Exchanges the session's refresh credential for a new access credential.
///
/// The call goes straight to `transport`, never through the gateway, so a rejected renewal
/// cannot trigger another renewal. Fails with [`Error::NoRefreshToken`] before touching the
/// network when the session has no refresh credential.
pub async fn renew<T>(
	transport: &T,
	config: &GatewayConfig,
	credentials: &SessionCredentials,
) -> Result<RenewedTokens>
where
	T: ?Sized + HttpTransport,
{
	let refresh = credentials.refresh().ok_or(Error::NoRefreshToken)?;
	let mut headers = config.default_headers.clone();

	headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

	obs::credential_stage(obs::FlowKind::Renewal, "renew", Some(refresh));

	let call = HttpCall {
		method: Method::POST,
		url: config.renewal_url()?,
		headers,
		body: Some(serde_json::json!({ "refresh": refresh.expose() }).to_string().into_bytes()),
		timeout: config.std_timeout(),
	};
	let response = transport.execute(call).await?;
	let status = response.status.as_u16();

	if !response.status.is_success() {
		return Err(gateway::status_error(&response));
	}

	let envelope: RenewalEnvelope =
		serde_path_to_error::deserialize(&mut serde_json::Deserializer::from_slice(&response.body))
			.map_err(|source| Error::Decode { source, status })?;
	let RenewalTokens { access, refresh } = envelope.data.tokens;
	let access = TokenSecret::new(access);

	if access.is_empty() {
		return Err(Error::RenewalFailed {
			reason: "renewal response carried an empty access credential".into(),
			status: Some(status),
		});
	}

	Ok(RenewedTokens {
		access,
		refresh: refresh.map(TokenSecret::new).filter(|secret| !secret.is_empty()),
	})
}

/// Request parked while another request's renewal is in flight.
#[derive(Debug)]
pub struct PendingRequest {
	label: String,
	resolver: oneshot::Sender<RenewalOutcome>,
}

/// Admission decision returned by [`RenewalCoordinator::admit`].
#[derive(Debug)]
pub enum Admission {
	/// The credential was already replaced since the request was dispatched; retry with it.
	Current(TokenSecret),
	/// The session was cleared since the request was dispatched; give up quietly.
	Cleared,
	/// Another request leads the renewal; await its outcome.
	Wait(oneshot::Receiver<RenewalOutcome>),
	/// The caller leads the renewal and must settle the lease.
	Lead(RenewalLease),
}

#[derive(Debug, Default)]
struct RenewalState {
	in_flight: bool,
	pending: VecDeque<PendingRequest>,
	settled_cycles: u64,
}

/// Single-flight guard over renewal cycles.
#[derive(Debug, Default)]
pub struct RenewalCoordinator {
	state: Mutex<RenewalState>,
}
impl RenewalCoordinator {
	/// Decides how a request rejected with `401` proceeds.
	///
	/// `sent_with` is the access credential the rejected request carried and `dispatched_in` the
	/// [`cycle`](Self::cycle) observed before it was sent. The check against the session and the
	/// in-flight flag happen under one lock, so concurrent callers observe a single leader per
	/// cycle. A request can lead only when it carried the current credential, or carried none
	/// against an empty session with no cycle settled since its dispatch.
	pub fn admit(
		self: &Arc<Self>,
		session: &dyn SessionStore,
		sent_with: Option<&TokenSecret>,
		dispatched_in: u64,
		label: String,
	) -> Admission {
		let mut state = self.state.lock();
		let current = session.snapshot().access().cloned();

		match (sent_with, current) {
			(Some(sent), Some(current)) if sent != &current => return Admission::Current(current),
			// A credential installed after an anonymous dispatch is as good as a renewed one.
			(None, Some(current)) => return Admission::Current(current),
			(Some(_), None) => return Admission::Cleared,
			(None, None) if state.settled_cycles != dispatched_in => return Admission::Cleared,
			_ => {},
		}

		if state.in_flight {
			let (resolver, receiver) = oneshot::channel();

			state.pending.push_back(PendingRequest { label, resolver });

			return Admission::Wait(receiver);
		}

		state.in_flight = true;

		Admission::Lead(RenewalLease { coordinator: Arc::clone(self), settled: false })
	}

	/// Number of renewal cycles settled so far.
	pub fn cycle(&self) -> u64 {
		self.state.lock().settled_cycles
	}

	/// Returns `true` while a renewal exchange is outstanding.
	pub fn in_flight(&self) -> bool {
		self.state.lock().in_flight
	}

	/// Number of requests currently parked behind the in-flight renewal.
	pub fn pending(&self) -> usize {
		self.state.lock().pending.len()
	}

	fn finish(&self, outcome: RenewalOutcome) -> Vec<String> {
		let pending = {
			let mut state = self.state.lock();

			state.in_flight = false;
			state.settled_cycles += 1;

			std::mem::take(&mut state.pending)
		};

		pending
			.into_iter()
			.map(|PendingRequest { label, resolver }| {
				obs::pending_settled(&label, outcome.is_ok());

				// A waiter that gave up has dropped its receiver; nothing to deliver.
				let _ = resolver.send(outcome.clone());

				label
			})
			.collect()
	}
}

/// Leadership token for one renewal cycle.
#[derive(Debug)]
pub struct RenewalLease {
	coordinator: Arc<RenewalCoordinator>,
	settled: bool,
}
impl RenewalLease {
	/// Ends the cycle: clears the in-flight flag and releases every waiter in FIFO order with
	/// `outcome`. Returns the labels of the released waiters in release order.
	pub fn settle(mut self, outcome: RenewalOutcome) -> Vec<String> {
		self.settled = true;

		self.coordinator.finish(outcome)
	}
}
impl Drop for RenewalLease {
	fn drop(&mut self) {
		if !self.settled {
			self.coordinator.finish(Err(RenewalFailure::abandoned()));
		}
	}
}
