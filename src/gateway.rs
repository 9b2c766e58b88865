//! Authenticated request gateway.
//!
//! [`Gateway`] owns the transport, configuration, session handle, and UI collaborators so
//! callers only describe *what* to request. Every call reads the current access credential,
//! attaches it through the configured signer, and classifies the response. A `401` on the first
//! attempt enters the renewal protocol in [`renewal`]: at most one exchange runs at a time,
//! concurrent rejections queue behind it, and every queued request replays with the renewed
//! credential. A failed renewal clears the session, shows the session-expired message once, and
//! asks the navigator for the login entry point.

pub mod renewal;
pub mod request;

pub use renewal::*;
pub use request::*;

// crates.io
use http::StatusCode;
use serde::de::DeserializeOwned;
// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	config::GatewayConfig,
	ext::{
		BearerSigner, NavigatorHandle, NoopNavigator, NoopNotifier, NotifierHandle, SignerHandle,
	},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	session::SessionHandle,
	transport::{HttpResponse, HttpTransport},
};
#[cfg(feature = "reqwest")] use crate::transport::ReqwestTransport;

#[cfg(feature = "reqwest")]
/// Gateway specialized for the crate's default reqwest transport.
pub type ReqwestGateway = Gateway<ReqwestTransport>;

/// Issues authenticated requests and coordinates credential renewal.
///
/// Cloning is cheap: clones share the transport, session, collaborators, and the renewal
/// coordinator, so a renewal started through one clone is observed by all of them.
pub struct Gateway<T>
where
	T: ?Sized + HttpTransport,
{
	/// Transport used for every outbound call, renewal included.
	pub transport: Arc<T>,
	/// Validated configuration.
	pub config: Arc<GatewayConfig>,
	/// Session store holding the credential pair.
	pub session: SessionHandle,
	/// Receives user-visible success and failure messages.
	pub notifier: NotifierHandle,
	/// Routes the user to re-authentication after an unrecoverable renewal failure.
	pub navigator: NavigatorHandle,
	/// Attaches the access credential to outbound calls.
	pub signer: SignerHandle,
	/// Shared counters for renewal cycles.
	pub renewal_metrics: Arc<RenewalMetrics>,
	coordinator: Arc<RenewalCoordinator>,
}
impl<T> Gateway<T>
where
	T: ?Sized + HttpTransport,
{
	/// Creates a gateway over the caller-provided transport.
	///
	/// Notifications and navigation default to no-ops; attach real collaborators with
	/// [`with_notifier`](Self::with_notifier) and [`with_navigator`](Self::with_navigator).
	pub fn with_transport(
		config: GatewayConfig,
		session: SessionHandle,
		transport: impl Into<Arc<T>>,
	) -> Self {
		Self {
			transport: transport.into(),
			config: Arc::new(config),
			session,
			notifier: Arc::new(NoopNotifier),
			navigator: Arc::new(NoopNavigator),
			signer: Arc::new(BearerSigner),
			renewal_metrics: Default::default(),
			coordinator: Default::default(),
		}
	}

	/// Sets or replaces the notifier.
	pub fn with_notifier(mut self, notifier: NotifierHandle) -> Self {
		self.notifier = notifier;

		self
	}

	/// Sets or replaces the navigator.
	pub fn with_navigator(mut self, navigator: NavigatorHandle) -> Self {
		self.navigator = navigator;

		self
	}

	/// Sets or replaces the request signer.
	pub fn with_signer(mut self, signer: SignerHandle) -> Self {
		self.signer = signer;

		self
	}

	/// Returns `true` while a renewal exchange is outstanding.
	pub fn renewal_in_flight(&self) -> bool {
		self.coordinator.in_flight()
	}

	/// Number of requests parked behind the in-flight renewal.
	pub fn pending_requests(&self) -> usize {
		self.coordinator.pending()
	}

	/// Sends `request` and returns the decoded JSON body (`null` for empty bodies).
	pub async fn send(&self, request: ApiRequest) -> Result<serde_json::Value> {
		self.send_json(request).await
	}

	/// Sends `request` and decodes the JSON body into `R`.
	///
	/// Authorization recovery is invisible on success. Every other failure is returned to the
	/// caller after the error notifier has been called (unless the request opted out). Session
	/// terminal failures are never notified here because the renewal leader already reported
	/// them once.
	pub async fn send_json<R>(&self, request: ApiRequest) -> Result<R>
	where
		R: DeserializeOwned,
	{
		const KIND: FlowKind = FlowKind::Request;

		let span = FlowSpan::new(KIND, "send");
		let skip_error_notification = request.options.skip_error_notification;

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				let response = self.dispatch_with_renewal(request).await?;
				let status = response.status.as_u16();
				let value = decode_body(&response)?;
				let decoded: R = serde_path_to_error::deserialize(&value)
					.map_err(|source| Error::Decode { source, status })?;

				self.report_success(&value);

				Ok(decoded)
			})
			.await;

		match &result {
			Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Err(err) => {
				obs::record_flow_outcome(KIND, FlowOutcome::Failure);
				obs::flow_failure(KIND, "send", err);

				if !skip_error_notification && !err.is_session_terminal() {
					self.notifier.notify_error(&err.user_message());
				}
			},
		}

		result
	}

	async fn dispatch_with_renewal(&self, mut request: ApiRequest) -> Result<HttpResponse> {
		// Read the cycle before the credential so a renewal settling in between is never missed.
		let dispatched_in = self.coordinator.cycle();
		let access = self.session.snapshot().access().cloned();
		let response = self.dispatch(FlowKind::Request, &request, access.as_ref()).await?;

		if response.status != StatusCode::UNAUTHORIZED {
			return classify(response);
		}
		if request.retried {
			return Err(Error::RetryExhausted);
		}

		request.retried = true;

		let renewed = self.await_renewal(&request, access.as_ref(), dispatched_in).await?;
		let response = self.dispatch(FlowKind::Retry, &request, Some(&renewed)).await?;

		if response.status == StatusCode::UNAUTHORIZED {
			return Err(Error::RetryExhausted);
		}

		classify(response)
	}

	async fn dispatch(
		&self,
		kind: FlowKind,
		request: &ApiRequest,
		access: Option<&TokenSecret>,
	) -> Result<HttpResponse> {
		let mut call = request.to_call(&self.config)?;

		if let Some(access) = access {
			self.signer.attach_token(&mut call, access)?;
		}

		obs::credential_stage(kind, "dispatch", access);

		Ok(self.transport.execute(call).await?)
	}

	async fn await_renewal(
		&self,
		request: &ApiRequest,
		sent_with: Option<&TokenSecret>,
		dispatched_in: u64,
	) -> Result<TokenSecret> {
		let admission =
			self.coordinator.admit(self.session.as_ref(), sent_with, dispatched_in, request.label());

		match admission {
			Admission::Current(current) => {
				self.renewal_metrics.record_stale_retry();
				obs::record_flow_outcome(FlowKind::Renewal, FlowOutcome::Stale);

				Ok(current)
			},
			Admission::Cleared => Err(RenewalFailure::session_cleared().into()),
			Admission::Wait(receiver) => {
				self.renewal_metrics.record_queued();
				obs::record_flow_outcome(FlowKind::Renewal, FlowOutcome::Queued);

				match receiver.await {
					Ok(outcome) => outcome.map_err(Error::from),
					Err(_) => Err(RenewalFailure::abandoned().into()),
				}
			},
			Admission::Lead(lease) => self.lead_renewal(lease).await,
		}
	}

	async fn lead_renewal(&self, lease: RenewalLease) -> Result<TokenSecret> {
		const KIND: FlowKind = FlowKind::Renewal;

		let span = FlowSpan::new(KIND, "lead_renewal");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);
		self.renewal_metrics.record_attempt();

		let credentials = self.session.snapshot();
		let result = span
			.instrument(renewal::renew(self.transport.as_ref(), &self.config, &credentials))
			.await;

		match result {
			Ok(RenewedTokens { access, refresh }) => {
				self.session.set_access_credential(access.clone());

				if let Some(refresh) = refresh.filter(|_| self.config.rotate_refresh_token) {
					self.session.set_refresh_credential(refresh);
				}

				lease.settle(Ok(access.clone()));
				self.renewal_metrics.record_success();
				obs::record_flow_outcome(KIND, FlowOutcome::Success);
				obs::credential_stage(KIND, "renewed", Some(&access));

				Ok(access)
			},
			Err(err) => {
				let failure = RenewalFailure::from(&err);

				obs::flow_failure(KIND, "lead_renewal", &err);
				// Clear before settling so late rejections observe the cleared session instead
				// of starting another cycle with the dead refresh credential.
				self.session.clear_session();
				lease.settle(Err(failure.clone()));
				self.renewal_metrics.record_failure();
				obs::record_flow_outcome(KIND, FlowOutcome::Failure);
				self.notifier.notify_error(&self.config.session_expired_message);
				self.navigator.to_login();

				Err(failure.into())
			},
		}
	}

	fn report_success(&self, value: &serde_json::Value) {
		let indicated = value.get("success").and_then(serde_json::Value::as_bool) == Some(true);

		if !indicated {
			return;
		}
		if let Some(message) = value
			.get("message")
			.and_then(serde_json::Value::as_str)
			.filter(|message| !message.trim().is_empty())
		{
			self.notifier.notify_success(message);
		}
	}
}
#[cfg(feature = "reqwest")]
impl Gateway<ReqwestTransport> {
	/// Creates a gateway that provisions its own reqwest-backed transport.
	pub fn new(config: GatewayConfig, session: SessionHandle) -> Self {
		Self::with_transport(config, session, ReqwestTransport::default())
	}
}
impl<T> Clone for Gateway<T>
where
	T: ?Sized + HttpTransport,
{
	fn clone(&self) -> Self {
		Self {
			transport: Arc::clone(&self.transport),
			config: Arc::clone(&self.config),
			session: Arc::clone(&self.session),
			notifier: Arc::clone(&self.notifier),
			navigator: Arc::clone(&self.navigator),
			signer: Arc::clone(&self.signer),
			renewal_metrics: Arc::clone(&self.renewal_metrics),
			coordinator: Arc::clone(&self.coordinator),
		}
	}
}
impl<T> Debug for Gateway<T>
where
	T: ?Sized + HttpTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Gateway")
			.field("base_url", &self.config.base_url.as_str())
			.field("authenticated", &self.session.is_authenticated())
			.field("renewal_in_flight", &self.coordinator.in_flight())
			.finish()
	}
}

/// Builds the error for a non-success response that is not an expired credential.
pub(crate) fn status_error(response: &HttpResponse) -> Error {
	Error::Status {
		status: response.status.as_u16(),
		message: extract_message(&response.body),
		body: response.text(),
	}
}

fn classify(response: HttpResponse) -> Result<HttpResponse> {
	if response.status.is_success() { Ok(response) } else { Err(status_error(&response)) }
}

fn decode_body(response: &HttpResponse) -> Result<serde_json::Value> {
	if response.body.iter().all(u8::is_ascii_whitespace) {
		return Ok(serde_json::Value::Null);
	}

	serde_path_to_error::deserialize(&mut serde_json::Deserializer::from_slice(&response.body))
		.map_err(|source| Error::Decode { source, status: response.status.as_u16() })
}

/// Pulls a human-readable message out of a JSON error body.
fn extract_message(body: &[u8]) -> Option<String> {
	const FIELDS: [&str; 3] = ["message", "detail", "error"];

	let value = serde_json::from_slice::<serde_json::Value>(body).ok()?;

	FIELDS.iter().find_map(|field| {
		value
			.get(field)
			.and_then(serde_json::Value::as_str)
			.map(str::trim)
			.filter(|message| !message.is_empty())
			.map(str::to_owned)
	})
}
