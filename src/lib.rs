//! Authenticated request gateway for dashboard APIs: bearer attachment, single-flight credential
//! renewal, and queued retries over an injectable session store.

#![deny(clippy::all, missing_docs)]
#![cfg_attr(not(test), deny(unused_crate_dependencies))]

pub mod auth;
pub mod config;
pub mod error;
pub mod ext;
pub mod gateway;
pub mod obs;
pub mod session;
pub mod transport;
#[cfg(any(test, feature = "test"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// self
	use crate::ext::{Navigator, Notifier};
	#[cfg(feature = "reqwest")]
	use crate::{
		config::GatewayConfig,
		ext::{NavigatorHandle, NotifierHandle},
		gateway::ReqwestGateway,
		session::MemorySessionStore,
		transport::ReqwestTransport,
	};

	/// Notification captured by [`RecordingNotifier`].
	#[derive(Clone, Debug, PartialEq, Eq)]
	pub enum Notification {
		/// Success toast payload.
		Success(String),
		/// Error toast payload.
		Error(String),
	}

	/// Notifier that records every call so tests can assert on user-visible side effects.
	#[derive(Clone, Debug, Default)]
	pub struct RecordingNotifier(Arc<Mutex<Vec<Notification>>>);
	impl RecordingNotifier {
		/// Returns every notification observed so far, in call order.
		pub fn notifications(&self) -> Vec<Notification> {
			self.0.lock().clone()
		}

		/// Returns only the error notifications.
		pub fn errors(&self) -> Vec<String> {
			self.0
				.lock()
				.iter()
				.filter_map(|n| match n {
					Notification::Error(message) => Some(message.clone()),
					Notification::Success(_) => None,
				})
				.collect()
		}

		/// Returns only the success notifications.
		pub fn successes(&self) -> Vec<String> {
			self.0
				.lock()
				.iter()
				.filter_map(|n| match n {
					Notification::Success(message) => Some(message.clone()),
					Notification::Error(_) => None,
				})
				.collect()
		}
	}
	impl Notifier for RecordingNotifier {
		fn notify_success(&self, message: &str) {
			self.0.lock().push(Notification::Success(message.to_owned()));
		}

		fn notify_error(&self, message: &str) {
			self.0.lock().push(Notification::Error(message.to_owned()));
		}
	}

	/// Navigator that counts redirects to the login entry point.
	#[derive(Clone, Debug, Default)]
	pub struct RecordingNavigator(Arc<Mutex<usize>>);
	impl RecordingNavigator {
		/// Number of redirects requested so far.
		pub fn redirects(&self) -> usize {
			*self.0.lock()
		}
	}
	impl Navigator for RecordingNavigator {
		fn to_login(&self) {
			*self.0.lock() += 1;
		}
	}

	/// Bundle returned by [`build_reqwest_test_gateway`].
	#[cfg(feature = "reqwest")]
	#[derive(Clone, Debug)]
	pub struct TestHarness {
		/// Gateway under test.
		pub gateway: ReqwestGateway,
		/// Session store shared with the gateway.
		pub session: MemorySessionStore,
		/// Recorded notifications.
		pub notifier: RecordingNotifier,
		/// Recorded redirects.
		pub navigator: RecordingNavigator,
	}

	/// Constructs a reqwest-backed gateway against `base_url` with recording collaborators and
	/// an in-memory session seeded with the provided credentials.
	#[cfg(feature = "reqwest")]
	pub fn build_reqwest_test_gateway(
		base_url: &str,
		access: Option<&str>,
		refresh: Option<&str>,
	) -> TestHarness {
		let config = GatewayConfig::builder(
			Url::parse(base_url).expect("Test base URL should parse successfully."),
		)
		.build()
		.expect("Test gateway configuration should be valid.");
		let session = MemorySessionStore::with_tokens(access, refresh);
		let notifier = RecordingNotifier::default();
		let navigator = RecordingNavigator::default();
		let transport = ReqwestTransport::default();
		let notifier_handle: NotifierHandle = Arc::new(notifier.clone());
		let navigator_handle: NavigatorHandle = Arc::new(navigator.clone());
		let gateway = ReqwestGateway::with_transport(config, Arc::new(session.clone()), transport)
			.with_notifier(notifier_handle)
			.with_navigator(navigator_handle);

		TestHarness { gateway, session, notifier, navigator }
	}
}

mod _prelude {
	pub use std::{
		collections::VecDeque,
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		sync::Arc,
	};

	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

pub use http;
#[cfg(feature = "reqwest")] pub use reqwest;
pub use serde_json;
pub use url;
