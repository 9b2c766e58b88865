//! Demonstrates a dashboard client whose access credential expires mid-session.
//!
//! Three widgets load concurrently against a mock backend that only accepts the renewed
//! credential. The first rejection renews the session once, the other two queue behind it, and all
//! three replay transparently.

// std
use std::sync::Arc;
// crates.io
use color_eyre::Result;
use futures::future;
use httpmock::prelude::*;
use serde_json::json;
use url::Url;
// self
use session_gateway::{
	config::GatewayConfig,
	ext::{Navigator, Notifier},
	gateway::{ApiRequest, ReqwestGateway},
	session::{MemorySessionStore, SessionStore},
};

const WIDGETS: [&str; 3] = ["cpu", "memory", "disk"];

struct ConsoleNotifier;
impl Notifier for ConsoleNotifier {
	fn notify_success(&self, message: &str) {
		println!("[toast:success] {message}");
	}

	fn notify_error(&self, message: &str) {
		println!("[toast:error] {message}");
	}
}

struct ConsoleNavigator;
impl Navigator for ConsoleNavigator {
	fn to_login(&self) {
		println!("[router] -> /login");
	}
}

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;

	for name in WIDGETS {
		let path = format!("/api/widgets/{name}/");

		server
			.mock_async(|when, then| {
				when.method(GET).path(&path).header("authorization", "Bearer stale");
				then.status(401).json_body(json!({ "detail": "Token is expired" }));
			})
			.await;
		server
			.mock_async(|when, then| {
				when.method(GET).path(&path).header("authorization", "Bearer fresh");
				then.status(200).json_body(json!({ "widget": name, "value": 42 }));
			})
			.await;
	}

	server
		.mock_async(|when, then| {
			when.method(POST).path("/api/widgets/pin/").header("authorization", "Bearer fresh");
			then.status(200).json_body(json!({ "success": true, "message": "Widget pinned" }));
		})
		.await;

	let renewal = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/auth/refresh/").json_body(json!({ "refresh": "r-1" }));
			then.status(200).json_body(json!({
				"data": { "tokens": { "access": "fresh", "refresh": "r-2" } }
			}));
		})
		.await;
	let config = GatewayConfig::builder(Url::parse(&server.url("/api"))?).build()?;
	let session = MemorySessionStore::with_tokens(Some("stale"), Some("r-1"));
	let gateway = ReqwestGateway::new(config, Arc::new(session.clone()))
		.with_notifier(Arc::new(ConsoleNotifier))
		.with_navigator(Arc::new(ConsoleNavigator));
	let widgets = future::try_join_all(
		WIDGETS
			.into_iter()
			.map(|name| gateway.send(ApiRequest::get(format!("widgets/{name}/")))),
	)
	.await?;

	renewal.assert_async().await;

	println!(
		"Loaded {} widgets after {} renewal(s).",
		widgets.len(),
		gateway.renewal_metrics.attempts()
	);

	gateway.send(ApiRequest::post("widgets/pin/").json(json!({ "widget": "cpu" }))).await?;

	let credentials = session.snapshot();

	println!(
		"Session authenticated: {}; access credential {:?}.",
		session.is_authenticated(),
		credentials.access()
	);

	Ok(())
}
