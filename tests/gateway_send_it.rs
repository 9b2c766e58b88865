#![cfg(feature = "reqwest")]

// crates.io
use httpmock::prelude::*;
use serde_json::json;
// self
use session_gateway::{
	_preludet::*,
	config::GatewayConfig,
	error::TransportError,
	gateway::{ApiRequest, Gateway, ReqwestGateway},
	session::{MemorySessionStore, SessionStore},
	transport::ReqwestTransport,
};

const SESSION_EXPIRED: &str = "Session expired. Please log in again.";

fn harness(server: &MockServer, access: Option<&str>, refresh: Option<&str>) -> TestHarness {
	build_reqwest_test_gateway(&server.url("/api"), access, refresh)
}

#[tokio::test]
async fn send_attaches_bearer_and_reports_success_message() {
	let server = MockServer::start_async().await;
	let TestHarness { gateway, notifier, .. } = harness(&server, Some("access-1"), Some("refresh-1"));
	let mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/api/users/")
				.header("authorization", "Bearer access-1")
				.header("content-type", "application/json")
				.json_body(json!({ "name": "ada" }));
			then.status(201).json_body(json!({ "success": true, "message": "User created" }));
		})
		.await;
	let body = gateway
		.send(ApiRequest::post("users/").json(json!({ "name": "ada" })))
		.await
		.expect("Authenticated request should succeed.");

	mock.assert_async().await;

	assert_eq!(body["message"], "User created");
	assert_eq!(notifier.successes(), vec!["User created".to_string()]);
	assert!(notifier.errors().is_empty());
}

#[tokio::test]
async fn success_without_indicator_stays_quiet() {
	let server = MockServer::start_async().await;
	let TestHarness { gateway, notifier, .. } = harness(&server, Some("access-1"), Some("refresh-1"));

	server
		.mock_async(|when, then| {
			when.method(GET).path("/api/users/");
			then.status(200).json_body(json!({ "message": "listing", "results": [] }));
		})
		.await;

	let body = gateway.send(ApiRequest::get("users/")).await.expect("Listing should succeed.");

	assert_eq!(body["results"], json!([]));
	assert!(notifier.notifications().is_empty());
}

#[tokio::test]
async fn server_error_skips_renewal_and_notifies_once() {
	let server = MockServer::start_async().await;
	let TestHarness { gateway, notifier, navigator, session } =
		harness(&server, Some("access-1"), Some("refresh-1"));
	let failing = server
		.mock_async(|when, then| {
			when.method(GET).path("/api/reports/");
			then.status(500).json_body(json!({ "detail": "Database unavailable" }));
		})
		.await;
	let renewal = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/auth/refresh/");
			then.status(200);
		})
		.await;
	let err = gateway
		.send(ApiRequest::get("reports/"))
		.await
		.expect_err("5xx responses should propagate to the caller.");

	assert!(matches!(err, Error::Status { status: 500, .. }));

	failing.assert_async().await;
	renewal.assert_calls_async(0).await;

	assert_eq!(notifier.errors(), vec!["Database unavailable".to_string()]);
	assert_eq!(navigator.redirects(), 0);
	assert!(session.is_authenticated());
	assert_eq!(gateway.renewal_metrics.attempts(), 0);
}

#[tokio::test]
async fn skip_error_notification_suppresses_toast() {
	let server = MockServer::start_async().await;
	let TestHarness { gateway, notifier, .. } = harness(&server, Some("access-1"), Some("refresh-1"));

	server
		.mock_async(|when, then| {
			when.method(DELETE).path("/api/users/7/");
			then.status(404).json_body(json!({ "detail": "Not found." }));
		})
		.await;

	let err = gateway
		.send(ApiRequest::delete("users/7/").skip_error_notification())
		.await
		.expect_err("404 should propagate.");

	assert_eq!(err.status(), Some(404));
	assert!(notifier.notifications().is_empty());
}

#[tokio::test]
async fn expired_access_is_renewed_and_retried_transparently() {
	let server = MockServer::start_async().await;
	let TestHarness { gateway, notifier, navigator, session } =
		harness(&server, Some("access-old"), Some("refresh-1"));
	let rejected = server
		.mock_async(|when, then| {
			when.method(GET).path("/api/profile/").header("authorization", "Bearer access-old");
			then.status(401).json_body(json!({ "detail": "Token is expired" }));
		})
		.await;
	let accepted = server
		.mock_async(|when, then| {
			when.method(GET).path("/api/profile/").header("authorization", "Bearer access-new");
			then.status(200).json_body(json!({ "username": "ada" }));
		})
		.await;
	let renewal = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/api/auth/refresh/")
				.json_body(json!({ "refresh": "refresh-1" }));
			then.status(200).json_body(json!({
				"data": { "tokens": { "access": "access-new", "refresh": "refresh-2" } }
			}));
		})
		.await;
	let body = gateway
		.send(ApiRequest::get("profile/"))
		.await
		.expect("Renewal should be invisible to the caller.");

	assert_eq!(body["username"], "ada");

	rejected.assert_async().await;
	renewal.assert_async().await;
	accepted.assert_async().await;

	let snapshot = session.snapshot();

	assert_eq!(snapshot.access().map(|secret| secret.expose()), Some("access-new"));
	assert_eq!(snapshot.refresh().map(|secret| secret.expose()), Some("refresh-2"));
	assert!(notifier.notifications().is_empty());
	assert_eq!(navigator.redirects(), 0);
	assert!(!gateway.renewal_in_flight());

	// Later calls attach the renewed credential directly.
	gateway.send(ApiRequest::get("profile/")).await.expect("Follow-up request should succeed.");

	accepted.assert_calls_async(2).await;
	rejected.assert_calls_async(1).await;
	renewal.assert_calls_async(1).await;
}

#[tokio::test]
async fn rotation_can_be_disabled() {
	let server = MockServer::start_async().await;
	let config = GatewayConfig::builder(Url::parse(&server.url("/api")).expect("URL should parse."))
		.rotate_refresh_token(false)
		.build()
		.expect("Configuration should build.");
	let session = MemorySessionStore::with_tokens(Some("access-old"), Some("refresh-1"));
	let gateway: Gateway<ReqwestTransport> = Gateway::new(config, Arc::new(session.clone()));

	server
		.mock_async(|when, then| {
			when.method(GET).path("/api/me/").header("authorization", "Bearer access-old");
			then.status(401);
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(GET).path("/api/me/").header("authorization", "Bearer access-new");
			then.status(204);
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(POST).path("/api/auth/refresh/");
			then.status(200).json_body(json!({
				"data": { "tokens": { "access": "access-new", "refresh": "refresh-2" } }
			}));
		})
		.await;

	let body = gateway.send(ApiRequest::get("me/")).await.expect("Retry should succeed.");

	assert_eq!(body, serde_json::Value::Null);

	let snapshot = session.snapshot();

	assert_eq!(snapshot.access().map(|secret| secret.expose()), Some("access-new"));
	assert_eq!(snapshot.refresh().map(|secret| secret.expose()), Some("refresh-1"));
}

#[tokio::test]
async fn rejected_renewal_clears_session_and_redirects() {
	let server = MockServer::start_async().await;
	let TestHarness { gateway, notifier, navigator, session } =
		harness(&server, Some("access-old"), Some("refresh-revoked"));

	server
		.mock_async(|when, then| {
			when.method(GET).path("/api/orders/");
			then.status(401);
		})
		.await;

	let renewal = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/auth/refresh/");
			then.status(401).json_body(json!({ "detail": "Token is blacklisted" }));
		})
		.await;
	let err = gateway
		.send(ApiRequest::get("orders/"))
		.await
		.expect_err("A rejected renewal should fail the request.");

	assert!(matches!(err, Error::RenewalFailed { status: Some(401), ref reason } if reason == "Token is blacklisted"));

	renewal.assert_async().await;

	let snapshot = session.snapshot();

	assert!(snapshot.access_token.is_none());
	assert!(snapshot.refresh_token.is_none());
	assert!(!session.is_authenticated());
	assert_eq!(notifier.errors(), vec![SESSION_EXPIRED.to_string()]);
	assert_eq!(navigator.redirects(), 1);
	assert_eq!(gateway.renewal_metrics.failures(), 1);
	assert!(!gateway.renewal_in_flight());
}

#[tokio::test]
async fn missing_refresh_token_never_calls_renewal_endpoint() {
	let server = MockServer::start_async().await;
	let TestHarness { gateway, notifier, navigator, session } =
		harness(&server, Some("access-old"), None);

	server
		.mock_async(|when, then| {
			when.method(GET).path("/api/orders/");
			then.status(401);
		})
		.await;

	let renewal = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/auth/refresh/");
			then.status(200);
		})
		.await;
	let err = gateway
		.send(ApiRequest::get("orders/"))
		.await
		.expect_err("Missing refresh credential should fail the request.");

	assert!(matches!(err, Error::NoRefreshToken));

	renewal.assert_calls_async(0).await;

	assert!(session.snapshot().access_token.is_none());
	assert_eq!(notifier.errors(), vec![SESSION_EXPIRED.to_string()]);
	assert_eq!(navigator.redirects(), 1);
}

#[tokio::test]
async fn second_rejection_after_renewal_is_not_renewed_again() {
	let server = MockServer::start_async().await;
	let TestHarness { gateway, notifier, navigator, session } =
		harness(&server, Some("access-old"), Some("refresh-1"));
	let api = server
		.mock_async(|when, then| {
			when.method(GET).path("/api/admin/");
			then.status(401);
		})
		.await;
	let renewal = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/auth/refresh/");
			then.status(200).json_body(json!({ "data": { "tokens": { "access": "access-new" } } }));
		})
		.await;
	let err = gateway
		.send(ApiRequest::get("admin/"))
		.await
		.expect_err("A second 401 should surface to the caller.");

	assert!(matches!(err, Error::RetryExhausted));

	api.assert_calls_async(2).await;
	renewal.assert_calls_async(1).await;

	assert_eq!(session.snapshot().access().map(|secret| secret.expose()), Some("access-new"));
	assert!(session.is_authenticated());
	assert_eq!(notifier.errors(), vec!["Access credential was rejected again after renewal.".to_string()]);
	assert_eq!(navigator.redirects(), 0);
}

#[tokio::test]
async fn malformed_renewal_response_counts_as_renewal_failure() {
	let server = MockServer::start_async().await;
	let TestHarness { gateway, navigator, session, .. } =
		harness(&server, Some("access-old"), Some("refresh-1"));

	server
		.mock_async(|when, then| {
			when.method(GET).path("/api/orders/");
			then.status(401);
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(POST).path("/api/auth/refresh/");
			then.status(200).json_body(json!({ "data": { "access": "flat-shape" } }));
		})
		.await;

	let err = gateway
		.send(ApiRequest::get("orders/"))
		.await
		.expect_err("Malformed renewal payloads should fail.");

	assert!(matches!(err, Error::RenewalFailed { status: Some(200), .. }));
	assert!(!session.is_authenticated());
	assert_eq!(navigator.redirects(), 1);
}

#[tokio::test]
async fn slow_responses_surface_as_timeouts() {
	let server = MockServer::start_async().await;
	let config = GatewayConfig::builder(Url::parse(&server.url("/api")).expect("URL should parse."))
		.timeout(Duration::milliseconds(200))
		.build()
		.expect("Configuration should build.");
	let notifier = RecordingNotifier::default();
	let session = MemorySessionStore::with_tokens(Some("access-1"), Some("refresh-1"));
	let gateway =
		ReqwestGateway::with_transport(config, Arc::new(session), ReqwestTransport::default())
			.with_notifier(Arc::new(notifier.clone()));

	server
		.mock_async(|when, then| {
			when.method(GET).path("/api/slow/");
			then.status(200).delay(std::time::Duration::from_secs(2));
		})
		.await;

	let err = gateway.send(ApiRequest::get("slow/")).await.expect_err("Slow calls should time out.");

	assert!(matches!(err, Error::Transport(TransportError::Timeout)));
	assert_eq!(notifier.errors(), vec!["Request timed out.".to_string()]);
}

#[tokio::test]
async fn timed_out_renewal_ends_the_session_for_every_waiter() {
	let server = MockServer::start_async().await;
	let config = GatewayConfig::builder(Url::parse(&server.url("/api")).expect("URL should parse."))
		.timeout(Duration::milliseconds(300))
		.build()
		.expect("Configuration should build.");
	let session = MemorySessionStore::with_tokens(Some("access-old"), Some("refresh-1"));
	let notifier = RecordingNotifier::default();
	let navigator = RecordingNavigator::default();
	let gateway = ReqwestGateway::with_transport(
		config,
		Arc::new(session.clone()),
		ReqwestTransport::default(),
	)
	.with_notifier(Arc::new(notifier.clone()))
	.with_navigator(Arc::new(navigator.clone()));

	server
		.mock_async(|when, then| {
			when.method(GET).path("/api/orders/");
			then.status(401);
		})
		.await;

	let renewal = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/auth/refresh/");
			then.status(200)
				.json_body(json!({ "data": { "tokens": { "access": "access-new" } } }))
				.delay(std::time::Duration::from_secs(2));
		})
		.await;
	let (first, second) = tokio::join!(
		gateway.send(ApiRequest::get("orders/")),
		gateway.send(ApiRequest::get("orders/").query("page", "2")),
	);
	let first = first.expect_err("A timed-out renewal should fail the request.");
	let second = second.expect_err("A timed-out renewal should fail the request.");

	for err in [&first, &second] {
		assert!(
			matches!(err, Error::RenewalFailed { status: None, .. }),
			"Unexpected error: {err:?}."
		);
	}

	renewal.assert_calls_async(1).await;

	assert!(session.snapshot().access_token.is_none());
	assert!(session.snapshot().refresh_token.is_none());
	assert_eq!(notifier.errors(), vec![SESSION_EXPIRED.to_string()]);
	assert_eq!(navigator.redirects(), 1);
	assert!(!gateway.renewal_in_flight());
	assert_eq!(gateway.pending_requests(), 0);
}

#[tokio::test]
async fn success_toast_waits_for_typed_decode() {
	#[derive(Debug, Deserialize)]
	struct Created {
		id: u64,
	}

	let server = MockServer::start_async().await;
	let TestHarness { gateway, notifier, .. } = harness(&server, Some("access-1"), Some("refresh-1"));

	server
		.mock_async(|when, then| {
			when.method(POST).path("/api/projects/");
			then.status(201).json_body(json!({ "success": true, "message": "Project created" }));
		})
		.await;

	let err = gateway
		.send_json::<Created>(ApiRequest::post("projects/").json(json!({ "name": "ops" })))
		.await
		.expect_err("A body without `id` should not decode.");

	assert!(matches!(err, Error::Decode { status: 201, .. }));
	assert!(notifier.successes().is_empty());
	assert_eq!(notifier.errors().len(), 1);

	server
		.mock_async(|when, then| {
			when.method(POST).path("/api/projects/v2/");
			then.status(201).json_body(json!({
				"success": true,
				"message": "Project created",
				"id": 7
			}));
		})
		.await;

	let created = gateway
		.send_json::<Created>(ApiRequest::post("projects/v2/"))
		.await
		.expect("A complete body should decode.");

	assert_eq!(created.id, 7);
	assert_eq!(notifier.successes(), vec!["Project created".to_string()]);
}
