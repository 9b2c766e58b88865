//! Best-effort JWT claim probes.
//!
//! The gateway treats credentials as opaque. When a token happens to be a compact JWT, its
//! `exp` claim lets the session store tell a dead refresh credential from a live one without a
//! network round trip. Signatures are never verified here; the backend stays authoritative.

// crates.io
use base64::{
	Engine,
	engine::general_purpose::{URL_SAFE, URL_SAFE_NO_PAD},
};
// self
use crate::_prelude::*;

#[derive(Deserialize)]
struct ExpiryClaims {
	exp: Option<i64>,
}

/// Reads the `exp` claim of a compact JWT.
///
/// Returns `None` for opaque tokens, malformed payloads, or payloads without `exp`.
pub fn expires_at(token: &str) -> Option<OffsetDateTime> {
	let mut segments = token.split('.');
	let (_header, payload, _signature) = (segments.next()?, segments.next()?, segments.next()?);

	if segments.next().is_some() {
		return None;
	}

	let bytes = URL_SAFE_NO_PAD.decode(payload).or_else(|_| URL_SAFE.decode(payload)).ok()?;
	let claims = serde_json::from_slice::<ExpiryClaims>(&bytes).ok()?;

	OffsetDateTime::from_unix_timestamp(claims.exp?).ok()
}

/// Returns `true` when `token` is a JWT whose `exp` is at or before `now`.
///
/// Opaque tokens never count as expired.
pub fn is_expired_at(token: &str, now: OffsetDateTime) -> bool {
	expires_at(token).is_some_and(|exp| exp <= now)
}
