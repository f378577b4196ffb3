//! Request signing for the Pusher Channels HTTP API.
//!
//! The signed string is `METHOD\nPATH\nQUERY` where `QUERY` holds the `auth_*` and `body_md5`
//! parameters sorted by key. The signature is the hex HMAC-SHA256 of that string keyed with
//! the app secret.

use crate::{TransportError, TransportResult};
use hmac::{Hmac, Mac};
use md5::{Digest, Md5};
use sha2::Sha256;

pub(crate) const AUTH_VERSION: &str = "1.0";

pub(crate) fn body_md5(body: &[u8]) -> String {
    hex::encode(Md5::digest(body))
}

pub(crate) fn hmac_sha256_hex(secret: &str, message: &str) -> TransportResult<String> {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
        .map_err(|e| TransportError::Signing(e.to_string()))?;
    mac.update(message.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Returns the full query (sorted, signature last) for a signed request.
pub(crate) fn signed_query(
    key: &str,
    secret: &str,
    method: &str,
    path: &str,
    body: &[u8],
    timestamp: i64,
) -> TransportResult<Vec<(&'static str, String)>> {
    let mut params = vec![
        ("auth_key", key.to_string()),
        ("auth_timestamp", timestamp.to_string()),
        ("auth_version", AUTH_VERSION.to_string()),
        ("body_md5", body_md5(body)),
    ];
    params.sort_by(|a, b| a.0.cmp(b.0));

    let query = params
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");
    let to_sign = format!("{method}\n{path}\n{query}");

    params.push(("auth_signature", hmac_sha256_hex(secret, &to_sign)?));
    Ok(params)
}
