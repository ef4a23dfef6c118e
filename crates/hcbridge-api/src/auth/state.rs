// OAuth `state` parameter signing and verification.
//
// The state carries the issue timestamp and an HMAC-SHA256 over
// {timestamp, client id, client secret}, keyed by the client secret.
// The whole value is base64url encoded so it survives the redirect.
// Verification fails closed on any missing or malformed part.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;

use crate::error::Error;

type HmacSha256 = Hmac<Sha256>;

/// Maximum age of a state value accepted on the callback.
pub const STATE_MAX_AGE_MS: i64 = 10 * 60 * 1000;

/// Produce a signed state value for an authorization redirect issued at `now_ms`.
pub fn generate_state(
    client_id: &str,
    client_secret: &SecretString,
    now_ms: i64,
) -> Result<String, Error> {
    let mac = signature_for(now_ms, client_id, client_secret)?;
    let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());
    Ok(URL_SAFE_NO_PAD.encode(format!("{now_ms}:{signature}")))
}

/// Check a state value returned on the callback.
///
/// Rejects values that do not decode, lack a timestamp, are older than
/// [`STATE_MAX_AGE_MS`] (or from the future), or carry a bad signature.
pub fn verify_state(
    state: &str,
    client_id: &str,
    client_secret: &SecretString,
    now_ms: i64,
) -> Result<(), Error> {
    let decoded = URL_SAFE_NO_PAD
        .decode(state.trim())
        .map_err(|_| invalid("state is not valid base64"))?;
    let text = String::from_utf8(decoded).map_err(|_| invalid("state is not valid UTF-8"))?;

    let (timestamp, signature) = text
        .split_once(':')
        .ok_or_else(|| invalid("state has no timestamp"))?;
    let issued_at: i64 = timestamp
        .parse()
        .map_err(|_| invalid("state timestamp is malformed"))?;

    let age = now_ms
        .checked_sub(issued_at)
        .ok_or_else(|| invalid("state timestamp is malformed"))?;
    if age < 0 {
        return Err(invalid("state timestamp is in the future"));
    }
    if age > STATE_MAX_AGE_MS {
        return Err(invalid(&format!("state expired {age}ms after issue")));
    }

    let signature = URL_SAFE_NO_PAD
        .decode(signature)
        .map_err(|_| invalid("state signature is not valid base64"))?;

    signature_for(issued_at, client_id, client_secret)?
        .verify_slice(&signature)
        .map_err(|_| invalid("state signature mismatch"))
}

fn signature_for(
    issued_at: i64,
    client_id: &str,
    client_secret: &SecretString,
) -> Result<HmacSha256, Error> {
    let secret = client_secret.expose_secret();
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| invalid(&format!("cannot key state signature: {e}")))?;
    mac.update(issued_at.to_string().as_bytes());
    mac.update(b":");
    mac.update(client_id.as_bytes());
    mac.update(b":");
    mac.update(secret.as_bytes());
    Ok(mac)
}

fn invalid(reason: &str) -> Error {
    Error::InvalidState {
        reason: reason.to_owned(),
    }
}
