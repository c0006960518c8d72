use chrono::{DateTime, Utc};
use jsonwebtoken::{DecodingKey, Validation, decode};
use serde::Deserialize;

/// Claims
///
/// The subset of JWT claims the client cares about. The client never holds the signing
/// secret, so only the payload is read; the backend stays the authority on validity.
#[derive(Debug, Deserialize)]
pub struct Claims {
    /// Subject: the username the token was issued for.
    #[serde(default)]
    pub sub: Option<String>,
    /// Expiration Time (seconds since the epoch).
    #[serde(default)]
    pub exp: Option<i64>,
}

/// read_claims
///
/// Decodes the payload of a JWT without verifying its signature. Returns `None` for
/// opaque (non-JWT) tokens.
pub fn read_claims(token: &str) -> Option<Claims> {
    let mut validation = Validation::default();
    validation.insecure_disable_signature_validation();
    // Expiry is checked by the caller against its own clock, without leeway.
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    decode::<Claims>(token, &DecodingKey::from_secret(&[]), &validation)
        .ok()
        .map(|data| data.claims)
}

/// When the token stops being accepted, if it says so.
pub fn expires_at(token: &str) -> Option<DateTime<Utc>> {
    read_claims(token)
        .and_then(|claims| claims.exp)
        .and_then(|exp| DateTime::from_timestamp(exp, 0))
}

/// is_expired
///
/// True only for a JWT whose `exp` lies at or before `now`. Opaque tokens and JWTs
/// without `exp` are never considered expired here.
pub fn is_expired(token: &str, now: DateTime<Utc>) -> bool {
    expires_at(token).is_some_and(|exp| exp <= now)
}
