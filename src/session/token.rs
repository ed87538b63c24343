//! Signed token decoding.
//!
//! Tokens are three dot-separated base64url segments (`header.payload.signature`).
//! Only the payload is read: the API server verifies signatures, the client just
//! needs the claims to build a [`UserSession`].

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer};
use tracing::warn;

use crate::models::{Role, UserSession, de_opt_id};
use crate::{Error, Result};

/// Claims carried in the token payload.
#[derive(Debug, Clone, Deserialize)]
pub struct Claims {
    #[serde(default, deserialize_with = "de_opt_id")]
    pub sub: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(default, deserialize_with = "de_opt_id")]
    pub organization_id: Option<String>,
    #[serde(default, deserialize_with = "de_opt_id")]
    pub plan_id: Option<String>,
    #[serde(default)]
    pub is_trial_active: Option<bool>,
    #[serde(default, deserialize_with = "de_opt_timestamp")]
    pub trial_expiration_date: Option<DateTime<Utc>>,
    /// Token expiry, seconds since the Unix epoch
    #[serde(default)]
    pub exp: Option<i64>,
}

impl Claims {
    /// Token expiry as a timestamp.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.exp.and_then(|secs| DateTime::from_timestamp(secs, 0))
    }

    /// Convert to a session. `role_override` wins over the role claim.
    pub fn into_session(self, role_override: Option<Role>) -> Result<UserSession> {
        let expires_at = self.expires_at();
        let subject_id = self
            .sub
            .ok_or_else(|| Error::InvalidToken("missing `sub` claim".to_string()))?;
        let role = role_override.or(self.role).unwrap_or_default();

        Ok(UserSession {
            subject_id,
            email: self.email.unwrap_or_default(),
            display_name: self.name.unwrap_or_default(),
            role,
            organization_id: self.organization_id,
            plan_id: self.plan_id,
            trial_active: self.is_trial_active,
            trial_expires_at: self.trial_expiration_date,
            token_expires_at: expires_at,
        })
    }
}

/// Decode the claims of a token without verifying its signature.
pub fn decode_claims(token: &str) -> Result<Claims> {
    let mut segments = token.trim().split('.');
    let (Some(_header), Some(payload), Some(_signature), None) = (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) else {
        return Err(Error::InvalidToken(
            "expected three dot-separated segments".to_string(),
        ));
    };

    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|e| Error::InvalidToken(format!("payload is not base64url: {}", e)))?;

    serde_json::from_slice(&bytes)
        .map_err(|e| Error::InvalidToken(format!("payload is not valid claims JSON: {}", e)))
}

/// Decode a token straight into a session.
pub fn decode_session(token: &str, role_override: Option<Role>) -> Result<UserSession> {
    decode_claims(token)?.into_session(role_override)
}

/// Parse the timestamp formats seen in `trial_expiration_date`.
///
/// Accepts RFC 3339, zone-less ISO date-times (taken as UTC) and plain dates
/// (midnight UTC).
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Trial expiry that is not a recognizable timestamp decodes as no expiry.
fn de_opt_timestamp<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Option<DateTime<Utc>>, D::Error> {
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    let parsed = match &raw {
        None | Some(serde_json::Value::Null) => return Ok(None),
        Some(serde_json::Value::String(s)) if s.trim().is_empty() => return Ok(None),
        Some(serde_json::Value::String(s)) => parse_timestamp(s),
        Some(_) => None,
    };
    if parsed.is_none() {
        warn!(value = ?raw, "unreadable trial expiration date ignored");
    }
    Ok(parsed)
}

/// Assemble an unsigned token around a JSON payload.
///
/// Used to fabricate sessions in tests and offline tooling; the server never
/// accepts these.
pub fn encode_unsigned(payload: &serde_json::Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none","typ":"JWT"}"#);
    let body = URL_SAFE_NO_PAD.encode(payload.to_string());
    format!("{}.{}.", header, body)
}
