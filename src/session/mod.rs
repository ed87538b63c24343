//! Session lifecycle.
//!
//! A [`SessionHolder`] owns the single session of a running client and the
//! store its token is persisted in. Route guards never look the session up
//! globally; callers pass `holder.session()` into [`crate::access::decide`].
//!
//! Lifecycle:
//! - `restore` at startup: load the persisted token, keep it only if it decodes
//!   and its own expiry is in the future, otherwise discard it silently
//! - `establish` after login or registration: persist the new token
//! - `logout`: forget the session and remove the persisted token

pub mod store;
pub mod token;

pub use store::{FileTokenStore, MemoryTokenStore, TokenStore};
pub use token::{Claims, decode_claims, decode_session, encode_unsigned, parse_timestamp};

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::Result;
use crate::models::{Role, UserSession};

/// Owns the current session and its persisted token.
pub struct SessionHolder<S: TokenStore> {
    store: S,
    token: Option<String>,
    session: Option<UserSession>,
}

impl<S: TokenStore> SessionHolder<S> {
    /// Create a holder with no session. Call [`restore`](Self::restore) to rehydrate.
    pub fn new(store: S) -> Self {
        Self {
            store,
            token: None,
            session: None,
        }
    }

    /// Rehydrate from the persisted token.
    ///
    /// Malformed or expired tokens are removed from the store and yield no
    /// session; no error is surfaced for them. Only storage failures are errors.
    pub fn restore(&mut self, now: DateTime<Utc>) -> Result<Option<&UserSession>> {
        self.token = None;
        self.session = None;

        let Some(token) = self.store.load()? else {
            debug!("no persisted token");
            return Ok(None);
        };

        match decode_session(&token, None) {
            Ok(session) if !session.token_expired(now) => {
                debug!(subject = %session.subject_id, role = %session.role, "session restored");
                self.token = Some(token);
                self.session = Some(session);
            }
            Ok(session) => {
                info!(subject = %session.subject_id, "persisted token expired, discarding");
                self.store.clear()?;
            }
            Err(e) => {
                warn!(error = %e, "persisted token unreadable, discarding");
                self.store.clear()?;
            }
        }

        Ok(self.session.as_ref())
    }

    /// Adopt a freshly issued token, persisting it.
    ///
    /// `role` overrides the role claim, matching the endpoint that issued the
    /// token. A token that does not decode is rejected and nothing changes.
    pub fn establish(&mut self, token: &str, role: Option<Role>) -> Result<&UserSession> {
        let session = decode_session(token, role)?;
        self.store.save(token)?;
        self.token = Some(token.to_string());
        Ok(self.session.insert(session))
    }

    /// Forget the session and remove the persisted token.
    pub fn logout(&mut self) -> Result<()> {
        self.token = None;
        self.session = None;
        self.store.clear()
    }

    /// Drop the session if its token has expired at `now`.
    ///
    /// Returns true if a session was dropped.
    pub fn expire_if_needed(&mut self, now: DateTime<Utc>) -> Result<bool> {
        match &self.session {
            Some(session) if session.token_expired(now) => {
                info!(subject = %session.subject_id, "token expired, ending session");
                self.logout()?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    pub fn session(&self) -> Option<&UserSession> {
        self.session.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_some()
    }

    /// Raw token for the `Authorization: Bearer` header.
    pub fn bearer(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use serde_json::json;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 5, 1, 8, 0, 0).unwrap()
    }

    fn token_expiring_at(exp: DateTime<Utc>) -> String {
        encode_unsigned(&json!({
            "sub": "42",
            "email": "org@example.com",
            "name": "Haras Sol",
            "role": "organization",
            "exp": exp.timestamp()
        }))
    }

    #[test]
    fn test_restore_valid_token() {
        let token = token_expiring_at(now() + Duration::hours(1));
        let mut holder = SessionHolder::new(MemoryTokenStore::with_token(token.clone()));

        let session = holder.restore(now()).unwrap().cloned().unwrap();
        assert_eq!(session.subject_id, "42");
        assert_eq!(holder.bearer(), Some(token.as_str()));
        assert!(holder.is_authenticated());
    }

    #[test]
    fn test_restore_expired_token_discards_it() {
        let token = token_expiring_at(now() - Duration::seconds(1));
        let mut holder = SessionHolder::new(MemoryTokenStore::with_token(token));

        assert!(holder.restore(now()).unwrap().is_none());
        assert!(holder.store().load().unwrap().is_none());
        assert!(holder.bearer().is_none());
    }

    #[test]
    fn test_restore_token_expiring_now_is_expired() {
        let token = token_expiring_at(now());
        let mut holder = SessionHolder::new(MemoryTokenStore::with_token(token));
        assert!(holder.restore(now()).unwrap().is_none());
    }

    #[test]
    fn test_restore_malformed_token_is_silent() {
        let mut holder = SessionHolder::new(MemoryTokenStore::with_token("garbage"));
        assert!(holder.restore(now()).unwrap().is_none());
        assert!(holder.store().load().unwrap().is_none());
    }

    #[test]
    fn test_restore_keeps_session_with_unreadable_trial_date() {
        let token = encode_unsigned(&json!({
            "sub": "42",
            "role": "organization",
            "plan_id": "gold",
            "trial_expiration_date": "not-a-date",
            "exp": (now() + Duration::hours(1)).timestamp()
        }));
        let mut holder = SessionHolder::new(MemoryTokenStore::with_token(token));

        let session = holder.restore(now()).unwrap().cloned().unwrap();
        assert_eq!(session.plan_id.as_deref(), Some("gold"));
        assert!(!session.trial_active(now()));
        assert!(holder.store().load().unwrap().is_some());
    }

    #[test]
    fn test_restore_token_without_exp_is_discarded() {
        let token = encode_unsigned(&json!({"sub": "42"}));
        let mut holder = SessionHolder::new(MemoryTokenStore::with_token(token));
        assert!(holder.restore(now()).unwrap().is_none());
    }

    #[test]
    fn test_establish_and_logout() {
        let mut holder = SessionHolder::new(MemoryTokenStore::new());
        let token = token_expiring_at(now() + Duration::hours(1));

        let session = holder.establish(&token, Some(Role::Admin)).unwrap();
        assert!(session.is_admin());
        assert_eq!(
            holder.store().load().unwrap().as_deref(),
            Some(token.as_str())
        );

        holder.logout().unwrap();
        assert!(holder.session().is_none());
        assert!(holder.store().load().unwrap().is_none());
    }

    #[test]
    fn test_establish_rejects_bad_token_without_side_effects() {
        let good = token_expiring_at(now() + Duration::hours(1));
        let mut holder = SessionHolder::new(MemoryTokenStore::new());
        holder.establish(&good, None).unwrap();

        assert!(holder.establish("bad", None).is_err());
        assert_eq!(holder.bearer(), Some(good.as_str()));
        assert_eq!(
            holder.store().load().unwrap().as_deref(),
            Some(good.as_str())
        );
    }

    #[test]
    fn test_expire_if_needed() {
        let token = token_expiring_at(now() + Duration::minutes(10));
        let mut holder = SessionHolder::new(MemoryTokenStore::new());
        holder.establish(&token, None).unwrap();

        assert!(!holder.expire_if_needed(now()).unwrap());
        assert!(holder.is_authenticated());
        assert!(
            holder
                .expire_if_needed(now() + Duration::minutes(11))
                .unwrap()
        );
        assert!(!holder.is_authenticated());
        assert!(holder.store().load().unwrap().is_none());
    }
}
