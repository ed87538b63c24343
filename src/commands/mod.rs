//! Command implementations for the studbook CLI.
//!
//! This module contains the logic behind each CLI command. Commands are
//! organized by concern:
//! - `account` - login, register, logout, whoami, access checks
//! - `pedigree` - building and drawing ancestry trees
//! - `registry` - animals, plans and organizations
//! - `settings` - resolved configuration
//!
//! Every command returns a value implementing [`CommandResult`]; `main` picks
//! JSON or human output.

mod account;
mod pedigree;
mod registry;
mod settings;

pub use account::{
    AccessResult, LoginResult, LogoutResult, SessionInfo, WhoamiResult, access, login, logout,
    register, whoami,
};
pub use pedigree::{TreeResult, TreeSource, tree};
pub use registry::{
    AnimalDetail, AnimalList, OrganizationList, PlanList, animals_list, animals_show, orgs_list,
    plans_list,
};
pub use settings::{ConfigShow, SourcedValue, config_show};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::access::resolve_path;
use crate::api::ApiClient;
use crate::config::ResolvedConfig;
use crate::session::{FileTokenStore, SessionHolder, parse_timestamp};
use crate::{Error, Result};

/// Command results that can be serialized to JSON or formatted for humans.
pub trait CommandResult {
    /// Serialize to JSON string.
    fn to_json(&self) -> String;

    /// Format for human-readable output.
    fn to_human(&self) -> String;
}

/// Everything a command needs from its environment.
#[derive(Debug, Clone)]
pub struct Context {
    pub config: ResolvedConfig,
    /// Clock reading taken once per invocation
    pub now: DateTime<Utc>,
}

impl Context {
    pub fn new(config: ResolvedConfig, now: DateTime<Utc>) -> Self {
        Self { config, now }
    }

    /// Session holder backed by the configured token file, restored at `now`.
    pub fn restore_session(&self) -> Result<SessionHolder<FileTokenStore>> {
        let mut holder = SessionHolder::new(FileTokenStore::new(self.config.token_file()));
        holder.restore(self.now)?;
        Ok(holder)
    }

    /// API client carrying `bearer`, if any.
    pub fn client(&self, bearer: Option<&str>) -> ApiClient {
        ApiClient::new(self.config.api_url(), self.config.timeout()).with_bearer(bearer)
    }

    /// Restore the session and check it may open `path`; returns an
    /// authorized client on success.
    pub fn authorized_client(&self, path: &str) -> Result<ApiClient> {
        let holder = self.restore_session()?;
        let navigation = resolve_path(holder.session(), path, self.now);
        if !navigation.is_allowed() {
            return Err(Error::AccessDenied {
                path: path.to_string(),
                target: navigation.target.unwrap_or_else(|| "/".to_string()),
            });
        }
        Ok(self.client(holder.bearer()))
    }
}

/// Parse a `--at` value, falling back to `now`.
pub fn evaluation_time(at: Option<&str>, now: DateTime<Utc>) -> Result<DateTime<Utc>> {
    match at {
        None => Ok(now),
        Some(s) => parse_timestamp(s).ok_or_else(|| {
            Error::InvalidInput(format!(
                "Invalid time '{}': expected RFC 3339 or YYYY-MM-DD",
                s
            ))
        }),
    }
}

pub(crate) fn json_string<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|e| format!(r#"{{"error": "{}"}}"#, e))
}
