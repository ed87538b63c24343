//! Account commands: login, register, logout, whoami, access.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;

use super::{CommandResult, Context, evaluation_time, json_string};
use crate::access::{Navigation, resolve_path};
use crate::models::{OrganizationRegistration, Role, UserSession};
use crate::session::{FileTokenStore, SessionHolder, TokenStore};
use crate::Result;

/// Session as shown to the user, with trial figures evaluated at one instant.
#[derive(Debug, Clone, Serialize)]
pub struct SessionInfo {
    pub subject_id: String,
    pub email: String,
    pub display_name: String,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan_id: Option<String>,
    pub trial_active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trial_expires_at: Option<DateTime<Utc>>,
    pub trial_days_remaining: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_expires_at: Option<DateTime<Utc>>,
}

impl SessionInfo {
    pub fn new(session: &UserSession, now: DateTime<Utc>) -> Self {
        Self {
            subject_id: session.subject_id.clone(),
            email: session.email.clone(),
            display_name: session.display_name.clone(),
            role: session.role,
            organization_id: session.organization_id.clone(),
            plan_id: session.plan_id.clone(),
            trial_active: session.trial_active(now),
            trial_expires_at: session.trial_expires_at,
            trial_days_remaining: session.trial_days_remaining(now),
            token_expires_at: session.token_expires_at,
        }
    }

    fn describe(&self) -> String {
        let name = if self.display_name.is_empty() {
            self.subject_id.as_str()
        } else {
            self.display_name.as_str()
        };
        let mut lines = vec![format!("{} <{}> ({})", name, self.email, self.role)];

        if let Some(ref plan) = self.plan_id {
            lines.push(format!("  Plan: {}", plan));
        }
        if self.trial_active {
            let days = self.trial_days_remaining;
            lines.push(format!(
                "  Trial: active, {} day{} remaining",
                days,
                if days == 1 { "" } else { "s" }
            ));
        } else if self.trial_expires_at.is_some() {
            lines.push("  Trial: ended".to_string());
        }
        if let Some(exp) = self.token_expires_at {
            lines.push(format!("  Session expires: {}", exp.format("%Y-%m-%d %H:%M UTC")));
        }
        lines.join("\n")
    }
}

// === login / register ===

#[derive(Debug, Serialize)]
pub struct LoginResult {
    pub registered: bool,
    pub session: SessionInfo,
    pub token_file: PathBuf,
}

impl CommandResult for LoginResult {
    fn to_json(&self) -> String {
        json_string(self)
    }

    fn to_human(&self) -> String {
        let verb = if self.registered {
            "Registered and logged in as"
        } else {
            "Logged in as"
        };
        format!("{} {}", verb, self.session.describe())
    }
}

/// Log in and persist the issued token.
///
/// The role is fixed by the endpoint used, regardless of the token's role claim.
pub fn login(ctx: &Context, email: &str, password: &str, admin: bool) -> Result<LoginResult> {
    let client = ctx.client(None);
    let (token, role) = if admin {
        (client.admin_login(email, password)?, Role::Admin)
    } else {
        (client.login(email, password)?, Role::Organization)
    };
    establish(ctx, &token, role, false)
}

/// Register an organization on a fresh trial and log it in.
pub fn register(ctx: &Context, name: &str, email: &str, password: &str) -> Result<LoginResult> {
    let registration = OrganizationRegistration::new_trial(name, email, password, ctx.now);
    let client = ctx.client(None);
    client.register_organization(&registration)?;
    info!(%email, "organization registered");

    let token = client.login(email, password)?;
    establish(ctx, &token, Role::Organization, true)
}

fn establish(ctx: &Context, token: &str, role: Role, registered: bool) -> Result<LoginResult> {
    let mut holder = SessionHolder::new(FileTokenStore::new(ctx.config.token_file()));
    let session = holder.establish(token, Some(role))?;
    info!(subject = %session.subject_id, %role, "session established");

    Ok(LoginResult {
        registered,
        session: SessionInfo::new(session, ctx.now),
        token_file: holder.store().path().to_path_buf(),
    })
}

// === logout ===

#[derive(Debug, Serialize)]
pub struct LogoutResult {
    pub was_logged_in: bool,
}

impl CommandResult for LogoutResult {
    fn to_json(&self) -> String {
        json_string(self)
    }

    fn to_human(&self) -> String {
        if self.was_logged_in {
            "Logged out.".to_string()
        } else {
            "Not logged in.".to_string()
        }
    }
}

/// Remove the stored token, valid or not.
pub fn logout(ctx: &Context) -> Result<LogoutResult> {
    let store = FileTokenStore::new(ctx.config.token_file());
    let was_logged_in = store.load()?.is_some();
    SessionHolder::new(store).logout()?;
    Ok(LogoutResult { was_logged_in })
}

// === whoami ===

#[derive(Debug, Serialize)]
pub struct WhoamiResult {
    pub authenticated: bool,
    pub at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session: Option<SessionInfo>,
}

impl CommandResult for WhoamiResult {
    fn to_json(&self) -> String {
        json_string(self)
    }

    fn to_human(&self) -> String {
        match &self.session {
            Some(session) => session.describe(),
            None => "Not logged in.".to_string(),
        }
    }
}

/// Show the stored session evaluated at `at` (default: now).
pub fn whoami(ctx: &Context, at: Option<&str>) -> Result<WhoamiResult> {
    let at = evaluation_time(at, ctx.now)?;
    let holder = ctx.restore_session()?;
    let session = holder.session().filter(|s| !s.token_expired(at));

    Ok(WhoamiResult {
        authenticated: session.is_some(),
        at,
        session: session.map(|s| SessionInfo::new(s, at)),
    })
}

// === access ===

#[derive(Debug, Serialize)]
pub struct AccessResult {
    pub authenticated: bool,
    pub allowed: bool,
    #[serde(flatten)]
    pub navigation: Navigation,
}

impl CommandResult for AccessResult {
    fn to_json(&self) -> String {
        json_string(self)
    }

    fn to_human(&self) -> String {
        let nav = &self.navigation;
        match (nav.route_class, nav.decision) {
            (Some(class), Some(decision)) if decision.is_allowed() => {
                format!("{}: allowed ({})", nav.path, class)
            }
            (Some(class), Some(decision)) => format!(
                "{}: {} ({}) -> {}",
                nav.path,
                decision,
                class,
                nav.target.as_deref().unwrap_or("/")
            ),
            _ => format!(
                "{}: unknown route -> {}",
                nav.path,
                nav.target.as_deref().unwrap_or("/")
            ),
        }
    }
}

/// Decide whether the stored session may open `path` at `at` (default: now).
pub fn access(ctx: &Context, path: &str, at: Option<&str>) -> Result<AccessResult> {
    let at = evaluation_time(at, ctx.now)?;
    let holder = ctx.restore_session()?;
    let session = holder.session().filter(|s| !s.token_expired(at));
    let navigation = resolve_path(session, path, at);

    Ok(AccessResult {
        authenticated: session.is_some(),
        allowed: navigation.is_allowed(),
        navigation,
    })
}
