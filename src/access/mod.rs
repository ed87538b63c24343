//! Route access gating.
//!
//! Decides whether a navigation may proceed given the current session, and
//! where to send the user if not. Decisions are pure functions of the
//! session, the route class and an explicit `now`: nothing here reads the
//! system clock, so the trial window is re-evaluated on every call.
//!
//! ## Rules (evaluated in order)
//!
//! 1. `Public` routes always allow.
//! 2. Protected routes without a session redirect to login.
//! 3. `AdminOnly` routes redirect non-admins to the dashboard.
//! 4. `OrganizationProtected` routes redirect organizations with neither an
//!    active trial nor a plan to the plans page.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

use crate::models::{Role, UserSession};

const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// Access level a navigable view requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteClass {
    Public,
    OrganizationProtected,
    AdminOnly,
}

impl RouteClass {
    /// Classify an application path using the router's table.
    ///
    /// Returns None for paths the router does not know.
    pub fn for_path(path: &str) -> Option<Self> {
        let path = normalize_path(path);
        match path.as_str() {
            "/" | "/login" | "/register" | "/plans" => Some(RouteClass::Public),
            p if under(p, "/dashboard") => Some(RouteClass::OrganizationProtected),
            p if under(p, "/admin") => Some(RouteClass::AdminOnly),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RouteClass::Public => "public",
            RouteClass::OrganizationProtected => "organization_protected",
            RouteClass::AdminOnly => "admin_only",
        }
    }
}

impl fmt::Display for RouteClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Outcome of a route guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Allow,
    RedirectLogin,
    RedirectPlans,
    RedirectDashboard,
}

impl Decision {
    /// Path to navigate to instead, if this decision redirects.
    pub fn redirect_target(&self) -> Option<&'static str> {
        match self {
            Decision::Allow => None,
            Decision::RedirectLogin => Some("/login"),
            Decision::RedirectPlans => Some("/plans"),
            Decision::RedirectDashboard => Some("/dashboard"),
        }
    }

    pub fn is_allowed(&self) -> bool {
        *self == Decision::Allow
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Allow => "allow",
            Decision::RedirectLogin => "redirect_login",
            Decision::RedirectPlans => "redirect_plans",
            Decision::RedirectDashboard => "redirect_dashboard",
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Whether the session's trial window is open at `now`.
///
/// True only if the token flagged the trial as active and its expiry is strictly
/// after `now`. Missing fields mean inactive.
pub fn trial_active(session: &UserSession, now: DateTime<Utc>) -> bool {
    session.trial_active == Some(true) && session.trial_expires_at.is_some_and(|exp| exp > now)
}

/// Days left until `expires_at`, rounded up and floored at zero.
///
/// Display only: a partial day counts as a whole one, so this must never be
/// used to decide access.
pub fn days_remaining(expires_at: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let millis = (expires_at - now).num_milliseconds();
    if millis <= 0 {
        return 0;
    }
    (millis + MILLIS_PER_DAY - 1) / MILLIS_PER_DAY
}

/// Decide whether `session` may enter a route of class `route` at `now`.
pub fn decide(session: Option<&UserSession>, route: RouteClass, now: DateTime<Utc>) -> Decision {
    if route == RouteClass::Public {
        return Decision::Allow;
    }

    let Some(session) = session else {
        return Decision::RedirectLogin;
    };

    match route {
        RouteClass::AdminOnly if session.role != Role::Admin => Decision::RedirectDashboard,
        RouteClass::OrganizationProtected
            if session.role == Role::Organization
                && !trial_active(session, now)
                && !session.has_plan() =>
        {
            Decision::RedirectPlans
        }
        _ => Decision::Allow,
    }
}

/// Result of resolving a concrete path against the route table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Navigation {
    /// Path as requested
    pub path: String,
    /// Route class, or None for unknown paths
    pub route_class: Option<RouteClass>,
    /// Guard decision, or None for unknown paths
    pub decision: Option<Decision>,
    /// Where the router ends up sending the user, if not to `path`
    pub target: Option<String>,
}

impl Navigation {
    pub fn is_allowed(&self) -> bool {
        self.decision.is_some_and(|d| d.is_allowed())
    }
}

/// Resolve a navigation to `path`. Unknown paths fall through to `/`.
pub fn resolve_path(session: Option<&UserSession>, path: &str, now: DateTime<Utc>) -> Navigation {
    match RouteClass::for_path(path) {
        Some(route_class) => {
            let decision = decide(session, route_class, now);
            Navigation {
                path: path.to_string(),
                route_class: Some(route_class),
                decision: Some(decision),
                target: decision.redirect_target().map(str::to_string),
            }
        }
        None => Navigation {
            path: path.to_string(),
            route_class: None,
            decision: None,
            target: Some("/".to_string()),
        },
    }
}

fn normalize_path(path: &str) -> String {
    let path = path.split(['?', '#']).next().unwrap_or_default().trim();
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{}", trimmed)
    }
}

fn under(path: &str, prefix: &str) -> bool {
    path == prefix
        || path
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.starts_with('/'))
}
