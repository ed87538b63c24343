//! Account-level models: sessions, organizations and subscription plans.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

use super::{de_id, de_opt_id};

/// Length of the free trial granted at registration.
pub const TRIAL_PERIOD_DAYS: i64 = 14;

/// Plan assigned to newly registered organizations.
pub const DEFAULT_PLAN_ID: &str = "basic";

/// Kind of account a session belongs to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Breeding organization (tenant). Also the fallback for unknown roles.
    #[default]
    Organization,
    /// SaaS administrator
    Admin,
}

impl Role {
    /// Parse a role claim. Anything that is not an admin label is an organization.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "admin" | "administrator" => Role::Admin,
            _ => Role::Organization,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Organization => "organization",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl<'de> Deserialize<'de> for Role {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = Option::<String>::deserialize(deserializer)?;
        Ok(label.as_deref().map(Role::parse).unwrap_or_default())
    }
}

/// The signed-in user, derived from a token and never mutated by the UI.
///
/// A session is replaced wholesale on login, rehydration or logout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserSession {
    pub subject_id: String,
    pub email: String,
    pub display_name: String,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trial_active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trial_expires_at: Option<DateTime<Utc>>,
    /// Expiry of the token itself (the `exp` claim)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_expires_at: Option<DateTime<Utc>>,
}

impl UserSession {
    /// Create a session with only the identity fields set.
    pub fn new(
        subject_id: impl Into<String>,
        email: impl Into<String>,
        display_name: impl Into<String>,
        role: Role,
    ) -> Self {
        Self {
            subject_id: subject_id.into(),
            email: email.into(),
            display_name: display_name.into(),
            role,
            organization_id: None,
            plan_id: None,
            trial_active: None,
            trial_expires_at: None,
            token_expires_at: None,
        }
    }

    /// Set the trial fields.
    pub fn with_trial(mut self, active: bool, expires_at: DateTime<Utc>) -> Self {
        self.trial_active = Some(active);
        self.trial_expires_at = Some(expires_at);
        self
    }

    /// Set the subscription plan.
    pub fn with_plan(mut self, plan_id: impl Into<String>) -> Self {
        self.plan_id = Some(plan_id.into());
        self
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Whether a paid plan is attached. Blank plan ids count as no plan.
    pub fn has_plan(&self) -> bool {
        self.plan_id.as_deref().is_some_and(|p| !p.trim().is_empty())
    }

    /// Whether the trial window is open at `now`.
    pub fn trial_active(&self, now: DateTime<Utc>) -> bool {
        crate::access::trial_active(self, now)
    }

    /// Whole days left in the trial, for display only. Zero once the trial is over.
    pub fn trial_days_remaining(&self, now: DateTime<Utc>) -> i64 {
        match self.trial_expires_at {
            Some(expires_at) if self.trial_active(now) => {
                crate::access::days_remaining(expires_at, now)
            }
            _ => 0,
        }
    }

    /// Whether the token this session came from has expired at `now`.
    ///
    /// A token without an expiry is treated as expired.
    pub fn token_expired(&self, now: DateTime<Utc>) -> bool {
        self.token_expires_at.is_none_or(|exp| exp <= now)
    }
}

/// A subscription plan offered to organizations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionPlan {
    #[serde(deserialize_with = "de_id")]
    pub id: String,
    pub name: String,
    pub price: f64,
    pub animal_limit: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub features: Vec<String>,
}

impl SubscriptionPlan {
    /// Whether an organization holding `current` animals may register another.
    pub fn allows_more_animals(&self, current: u32) -> bool {
        current < self.animal_limit
    }

    /// Price rendered in the product's currency.
    pub fn formatted_price(&self) -> String {
        format!("R$ {:.2}", self.price)
    }
}

/// Subscription state of an organization.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionStatus {
    Active,
    Inactive,
    #[default]
    Pending,
}

impl SubscriptionStatus {
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "active" | "ativa" => SubscriptionStatus::Active,
            "inactive" | "inativa" => SubscriptionStatus::Inactive,
            _ => SubscriptionStatus::Pending,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::Inactive => "inactive",
            SubscriptionStatus::Pending => "pending",
        }
    }
}

impl fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl<'de> Deserialize<'de> for SubscriptionStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = Option::<String>::deserialize(deserializer)?;
        Ok(label
            .as_deref()
            .map(SubscriptionStatus::parse)
            .unwrap_or_default())
    }
}

/// A tenant organization, as listed in the admin console.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Organization {
    #[serde(deserialize_with = "de_id")]
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cnpj: Option<String>,
    #[serde(
        default,
        deserialize_with = "de_opt_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub subscription_plan_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subscription_date: Option<NaiveDate>,
    #[serde(default)]
    pub subscription_status: SubscriptionStatus,
}

impl Organization {
    pub fn subscription_active(&self) -> bool {
        self.subscription_status == SubscriptionStatus::Active
    }
}

/// Body of the organization registration request.
#[derive(Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationRegistration {
    pub name: String,
    pub email: String,
    pub password: String,
    pub plan_id: String,
    pub is_trial_active: bool,
    pub trial_expiration_date: DateTime<Utc>,
}

impl OrganizationRegistration {
    /// Registration on the default plan with a fresh trial starting at `now`.
    pub fn new_trial(
        name: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            password: password.into(),
            plan_id: DEFAULT_PLAN_ID.to_string(),
            is_trial_active: true,
            trial_expiration_date: now + Duration::days(TRIAL_PERIOD_DAYS),
        }
    }
}

impl fmt::Debug for OrganizationRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OrganizationRegistration")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("plan_id", &self.plan_id)
            .field("is_trial_active", &self.is_trial_active)
            .field("trial_expiration_date", &self.trial_expiration_date)
            .finish()
    }
}
