//! Data models for studbook entities.
//!
//! This module defines the core data structures:
//! - `Animal` - A registered individual with optional sire/dam links
//! - `AncestorRecord` - A flat ancestry entry pointing at its direct descendant
//! - `FocalAnimal` - The individual whose pedigree is being built
//! - `AncestryPayload` - Focal animal plus its flat ancestor list, as served by the API
//!
//! Account-level types (sessions, organizations, plans) live in [`account`];
//! pedigree tree construction lives in [`pedigree`].

pub mod account;
pub mod pedigree;

pub use account::{
    DEFAULT_PLAN_ID, Organization, OrganizationRegistration, Role, SubscriptionPlan,
    SubscriptionStatus, TRIAL_PERIOD_DAYS, UserSession,
};
pub use pedigree::{
    AncestryTreeBuilder, BuildReport, CycleWarning, MAX_GENERATIONS, PedigreeTree, TreeNode,
    build_tree,
};

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Biological sex as recorded for an individual.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    Male,
    Female,
    #[default]
    Unknown,
}

impl Sex {
    /// Parse from any of the labels the API has used, case-insensitive.
    ///
    /// Unrecognized labels map to `Unknown` rather than failing.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "male" | "m" | "macho" => Sex::Male,
            "female" | "f" | "fêmea" | "femea" => Sex::Female,
            _ => Sex::Unknown,
        }
    }

    /// Convert to string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Sex::Male => "male",
            Sex::Female => "female",
            Sex::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl<'de> Deserialize<'de> for Sex {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = Option::<String>::deserialize(deserializer)?;
        Ok(label.as_deref().map(Sex::parse).unwrap_or_default())
    }
}

/// Identifiers arrive as strings from the mock API and as integers from the
/// backend's relational ids. Both are normalized to strings.
#[derive(Deserialize)]
#[serde(untagged)]
enum WireId {
    Text(String),
    Number(i64),
}

impl From<WireId> for String {
    fn from(id: WireId) -> Self {
        match id {
            WireId::Text(s) => s,
            WireId::Number(n) => n.to_string(),
        }
    }
}

pub(crate) fn de_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    WireId::deserialize(deserializer).map(String::from)
}

pub(crate) fn de_opt_id<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    Ok(Option::<WireId>::deserialize(deserializer)?
        .map(String::from)
        .filter(|s| !s.is_empty()))
}

/// One flat ancestry entry: an individual and the descendant it is a direct parent of.
///
/// Records carry no sire/dam slot, so grouping is purely by `descendant_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AncestorRecord {
    /// Unique identifier of this individual
    #[serde(deserialize_with = "de_id")]
    pub id: String,

    /// Name shown on the tree
    #[serde(alias = "name")]
    pub display_name: String,

    #[serde(default, alias = "gender")]
    pub sex: Sex,

    /// The individual this record is a parent of (None only for a root)
    #[serde(
        default,
        alias = "parentId",
        deserialize_with = "de_opt_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub descendant_id: Option<String>,

    /// Opaque portrait reference
    #[serde(default, alias = "imageUrl", skip_serializing_if = "Option::is_none")]
    pub image_ref: Option<String>,
}

impl AncestorRecord {
    /// Create a record that is a direct parent of `descendant_id`.
    pub fn new(
        id: impl Into<String>,
        display_name: impl Into<String>,
        sex: Sex,
        descendant_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            sex,
            descendant_id: Some(descendant_id.into()),
            image_ref: None,
        }
    }

    /// Attach a portrait reference.
    pub fn with_image(mut self, image_ref: impl Into<String>) -> Self {
        self.image_ref = Some(image_ref.into());
        self
    }
}

/// The individual at the root of a pedigree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FocalAnimal {
    #[serde(deserialize_with = "de_id")]
    pub id: String,

    #[serde(alias = "name")]
    pub display_name: String,

    #[serde(default, alias = "gender")]
    pub sex: Sex,
}

impl FocalAnimal {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>, sex: Sex) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            sex,
        }
    }
}

impl From<&Animal> for FocalAnimal {
    fn from(animal: &Animal) -> Self {
        Self {
            id: animal.id.clone(),
            display_name: animal.name.clone(),
            sex: animal.sex,
        }
    }
}

/// Response body of the ancestry endpoint, also accepted as an offline input file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AncestryPayload {
    pub animal: FocalAnimal,
    #[serde(default)]
    pub ancestors: Vec<AncestorRecord>,
}

impl AncestryPayload {
    /// Build the pedigree tree for this payload.
    pub fn build(&self) -> PedigreeTree {
        build_tree(&self.animal, &self.ancestors)
    }
}

/// A registered animal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Animal {
    #[serde(deserialize_with = "de_id")]
    pub id: String,

    pub name: String,

    #[serde(default)]
    pub species: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub breed: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<NaiveDate>,

    #[serde(default, alias = "gender")]
    pub sex: Sex,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,

    /// Sire
    #[serde(
        default,
        deserialize_with = "de_opt_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub father_id: Option<String>,

    /// Dam
    #[serde(
        default,
        deserialize_with = "de_opt_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub mother_id: Option<String>,
}

impl Animal {
    /// Whether at least one parent is registered.
    pub fn has_parents(&self) -> bool {
        self.father_id.is_some() || self.mother_id.is_some()
    }

    /// Whether both parents are registered.
    pub fn has_full_lineage(&self) -> bool {
        self.father_id.is_some() && self.mother_id.is_some()
    }

    /// Age in whole 365-day years, or None if the birth date is unknown or in the future.
    pub fn age_years(&self, today: NaiveDate) -> Option<u32> {
        let days = (today - self.birth_date?).num_days();
        if days < 0 {
            return None;
        }
        u32::try_from(days / 365).ok()
    }
}
