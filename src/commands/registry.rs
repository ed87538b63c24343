//! Registry listings: animals, plans, organizations.

use chrono::NaiveDate;
use serde::Serialize;

use super::{CommandResult, Context, json_string};
use crate::models::{Animal, Organization, SubscriptionPlan};
use crate::Result;

// === animals ===

#[derive(Debug, Serialize)]
pub struct AnimalList {
    pub count: usize,
    pub animals: Vec<Animal>,
}

impl CommandResult for AnimalList {
    fn to_json(&self) -> String {
        json_string(self)
    }

    fn to_human(&self) -> String {
        if self.animals.is_empty() {
            return "No animals registered.".to_string();
        }
        let mut lines = vec![format!("{} animal(s):", self.count)];
        for animal in &self.animals {
            let breed = animal.breed.as_deref().unwrap_or("-");
            lines.push(format!(
                "  [{}] {} - {} / {} ({})",
                animal.id, animal.name, animal.species, breed, animal.sex
            ));
        }
        lines.join("\n")
    }
}

/// List the organization's animals.
pub fn animals_list(ctx: &Context) -> Result<AnimalList> {
    let client = ctx.authorized_client("/dashboard/animals")?;
    let animals = client.list_animals()?;
    Ok(AnimalList {
        count: animals.len(),
        animals,
    })
}

#[derive(Debug, Serialize)]
pub struct AnimalDetail {
    #[serde(flatten)]
    pub animal: Animal,
    pub age_years: Option<u32>,
}

impl CommandResult for AnimalDetail {
    fn to_json(&self) -> String {
        json_string(self)
    }

    fn to_human(&self) -> String {
        let a = &self.animal;
        let mut lines = vec![
            format!("{} [{}]", a.name, a.id),
            format!("  Species: {}", a.species),
            format!("  Breed:   {}", a.breed.as_deref().unwrap_or("-")),
            format!("  Sex:     {}", a.sex),
        ];
        if let Some(born) = a.birth_date {
            let age = self
                .age_years
                .map(|y| format!(" ({} year{})", y, if y == 1 { "" } else { "s" }))
                .unwrap_or_default();
            lines.push(format!("  Born:    {}{}", born, age));
        }
        lines.push(format!("  Sire:    {}", a.father_id.as_deref().unwrap_or("unknown")));
        lines.push(format!("  Dam:     {}", a.mother_id.as_deref().unwrap_or("unknown")));
        lines.join("\n")
    }
}

/// Show one animal, with its age as of `ctx.now`.
pub fn animals_show(ctx: &Context, id: &str) -> Result<AnimalDetail> {
    let client = ctx.authorized_client(&format!("/dashboard/animals/{}", id))?;
    let animal = client.get_animal(id)?;
    Ok(detail(animal, ctx.now.date_naive()))
}

fn detail(animal: Animal, today: NaiveDate) -> AnimalDetail {
    AnimalDetail {
        age_years: animal.age_years(today),
        animal,
    }
}

// === plans ===

#[derive(Debug, Serialize)]
pub struct PlanList {
    pub plans: Vec<SubscriptionPlan>,
}

impl CommandResult for PlanList {
    fn to_json(&self) -> String {
        json_string(self)
    }

    fn to_human(&self) -> String {
        if self.plans.is_empty() {
            return "No plans available.".to_string();
        }
        let mut lines = Vec::new();
        for plan in &self.plans {
            lines.push(format!(
                "{} [{}]: {}/month, up to {} animals",
                plan.name,
                plan.id,
                plan.formatted_price(),
                plan.animal_limit
            ));
            if let Some(ref description) = plan.description {
                lines.push(format!("  {}", description));
            }
            for feature in &plan.features {
                lines.push(format!("  - {}", feature));
            }
        }
        lines.join("\n")
    }
}

/// List subscription plans. Public: a stored session is sent if present.
pub fn plans_list(ctx: &Context) -> Result<PlanList> {
    let holder = ctx.restore_session()?;
    let plans = ctx.client(holder.bearer()).list_plans()?;
    Ok(PlanList { plans })
}

// === organizations ===

#[derive(Debug, Serialize)]
pub struct OrganizationList {
    pub count: usize,
    pub organizations: Vec<Organization>,
}

impl CommandResult for OrganizationList {
    fn to_json(&self) -> String {
        json_string(self)
    }

    fn to_human(&self) -> String {
        if self.organizations.is_empty() {
            return "No organizations.".to_string();
        }
        let mut lines = vec![format!("{} organization(s):", self.count)];
        for org in &self.organizations {
            lines.push(format!(
                "  [{}] {} <{}> - {} (plan: {})",
                org.id,
                org.name,
                org.email,
                org.subscription_status,
                org.subscription_plan_id.as_deref().unwrap_or("none")
            ));
        }
        lines.join("\n")
    }
}

/// List all organizations. Administrators only.
pub fn orgs_list(ctx: &Context) -> Result<OrganizationList> {
    let client = ctx.authorized_client("/admin/organizations")?;
    let organizations = client.list_organizations()?;
    Ok(OrganizationList {
        count: organizations.len(),
        organizations,
    })
}
