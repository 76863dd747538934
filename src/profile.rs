//! User archetypes and budget tiers used as forecast context

use serde::{Deserialize, Serialize};

/// Coarse spending archetype attached to a forecast request.
///
/// The wire tags (`college_student`, ...) match the labels the regression
/// model was trained on, so the one-hot feature columns resolve by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserType {
    CollegeStudent,
    YoungProfessional,
    FamilyModerate,
    FamilyHigh,
    LuxuryLifestyle,
    SeniorRetired,
}

impl Default for UserType {
    fn default() -> Self {
        UserType::CollegeStudent
    }
}

impl UserType {
    /// All archetypes, in feature-column order
    pub const ALL: [UserType; 6] = [
        UserType::CollegeStudent,
        UserType::YoungProfessional,
        UserType::FamilyModerate,
        UserType::FamilyHigh,
        UserType::LuxuryLifestyle,
        UserType::SeniorRetired,
    ];

    /// Wire tag for the archetype
    pub fn tag(&self) -> &'static str {
        match self {
            UserType::CollegeStudent => "college_student",
            UserType::YoungProfessional => "young_professional",
            UserType::FamilyModerate => "family_moderate",
            UserType::FamilyHigh => "family_high",
            UserType::LuxuryLifestyle => "luxury_lifestyle",
            UserType::SeniorRetired => "senior_retired",
        }
    }

    /// Parse a wire tag back into an archetype
    pub fn from_tag(tag: &str) -> Option<UserType> {
        UserType::ALL.iter().copied().find(|u| u.tag() == tag)
    }

    /// Feature column name for the archetype indicator
    pub fn feature_name(&self) -> String {
        format!("UserType_{}", self.tag())
    }
}

/// Budget bucket derived from the declared total monthly budget.
///
/// Derived on the fly each time features are built, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BudgetTier {
    Low,
    Moderate,
    High,
    VeryHigh,
    Luxury,
}

impl BudgetTier {
    /// All tiers, in feature-column order
    pub const ALL: [BudgetTier; 5] = [
        BudgetTier::Low,
        BudgetTier::Moderate,
        BudgetTier::High,
        BudgetTier::VeryHigh,
        BudgetTier::Luxury,
    ];

    /// Bucket a total monthly budget
    pub fn from_budget(total_budget: f64) -> BudgetTier {
        if total_budget <= 5_000.0 {
            BudgetTier::Low
        } else if total_budget <= 10_000.0 {
            BudgetTier::Moderate
        } else if total_budget <= 20_000.0 {
            BudgetTier::High
        } else if total_budget <= 40_000.0 {
            BudgetTier::VeryHigh
        } else {
            BudgetTier::Luxury
        }
    }

    /// Wire tag for the tier
    pub fn tag(&self) -> &'static str {
        match self {
            BudgetTier::Low => "low",
            BudgetTier::Moderate => "moderate",
            BudgetTier::High => "high",
            BudgetTier::VeryHigh => "very_high",
            BudgetTier::Luxury => "luxury",
        }
    }

    /// Feature column name for the tier indicator
    pub fn feature_name(&self) -> String {
        format!("budget_category_{}", self.tag())
    }
}

/// User context carried through feature construction
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct UserContext {
    /// Declared archetype
    #[serde(default)]
    pub user_type: UserType,
    /// Declared total monthly budget, in currency units
    #[serde(default)]
    pub total_budget: f64,
}

impl UserContext {
    /// Create a context from an archetype and a budget
    pub fn new(user_type: UserType, total_budget: f64) -> Self {
        Self {
            user_type,
            total_budget,
        }
    }
}
