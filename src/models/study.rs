//! Normalized clinical-study records.
//!
//! Every field is serde-defaulted: optional upstream modules normalize to
//! empty strings and lists, so consumers never see absent keys.

use serde::{Deserialize, Serialize};

/// A normalized ClinicalTrials.gov study.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StudyRecord {
    /// Unique ClinicalTrials.gov identifier (mandatory; records without one
    /// are dropped during normalization)
    #[serde(default)]
    pub nct_id: String,

    /// Brief study title
    #[serde(default)]
    pub title: String,

    /// Overall recruitment status; "Unknown" when upstream omits it
    #[serde(default)]
    pub overall_status: String,

    /// Study type (Interventional, Observational, ...)
    #[serde(default)]
    pub study_type: String,

    /// Study phases
    #[serde(default)]
    pub phases: Vec<String>,

    /// Conditions under study
    #[serde(default)]
    pub conditions: Vec<String>,

    /// Interventions, capped at the first five
    #[serde(default)]
    pub interventions: Vec<InterventionRecord>,

    /// Lead sponsor name
    #[serde(default)]
    pub lead_sponsor: String,

    /// Date of the last upstream update
    #[serde(default)]
    pub last_update: String,

    /// Eligibility summary
    #[serde(default)]
    pub eligibility: EligibilitySummary,

    /// Trial sites, capped at the first ten
    #[serde(default)]
    pub locations: Vec<LocationRecord>,

    /// Canonical study page URL, derived from the NCT ID
    #[serde(default)]
    pub study_url: String,

    /// API record URL, derived from the NCT ID
    #[serde(default)]
    pub api_url: String,
}

/// One intervention arm of a study.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InterventionRecord {
    #[serde(default)]
    pub name: String,

    /// Intervention type (Drug, Device, Behavioral, ...)
    #[serde(default, rename = "type")]
    pub kind: String,

    /// Description, clipped to 200 characters
    #[serde(default)]
    pub description: String,
}

/// Eligibility criteria summary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EligibilitySummary {
    /// Free-text criteria, clipped to 500 characters
    #[serde(default)]
    pub criteria: String,

    #[serde(default)]
    pub min_age: String,

    #[serde(default)]
    pub max_age: String,

    #[serde(default)]
    pub sex: String,
}

/// A trial site.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocationRecord {
    #[serde(default)]
    pub facility: String,

    #[serde(default)]
    pub city: String,

    #[serde(default)]
    pub state: String,

    #[serde(default)]
    pub country: String,

    /// Site-level recruitment status
    #[serde(default)]
    pub status: String,
}
