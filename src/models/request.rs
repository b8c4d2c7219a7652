//! Search and fetch request models.

use serde::{Deserialize, Serialize};

/// Sort order for search results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    /// Provider-facing representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

/// Parameters for a ClinicalTrials.gov study search.
///
/// At least one of `query`, `condition`, `intervention`, or `location` must
/// be non-empty; the connector rejects a request with no discriminating
/// field before any network call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrialSearchRequest {
    /// General search query (maps to `query.term`)
    #[serde(default)]
    pub query: String,

    /// Medical condition or disease (maps to `query.cond`)
    #[serde(default)]
    pub condition: String,

    /// Treatment or intervention being studied (maps to `query.intr`)
    #[serde(default)]
    pub intervention: String,

    /// Geographic location (maps to `query.locn`)
    #[serde(default)]
    pub location: String,

    /// Recruitment status filter values, e.g. "Recruiting" or
    /// "Active, not recruiting". Matching is case/whitespace/hyphen
    /// insensitive; unknown values pass through uppercased.
    #[serde(default)]
    pub recruitment_status: Vec<String>,

    /// Study phase filter values, e.g. "Phase 2". Multiple phases match
    /// studies in any of them.
    #[serde(default)]
    pub study_phase: Vec<String>,

    /// Study type; "Interventional" is the upstream default and is omitted
    /// from the advanced filter.
    #[serde(default = "default_study_type")]
    pub study_type: String,

    /// Maximum number of studies to retrieve, clamped to the provider cap.
    #[serde(default = "default_trial_max_results")]
    pub max_results: usize,

    /// Sort field, e.g. "LastUpdatePostDate"
    #[serde(default = "default_trial_sort_by")]
    pub sort_by: String,

    /// Sort order
    #[serde(default = "default_sort_order")]
    pub sort_order: SortOrder,
}

fn default_study_type() -> String {
    "Interventional".to_string()
}

fn default_trial_max_results() -> usize {
    50
}

fn default_trial_sort_by() -> String {
    "LastUpdatePostDate".to_string()
}

fn default_sort_order() -> SortOrder {
    SortOrder::Desc
}

impl Default for TrialSearchRequest {
    fn default() -> Self {
        Self {
            query: String::new(),
            condition: String::new(),
            intervention: String::new(),
            location: String::new(),
            recruitment_status: Vec::new(),
            study_phase: Vec::new(),
            study_type: default_study_type(),
            max_results: default_trial_max_results(),
            sort_by: default_trial_sort_by(),
            sort_order: default_sort_order(),
        }
    }
}

impl TrialSearchRequest {
    /// Create an empty request with documented defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the free-text query
    pub fn query(mut self, query: impl Into<String>) -> Self {
        self.query = query.into();
        self
    }

    /// Set the condition filter
    pub fn condition(mut self, condition: impl Into<String>) -> Self {
        self.condition = condition.into();
        self
    }

    /// Set the intervention filter
    pub fn intervention(mut self, intervention: impl Into<String>) -> Self {
        self.intervention = intervention.into();
        self
    }

    /// Set the location filter
    pub fn location(mut self, location: impl Into<String>) -> Self {
        self.location = location.into();
        self
    }

    /// Set recruitment status filter values
    pub fn recruitment_status<I, S>(mut self, statuses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.recruitment_status = statuses.into_iter().map(Into::into).collect();
        self
    }

    /// Set study phase filter values
    pub fn study_phase<I, S>(mut self, phases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.study_phase = phases.into_iter().map(Into::into).collect();
        self
    }

    /// Set the study type
    pub fn study_type(mut self, study_type: impl Into<String>) -> Self {
        self.study_type = study_type.into();
        self
    }

    /// Set maximum results
    pub fn max_results(mut self, max: usize) -> Self {
        self.max_results = max;
        self
    }

    /// Set the sort field
    pub fn sort_by(mut self, sort_by: impl Into<String>) -> Self {
        self.sort_by = sort_by.into();
        self
    }

    /// Set the sort order
    pub fn sort_order(mut self, order: SortOrder) -> Self {
        self.sort_order = order;
        self
    }

    /// Whether any discriminating search field is non-empty.
    pub fn has_discriminator(&self) -> bool {
        [&self.query, &self.condition, &self.intervention, &self.location]
            .iter()
            .any(|field| !field.trim().is_empty())
    }
}

/// Inclusive publication-year range filter.
///
/// Either bound may be open; the query builder substitutes sentinel bounds
/// (1900 / 3000) for the missing side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    /// Start year, e.g. 2020
    #[serde(default)]
    pub start_year: Option<i32>,

    /// End year, e.g. 2024
    #[serde(default)]
    pub end_year: Option<i32>,
}

/// Parameters for a PubMed literature search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiteratureSearchRequest {
    /// Search query; MeSH terms and clinical keywords work best. Must be
    /// non-empty.
    pub query: String,

    /// Maximum number of articles to retrieve, clamped to the provider cap.
    #[serde(default = "default_article_max_results")]
    pub max_results: usize,

    /// Publication-type filters, e.g. "Randomized Controlled Trial".
    /// Values outside the known set are skipped.
    #[serde(default)]
    pub publication_types: Vec<String>,

    /// Optional publication-year range
    #[serde(default)]
    pub date_range: Option<DateRange>,

    /// Whether to fetch full abstracts (selects efetch rettype)
    #[serde(default = "default_true")]
    pub include_abstracts: bool,
}

fn default_article_max_results() -> usize {
    20
}

fn default_true() -> bool {
    true
}

impl LiteratureSearchRequest {
    /// Create a new search request for `query`.
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            max_results: default_article_max_results(),
            publication_types: Vec::new(),
            date_range: None,
            include_abstracts: true,
        }
    }

    /// Set maximum results
    pub fn max_results(mut self, max: usize) -> Self {
        self.max_results = max;
        self
    }

    /// Set publication-type filters
    pub fn publication_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.publication_types = types.into_iter().map(Into::into).collect();
        self
    }

    /// Set the publication-year range
    pub fn date_range(mut self, range: DateRange) -> Self {
        self.date_range = Some(range);
        self
    }

    /// Enable/disable abstract retrieval
    pub fn include_abstracts(mut self, include: bool) -> Self {
        self.include_abstracts = include;
        self
    }
}

/// Parameters for fetching detailed PubMed records by PMID.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArticleFetchRequest {
    /// PubMed IDs to fetch; each must be numeric. Malformed entries are
    /// dropped with a warning, and the batch is bounded by the configured
    /// cap.
    #[serde(default)]
    pub pmids: Vec<String>,

    /// Whether to include MeSH terms
    #[serde(default = "default_true")]
    pub include_mesh_terms: bool,

    /// Whether to include the reference list. efetch does not expose
    /// reference lists, so this always normalizes to an empty list.
    #[serde(default)]
    pub include_references: bool,

    /// Whether to include grant/funding information
    #[serde(default = "default_true")]
    pub include_grants: bool,
}

impl ArticleFetchRequest {
    /// Create a request for a batch of PMIDs.
    pub fn new<I, S>(pmids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            pmids: pmids.into_iter().map(Into::into).collect(),
            include_mesh_terms: true,
            include_references: false,
            include_grants: true,
        }
    }

    /// Create a request for a single PMID.
    pub fn single(pmid: impl Into<String>) -> Self {
        Self::new([pmid.into()])
    }

    /// Enable/disable MeSH terms
    pub fn include_mesh_terms(mut self, include: bool) -> Self {
        self.include_mesh_terms = include;
        self
    }

    /// Enable/disable grant information
    pub fn include_grants(mut self, include: bool) -> Self {
        self.include_grants = include;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trial_request_defaults() {
        let request = TrialSearchRequest::new();
        assert_eq!(request.study_type, "Interventional");
        assert_eq!(request.max_results, 50);
        assert_eq!(request.sort_by, "LastUpdatePostDate");
        assert_eq!(request.sort_order, SortOrder::Desc);
        assert!(!request.has_discriminator());
    }

    #[test]
    fn test_trial_request_builder() {
        let request = TrialSearchRequest::new()
            .condition("Breast Cancer")
            .study_phase(["Phase 2", "Phase 3"])
            .max_results(25)
            .sort_order(SortOrder::Asc);

        assert_eq!(request.condition, "Breast Cancer");
        assert_eq!(request.study_phase, vec!["Phase 2", "Phase 3"]);
        assert_eq!(request.max_results, 25);
        assert!(request.has_discriminator());
    }

    #[test]
    fn test_discriminator_ignores_whitespace() {
        let request = TrialSearchRequest::new().query("   ");
        assert!(!request.has_discriminator());
    }

    #[test]
    fn test_literature_request_defaults() {
        let request = LiteratureSearchRequest::new("diabetes mellitus treatment");
        assert_eq!(request.max_results, 20);
        assert!(request.include_abstracts);
        assert!(request.publication_types.is_empty());
        assert!(request.date_range.is_none());
    }

    #[test]
    fn test_fetch_request_single() {
        let request = ArticleFetchRequest::single("12345678");
        assert_eq!(request.pmids, vec!["12345678"]);
        assert!(request.include_mesh_terms);
        assert!(!request.include_references);
        assert!(request.include_grants);
    }

    #[test]
    fn test_request_deserializes_with_defaults() {
        let request: TrialSearchRequest =
            serde_json::from_str(r#"{"condition": "Melanoma"}"#).unwrap();
        assert_eq!(request.condition, "Melanoma");
        assert_eq!(request.max_results, 50);
        assert_eq!(request.study_type, "Interventional");
    }
}
