//! ClinicalTrials.gov connector using the v2 REST API.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;
use serde_json::Value;

use crate::config::ConnectorConfig;
use crate::connectors::{Connector, ConnectorError};
use crate::kb::{derive_key, KnowledgeItem, KnowledgeStore};
use crate::models::{
    EligibilitySummary, InterventionRecord, LocationRecord, StudyRecord, ToolResponse,
    TrialSearchRequest,
};
use crate::utils::json::{seq_at, str_at, string_list_at, u64_at, value_at};
use crate::utils::text::clip;
use crate::utils::{encode_query, HttpClient};

/// ClinicalTrials.gov v2 studies endpoint
const CTGOV_STUDIES_URL: &str = "https://clinicaltrials.gov/api/v2/studies";

const PROVIDER: &str = "ClinicalTrials.gov";

const ITEM_TYPE: &str = "CLINICAL_TRIALS_SEARCH_RESULTS";

const MAX_INTERVENTIONS: usize = 5;
const MAX_LOCATIONS: usize = 10;
const DESCRIPTION_CLIP: usize = 200;
const CRITERIA_CLIP: usize = 500;

/// Recruitment status lookup, keyed by normalized input.
const STATUS_MAP: &[(&str, &str)] = &[
    ("recruiting", "RECRUITING"),
    ("not_yet_recruiting", "NOT_YET_RECRUITING"),
    ("active_not_recruiting", "ACTIVE_NOT_RECRUITING"),
    ("completed", "COMPLETED"),
    ("suspended", "SUSPENDED"),
    ("terminated", "TERMINATED"),
    ("withdrawn", "WITHDRAWN"),
    ("available", "AVAILABLE"),
    ("no_longer_available", "NO_LONGER_AVAILABLE"),
    ("temporarily_not_available", "TEMPORARILY_NOT_AVAILABLE"),
    ("approved_for_marketing", "APPROVED_FOR_MARKETING"),
    ("withheld", "WITHHELD"),
    ("unknown", "UNKNOWN"),
];

/// Study phase lookup, keyed by normalized input.
const PHASE_MAP: &[(&str, &str)] = &[
    ("early_phase_1", "EARLY_PHASE1"),
    ("early_phase1", "EARLY_PHASE1"),
    ("phase_1", "PHASE1"),
    ("phase1", "PHASE1"),
    ("phase_2", "PHASE2"),
    ("phase2", "PHASE2"),
    ("phase_3", "PHASE3"),
    ("phase3", "PHASE3"),
    ("phase_4", "PHASE4"),
    ("phase4", "PHASE4"),
    ("na", "NA"),
    ("not_applicable", "NA"),
];

/// Study type lookup, keyed by normalized input.
const TYPE_MAP: &[(&str, &str)] = &[
    ("interventional", "INTERVENTIONAL"),
    ("observational", "OBSERVATIONAL"),
    ("expanded_access", "EXPANDED_ACCESS"),
];

/// Normalize a user-facing enum value: lowercase, spaces and hyphens to
/// underscores, commas dropped. "Active, not recruiting" and
/// "active-not-recruiting" both become "active_not_recruiting".
fn normalize_enum_key(raw: &str) -> String {
    raw.trim()
        .to_lowercase()
        .chars()
        .filter_map(|c| match c {
            ' ' | '-' => Some('_'),
            ',' => None,
            other => Some(other),
        })
        .collect()
}

/// Map through a lookup table; unknown values echo uppercased so new
/// upstream enum members keep working without a client update.
fn map_enum(table: &[(&str, &str)], raw: &str) -> String {
    let key = normalize_enum_key(raw);
    table
        .iter()
        .find(|(from, _)| *from == key)
        .map(|(_, to)| (*to).to_string())
        .unwrap_or_else(|| raw.to_uppercase())
}

/// ClinicalTrials.gov search connector
///
/// Single paginated call against `/api/v2/studies`, normalizing each study
/// defensively into a [`StudyRecord`].
#[derive(Debug, Clone)]
pub struct ClinicalTrialsConnector {
    client: Arc<HttpClient>,
    base_url: String,
    timeout: Duration,
    page_size_cap: usize,
}

impl ClinicalTrialsConnector {
    /// Create a new connector from validated configuration.
    pub fn new(config: &ConnectorConfig) -> Result<Self, ConnectorError> {
        let client = Arc::new(HttpClient::new(config.http.connect_timeout())?);
        Ok(Self::with_client(client, config))
    }

    /// Create with a shared HTTP client.
    pub fn with_client(client: Arc<HttpClient>, config: &ConnectorConfig) -> Self {
        Self {
            client,
            base_url: CTGOV_STUDIES_URL.to_string(),
            timeout: config.timeouts.search(),
            page_size_cap: config.limits.max_trial_results,
        }
    }

    /// Override the API endpoint, mainly for testing against a local mock.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Build the provider parameter list for the v2 API.
    fn build_search_params(&self, request: &TrialSearchRequest) -> Vec<(String, String)> {
        let page_size = request.max_results.min(self.page_size_cap);
        let mut params = vec![
            ("pageSize".to_string(), page_size.to_string()),
            ("countTotal".to_string(), "true".to_string()),
            ("format".to_string(), "json".to_string()),
        ];

        if !request.sort_by.is_empty() {
            params.push((
                "sort".to_string(),
                format!("{}:{}", request.sort_by, request.sort_order.as_str()),
            ));
        }

        for (key, value) in [
            ("query.term", &request.query),
            ("query.cond", &request.condition),
            ("query.intr", &request.intervention),
            ("query.locn", &request.location),
        ] {
            let value = value.trim();
            if !value.is_empty() {
                params.push((key.to_string(), value.to_string()));
            }
        }

        if !request.recruitment_status.is_empty() {
            let mapped: Vec<String> = request
                .recruitment_status
                .iter()
                .map(|status| map_enum(STATUS_MAP, status))
                .collect();
            params.push(("filter.overallStatus".to_string(), mapped.join(",")));
        }

        // Phase and study type go through one Essie expression.
        let mut advanced = Vec::new();

        if !request.study_phase.is_empty() {
            let mapped: Vec<String> = request
                .study_phase
                .iter()
                .map(|phase| format!("AREA[Phase]{}", map_enum(PHASE_MAP, phase)))
                .collect();
            let joined = mapped.join(" OR ");
            advanced.push(if mapped.len() > 1 {
                format!("({})", joined)
            } else {
                joined
            });
        }

        // "Interventional" is the upstream default and stays out of the filter.
        if !request.study_type.trim().is_empty()
            && !request.study_type.trim().eq_ignore_ascii_case("interventional")
        {
            advanced.push(format!(
                "AREA[StudyType]{}",
                map_enum(TYPE_MAP, &request.study_type)
            ));
        }

        if !advanced.is_empty() {
            params.push(("filter.advanced".to_string(), advanced.join(" AND ")));
        }

        params
    }

    /// Normalize one raw study, or `None` when the NCT ID is missing.
    fn normalize_study(study: &Value) -> Option<StudyRecord> {
        let protocol = value_at(study, &["protocolSection"])?;

        let nct_id = str_at(protocol, &["identificationModule", "nctId"]);
        if nct_id.is_empty() {
            return None;
        }
        let nct_id = nct_id.to_string();

        let overall_status = match str_at(protocol, &["statusModule", "overallStatus"]) {
            "" => "Unknown".to_string(),
            status => status.to_string(),
        };

        let interventions = seq_at(protocol, &["armsInterventionsModule", "interventions"])
            .iter()
            .take(MAX_INTERVENTIONS)
            .map(|intervention| InterventionRecord {
                name: str_at(intervention, &["name"]).to_string(),
                kind: str_at(intervention, &["type"]).to_string(),
                description: clip(str_at(intervention, &["description"]), DESCRIPTION_CLIP),
            })
            .collect();

        let locations = seq_at(protocol, &["contactsLocationsModule", "locations"])
            .iter()
            .take(MAX_LOCATIONS)
            .map(|location| LocationRecord {
                facility: str_at(location, &["facility"]).to_string(),
                city: str_at(location, &["city"]).to_string(),
                state: str_at(location, &["state"]).to_string(),
                country: str_at(location, &["country"]).to_string(),
                status: str_at(location, &["status"]).to_string(),
            })
            .collect();

        Some(StudyRecord {
            title: str_at(protocol, &["identificationModule", "briefTitle"]).to_string(),
            overall_status,
            study_type: str_at(protocol, &["designModule", "studyType"]).to_string(),
            phases: string_list_at(protocol, &["designModule", "phases"]),
            conditions: string_list_at(protocol, &["conditionsModule", "conditions"]),
            interventions,
            lead_sponsor: str_at(protocol, &["sponsorCollaboratorsModule", "leadSponsor", "name"])
                .to_string(),
            last_update: str_at(protocol, &["statusModule", "lastUpdatePostDateStruct", "date"])
                .to_string(),
            eligibility: EligibilitySummary {
                criteria: clip(
                    str_at(protocol, &["eligibilityModule", "eligibilityCriteria"]),
                    CRITERIA_CLIP,
                ),
                min_age: str_at(protocol, &["eligibilityModule", "minimumAge"]).to_string(),
                max_age: str_at(protocol, &["eligibilityModule", "maximumAge"]).to_string(),
                sex: str_at(protocol, &["eligibilityModule", "sex"]).to_string(),
            },
            locations,
            study_url: format!("https://clinicaltrials.gov/study/{}", nct_id),
            api_url: format!("https://clinicaltrials.gov/api/v2/studies/{}", nct_id),
            nct_id,
        })
    }

    async fn run(
        &self,
        request: &TrialSearchRequest,
        kb: Option<&dyn KnowledgeStore>,
    ) -> Result<ToolResponse, ConnectorError> {
        if !request.has_discriminator() {
            return Err(ConnectorError::InvalidRequest(
                "At least one search parameter (query, condition, intervention, or location) \
                 must be provided"
                    .to_string(),
            ));
        }

        tracing::info!(
            query = %request.query,
            condition = %request.condition,
            intervention = %request.intervention,
            max_results = request.max_results,
            "clinical_trials_search_started"
        );

        let params = self.build_search_params(request);
        let cache_key = format!("clinical_trials://{}", derive_key(&params));

        if let Some(store) = kb {
            if let Some(cached) = store.get_item_by_uri(&cache_key).await {
                tracing::info!(cache_key = %cache_key, "clinical_trials_cache_hit");
                let mut payload = cached.content;
                if let Some(object) = payload.as_object_mut() {
                    object.insert(
                        "source".to_string(),
                        Value::String("knowledge_base_cache".to_string()),
                    );
                }
                return Ok(ToolResponse::success(payload));
            }
        }

        let url = format!("{}?{}", self.base_url, encode_query(&params));
        let body = self.client.get_text(&url, self.timeout, PROVIDER).await?;
        let data: Value = serde_json::from_str(&body)
            .map_err(|e| ConnectorError::Parse(format!("ClinicalTrials.gov JSON: {}", e)))?;

        let search_parameters: BTreeMap<String, String> = params.into_iter().collect();
        let raw_studies = seq_at(&data, &["studies"]);

        if raw_studies.is_empty() {
            let payload = serde_json::json!({
                "search_parameters": search_parameters,
                "total_results": 0,
                "studies": [],
                "message": "No clinical trials found matching the search criteria",
            });
            return Ok(ToolResponse::success(payload));
        }

        let total_results = u64_at(&data, &["totalCount"]).unwrap_or(raw_studies.len() as u64);

        let mut studies = Vec::new();
        for raw in raw_studies {
            match Self::normalize_study(raw) {
                Some(study) => studies.push(study),
                None => {
                    tracing::warn!(
                        nct_id = str_at(raw, &["protocolSection", "identificationModule", "nctId"]),
                        "study_processing_skipped"
                    );
                }
            }
        }

        let payload = TrialSearchPayload {
            search_parameters,
            total_results,
            results_returned: studies.len(),
            studies,
            search_metadata: SearchMetadata {
                search_timestamp: Utc::now().to_rfc3339(),
                api_version: "v2.0",
                source: "clinicaltrials.gov",
            },
        };
        let results_returned = payload.results_returned;
        let payload_value = serde_json::to_value(&payload)?;

        let mut items = Vec::new();
        if results_returned > 0 {
            items.push(KnowledgeItem {
                item_type: ITEM_TYPE.to_string(),
                content: payload_value.clone(),
                source_uri: cache_key,
                metadata: serde_json::json!({
                    "search_query": request.query,
                    "condition": request.condition,
                    "intervention": request.intervention,
                    "result_count": results_returned,
                    "search_type": "clinical_trials_search",
                }),
            });
        }

        Ok(ToolResponse::success(payload_value).with_knowledge_items(items))
    }
}

#[derive(Debug, Serialize)]
struct SearchMetadata {
    search_timestamp: String,
    api_version: &'static str,
    source: &'static str,
}

#[derive(Debug, Serialize)]
struct TrialSearchPayload {
    search_parameters: BTreeMap<String, String>,
    total_results: u64,
    results_returned: usize,
    studies: Vec<StudyRecord>,
    search_metadata: SearchMetadata,
}

#[async_trait]
impl Connector for ClinicalTrialsConnector {
    type Request = TrialSearchRequest;

    fn id(&self) -> &str {
        "clinical_trials"
    }

    fn name(&self) -> &str {
        "ClinicalTrials.gov"
    }

    async fn execute(
        &self,
        request: &TrialSearchRequest,
        kb: Option<&dyn KnowledgeStore>,
    ) -> ToolResponse {
        match self.run(request, kb).await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(error = %e, kind = e.kind(), "clinical_trials_search_error");
                ToolResponse::from(e)
            }
        }
    }
}
