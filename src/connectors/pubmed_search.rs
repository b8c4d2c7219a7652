//! PubMed search connector using the E-utilities API.
//!
//! Two-phase protocol: `esearch` returns an ordered, relevance-ranked PMID
//! list bounded by the result cap, then one batched `efetch` call retrieves
//! every article. The esearch order defines the result order.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use quick_xml::de::from_str;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::ConnectorConfig;
use crate::connectors::pubmed_xml::{text_of, PubmedArticle, PubmedArticleSet};
use crate::connectors::{Connector, ConnectorError};
use crate::kb::{derive_key, KnowledgeItem, KnowledgeStore};
use crate::models::{ArticleSummary, DateRange, LiteratureSearchRequest, ToolResponse};
use crate::utils::{encode_query, HttpClient};

/// NCBI E-utilities base URL
const EUTILS_BASE_URL: &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils";

const PROVIDER: &str = "NCBI esearch";
const FETCH_PROVIDER: &str = "NCBI efetch";

const ITEM_TYPE: &str = "PUBMED_SEARCH_RESULTS";

const MAX_AUTHORS: usize = 10;

/// Publication-type tags for the esearch term. Values outside this set are
/// skipped rather than passed through.
const PUB_TYPE_MAP: &[(&str, &str)] = &[
    ("Clinical Trial", "Clinical Trial[ptyp]"),
    ("Randomized Controlled Trial", "Randomized Controlled Trial[ptyp]"),
    ("Meta-Analysis", "Meta-Analysis[ptyp]"),
    ("Systematic Review", "Systematic Review[ptyp]"),
    ("Review", "Review[ptyp]"),
    ("Case Reports", "Case Reports[ptyp]"),
    ("Observational Study", "Observational Study[ptyp]"),
];

/// Open-ended year ranges substitute these sentinel bounds.
const MIN_YEAR_SENTINEL: i32 = 1900;
const MAX_YEAR_SENTINEL: i32 = 3000;

/// PubMed literature search connector
#[derive(Debug, Clone)]
pub struct PubMedSearchConnector {
    client: Arc<HttpClient>,
    base_url: String,
    search_timeout: Duration,
    fetch_timeout: Duration,
    max_results_cap: usize,
}

impl PubMedSearchConnector {
    /// Create a new connector from validated configuration.
    pub fn new(config: &ConnectorConfig) -> Result<Self, ConnectorError> {
        let client = Arc::new(HttpClient::new(config.http.connect_timeout())?);
        Ok(Self::with_client(client, config))
    }

    /// Create with a shared HTTP client.
    pub fn with_client(client: Arc<HttpClient>, config: &ConnectorConfig) -> Self {
        Self {
            client,
            base_url: EUTILS_BASE_URL.to_string(),
            search_timeout: config.timeouts.search(),
            fetch_timeout: config.timeouts.fetch(),
            max_results_cap: config.limits.max_article_results,
        }
    }

    /// Override the API endpoint, mainly for testing against a local mock.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Build the full esearch term: query AND-joined with the
    /// publication-type OR-group and the `[pdat]` year range.
    fn build_search_term(request: &LiteratureSearchRequest) -> String {
        let mut parts = vec![request.query.trim().to_string()];

        let mapped: Vec<&str> = request
            .publication_types
            .iter()
            .filter_map(|pub_type| {
                PUB_TYPE_MAP
                    .iter()
                    .find(|(from, _)| from == &pub_type.as_str())
                    .map(|(_, to)| *to)
            })
            .collect();
        if !mapped.is_empty() {
            parts.push(format!("({})", mapped.join(" OR ")));
        }

        if let Some(range) = &request.date_range {
            match (range.start_year, range.end_year) {
                (Some(start), Some(end)) => parts.push(format!("{}:{}[pdat]", start, end)),
                (Some(start), None) => {
                    parts.push(format!("{}:{}[pdat]", start, MAX_YEAR_SENTINEL))
                }
                (None, Some(end)) => parts.push(format!("{}:{}[pdat]", MIN_YEAR_SENTINEL, end)),
                (None, None) => {}
            }
        }

        parts.join(" AND ")
    }

    /// Provider parameters for the esearch call; also the cache-key input.
    fn build_search_params(&self, request: &LiteratureSearchRequest) -> Vec<(String, String)> {
        let retmax = request.max_results.min(self.max_results_cap);
        vec![
            ("db".to_string(), "pubmed".to_string()),
            ("term".to_string(), Self::build_search_term(request)),
            ("retmax".to_string(), retmax.to_string()),
            ("retmode".to_string(), "xml".to_string()),
            ("sort".to_string(), "relevance".to_string()),
        ]
    }

    /// Parse the esearch response into (upstream total, ordered PMIDs).
    fn parse_search_response(xml: &str) -> Result<(Option<u64>, Vec<String>), ConnectorError> {
        #[derive(Debug, Deserialize)]
        #[allow(non_snake_case)]
        struct ESearchResult {
            Count: Option<String>,
            IdList: Option<IdList>,
        }

        #[derive(Debug, Deserialize)]
        struct IdList {
            #[serde(rename = "Id", default)]
            ids: Vec<String>,
        }

        let result: ESearchResult = from_str(xml)
            .map_err(|e| ConnectorError::Parse(format!("esearch XML: {}", e)))?;

        let total = result.Count.and_then(|count| count.parse().ok());
        let ids = result.IdList.map(|list| list.ids).unwrap_or_default();
        Ok((total, ids))
    }

    /// Normalize one article into a summary, or `None` when the PMID (or
    /// the whole Article element) is missing.
    fn normalize_summary(article: &PubmedArticle, include_abstract: bool) -> Option<ArticleSummary> {
        let citation = article.MedlineCitation.as_ref()?;
        let pmid = text_of(&citation.PMID);
        if pmid.is_empty() {
            return None;
        }
        let pmid = pmid.to_string();
        let body = citation.Article.as_ref()?;

        let title = match text_of(&body.ArticleTitle) {
            "" => "No title available".to_string(),
            title => title.to_string(),
        };

        let authors: Vec<String> = body
            .AuthorList
            .as_ref()
            .map(|list| {
                list.authors
                    .iter()
                    .filter_map(|author| {
                        let last = text_of(&author.LastName);
                        if last.is_empty() {
                            return None;
                        }
                        let fore = text_of(&author.ForeName);
                        Some(if fore.is_empty() {
                            last.to_string()
                        } else {
                            format!("{}, {}", last, fore)
                        })
                    })
                    .take(MAX_AUTHORS)
                    .collect()
            })
            .unwrap_or_default();

        let journal = body
            .Journal
            .as_ref()
            .map(|journal| text_of(&journal.Title))
            .filter(|title| !title.is_empty())
            .unwrap_or("Unknown journal")
            .to_string();

        let publication_date = body
            .Journal
            .as_ref()
            .and_then(|journal| journal.JournalIssue.as_ref())
            .and_then(|issue| issue.PubDate.as_ref())
            .and_then(|date| {
                let year = text_of(&date.Year);
                if year.is_empty() {
                    return None;
                }
                let month = text_of(&date.Month);
                Some(if month.is_empty() {
                    year.to_string()
                } else {
                    format!("{} {}", year, month)
                })
            })
            .unwrap_or_else(|| "Unknown date".to_string());

        let abstract_text = if include_abstract {
            body.Abstract
                .as_ref()
                .and_then(|info| info.texts.first())
                .and_then(|text| text.value.clone())
                .unwrap_or_default()
        } else {
            String::new()
        };

        let doi = article
            .PubmedData
            .as_ref()
            .and_then(|data| data.ArticleIdList.as_ref())
            .and_then(|list| {
                list.ids
                    .iter()
                    .find(|id| id.id_type.as_deref() == Some("doi"))
            })
            .and_then(|id| id.value.clone())
            .unwrap_or_default();

        let publication_types = body
            .PublicationTypeList
            .as_ref()
            .map(|list| {
                list.types
                    .iter()
                    .map(|node| node.text().to_string())
                    .filter(|text| !text.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        let doi_url = if doi.is_empty() {
            String::new()
        } else {
            format!("https://doi.org/{}", doi)
        };

        Some(ArticleSummary {
            pubmed_url: format!("https://pubmed.ncbi.nlm.nih.gov/{}/", pmid),
            pmid,
            title,
            authors,
            journal,
            publication_date,
            r#abstract: abstract_text,
            doi,
            publication_types,
            doi_url,
        })
    }

    async fn run(
        &self,
        request: &LiteratureSearchRequest,
        kb: Option<&dyn KnowledgeStore>,
    ) -> Result<ToolResponse, ConnectorError> {
        let query = request.query.trim();
        if query.is_empty() {
            return Err(ConnectorError::InvalidRequest(
                "Search query cannot be empty".to_string(),
            ));
        }

        tracing::info!(
            query = %query,
            max_results = request.max_results,
            include_abstracts = request.include_abstracts,
            "ncbi_search_started"
        );

        let params = self.build_search_params(request);
        let cache_key = format!("ncbi_search://{}", derive_key(&params));

        if let Some(store) = kb {
            if let Some(cached) = store.get_item_by_uri(&cache_key).await {
                tracing::info!(query = %query, "ncbi_search_cache_hit");
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

        // Step 1: ordered PMID list.
        let search_url = format!("{}/esearch.fcgi?{}", self.base_url, encode_query(&params));
        let search_xml = self
            .client
            .get_text(&search_url, self.search_timeout, PROVIDER)
            .await?;
        let (upstream_total, pmids) = Self::parse_search_response(&search_xml)?;

        if pmids.is_empty() {
            let payload = serde_json::json!({
                "query": query,
                "total_results": 0,
                "articles": [],
                "message": "No articles found matching the search criteria",
            });
            return Ok(ToolResponse::success(payload));
        }

        // Step 2: one batched detail call for all PMIDs.
        let fetch_params = vec![
            ("db".to_string(), "pubmed".to_string()),
            ("id".to_string(), pmids.join(",")),
            ("retmode".to_string(), "xml".to_string()),
            (
                "rettype".to_string(),
                if request.include_abstracts {
                    "abstract".to_string()
                } else {
                    "medline".to_string()
                },
            ),
        ];
        let fetch_url = format!(
            "{}/efetch.fcgi?{}",
            self.base_url,
            encode_query(&fetch_params)
        );
        let fetch_xml = self
            .client
            .get_text(&fetch_url, self.fetch_timeout, FETCH_PROVIDER)
            .await?;

        let article_set: PubmedArticleSet = from_str(&fetch_xml)
            .map_err(|e| ConnectorError::Parse(format!("efetch XML: {}", e)))?;

        let mut articles = Vec::new();
        for article in &article_set.articles {
            match Self::normalize_summary(article, request.include_abstracts) {
                Some(summary) => articles.push(summary),
                None => {
                    tracing::warn!("article_parse_skipped");
                }
            }
        }

        let payload = LiteratureSearchPayload {
            query: query.to_string(),
            total_results: upstream_total.unwrap_or(pmids.len() as u64),
            results_returned: articles.len(),
            articles,
            search_metadata: SearchMetadata {
                search_query_used: Self::build_search_term(request),
                publication_types_filter: request.publication_types.clone(),
                date_range_filter: request.date_range,
                max_results_requested: request.max_results,
                search_timestamp: Utc::now().to_rfc3339(),
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
                    "query": query,
                    "result_count": results_returned,
                    "search_type": "pubmed_clinical_search",
                }),
            });
        }

        Ok(ToolResponse::success(payload_value).with_knowledge_items(items))
    }
}

#[derive(Debug, Serialize)]
struct SearchMetadata {
    search_query_used: String,
    publication_types_filter: Vec<String>,
    date_range_filter: Option<DateRange>,
    max_results_requested: usize,
    search_timestamp: String,
}

#[derive(Debug, Serialize)]
struct LiteratureSearchPayload {
    query: String,
    total_results: u64,
    results_returned: usize,
    articles: Vec<ArticleSummary>,
    search_metadata: SearchMetadata,
}

#[async_trait]
impl Connector for PubMedSearchConnector {
    type Request = LiteratureSearchRequest;

    fn id(&self) -> &str {
        "ncbi_pubmed_search"
    }

    fn name(&self) -> &str {
        "PubMed Search"
    }

    async fn execute(
        &self,
        request: &LiteratureSearchRequest,
        kb: Option<&dyn KnowledgeStore>,
    ) -> ToolResponse {
        match self.run(request, kb).await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(error = %e, kind = e.kind(), "ncbi_search_error");
                ToolResponse::from(e)
            }
        }
    }
}
