//! PubMed detail-fetch connector using the E-utilities efetch API.
//!
//! Fetches comprehensive records for an explicit PMID batch: full author
//! detail, journal metadata, structured abstracts, MeSH terms, grants, and
//! derived URLs. Each PMID is checked against the knowledge base first;
//! only the misses go into the single batched efetch call.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use quick_xml::de::from_str;
use serde::Serialize;
use serde_json::Value;

use crate::config::ConnectorConfig;
use crate::connectors::pubmed_xml::{text_of, Article, PubmedArticle, PubmedArticleSet};
use crate::connectors::{Connector, ConnectorError};
use crate::kb::{KnowledgeItem, KnowledgeStore};
use crate::models::{
    AbstractInfo, AbstractSection, ArticleFetchRequest, ArticleRecord, ArticleUrls, AuthorRecord,
    GrantRecord, JournalInfo, MeshQualifier, MeshTerm, PublicationDate, ToolResponse,
};
use crate::utils::{encode_query, HttpClient};

/// NCBI E-utilities base URL
const EUTILS_BASE_URL: &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils";

const PROVIDER: &str = "NCBI efetch";

const ITEM_TYPE: &str = "PUBMED_ARTICLE_DETAILS";

const MAX_AUTHORS: usize = 10;

/// Metadata titles are hard-cut at this many characters.
const METADATA_TITLE_LIMIT: usize = 100;

/// Cache URI for one detailed article.
fn article_cache_uri(pmid: &str) -> String {
    format!("ncbi_article://{}_detailed", pmid)
}

/// PubMed article detail connector
#[derive(Debug, Clone)]
pub struct PubMedFetchConnector {
    client: Arc<HttpClient>,
    base_url: String,
    timeout: Duration,
    batch_cap: usize,
}

impl PubMedFetchConnector {
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
            timeout: config.timeouts.detail_fetch(),
            batch_cap: config.limits.max_batch_pmids,
        }
    }

    /// Override the API endpoint, mainly for testing against a local mock.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Keep numeric PMIDs, dropping malformed entries with a warning, and
    /// bound the batch.
    fn validate_pmids(&self, pmids: &[String]) -> Vec<String> {
        let mut valid: Vec<String> = Vec::new();
        for pmid in pmids {
            let trimmed = pmid.trim();
            if !trimmed.is_empty() && trimmed.chars().all(|c| c.is_ascii_digit()) {
                valid.push(trimmed.to_string());
            } else {
                tracing::warn!(pmid = %trimmed, "invalid_pmid");
            }
        }
        if valid.len() > self.batch_cap {
            tracing::debug!(
                requested = valid.len(),
                cap = self.batch_cap,
                "pmid_batch_truncated"
            );
            valid.truncate(self.batch_cap);
        }
        valid
    }

    fn normalize_authors(body: &Article) -> Vec<AuthorRecord> {
        let Some(list) = body.AuthorList.as_ref() else {
            return Vec::new();
        };

        list.authors
            .iter()
            .filter_map(|author| {
                let last_name = text_of(&author.LastName);
                if last_name.is_empty() {
                    return None;
                }
                let first_name = text_of(&author.ForeName);
                let initials = text_of(&author.Initials);

                let full_name = if !first_name.is_empty() {
                    format!("{}, {}", last_name, first_name)
                } else if !initials.is_empty() {
                    format!("{}, {}", last_name, initials)
                } else {
                    last_name.to_string()
                };

                let affiliation = author
                    .affiliations
                    .first()
                    .map(|info| text_of(&info.Affiliation))
                    .unwrap_or("")
                    .to_string();

                Some(AuthorRecord {
                    last_name: last_name.to_string(),
                    first_name: first_name.to_string(),
                    initials: initials.to_string(),
                    full_name,
                    affiliation,
                })
            })
            .take(MAX_AUTHORS)
            .collect()
    }

    fn normalize_journal(body: &Article) -> JournalInfo {
        let Some(journal) = body.Journal.as_ref() else {
            return JournalInfo::default();
        };

        let (issn, issn_type) = journal
            .ISSN
            .as_ref()
            .map(|issn| {
                (
                    issn.value.clone().unwrap_or_default(),
                    issn.issn_type.clone().unwrap_or_default(),
                )
            })
            .unwrap_or_default();

        let (volume, issue) = journal
            .JournalIssue
            .as_ref()
            .map(|journal_issue| {
                (
                    text_of(&journal_issue.Volume).to_string(),
                    text_of(&journal_issue.Issue).to_string(),
                )
            })
            .unwrap_or_default();

        JournalInfo {
            title: text_of(&journal.Title).to_string(),
            iso_abbreviation: text_of(&journal.ISOAbbreviation).to_string(),
            issn,
            issn_type,
            volume,
            issue,
        }
    }

    fn normalize_publication_date(body: &Article) -> PublicationDate {
        let mut date = PublicationDate::default();

        if let Some(article_date) = body.ArticleDate.as_ref() {
            let year = text_of(&article_date.Year);
            if !year.is_empty() {
                date.year = year.to_string();
                let mut formatted = year.to_string();

                let month = text_of(&article_date.Month);
                if !month.is_empty() {
                    date.month = month.to_string();
                    formatted.push_str(&format!("-{:0>2}", month));

                    let day = text_of(&article_date.Day);
                    if !day.is_empty() {
                        date.day = day.to_string();
                        formatted.push_str(&format!("-{:0>2}", day));
                    }
                }
                date.article_date = formatted;
            }
        }

        if let Some(pub_date) = body
            .Journal
            .as_ref()
            .and_then(|journal| journal.JournalIssue.as_ref())
            .and_then(|issue| issue.PubDate.as_ref())
        {
            let year = text_of(&pub_date.Year);
            if !year.is_empty() {
                let month = text_of(&pub_date.Month);
                date.journal_date = if month.is_empty() {
                    year.to_string()
                } else {
                    format!("{} {}", year, month)
                };
            }
        }

        date
    }

    fn normalize_abstract(body: &Article) -> AbstractInfo {
        let Some(info) = body.Abstract.as_ref() else {
            return AbstractInfo::default();
        };

        let mut full_text = Vec::new();
        let mut sections = Vec::new();

        for part in &info.texts {
            let text = part.value.clone().unwrap_or_default();
            match part.label.as_deref().filter(|label| !label.is_empty()) {
                Some(label) => {
                    full_text.push(format!("{}: {}", label, text));
                    sections.push(AbstractSection {
                        label: label.to_string(),
                        text,
                    });
                }
                None => full_text.push(text),
            }
        }

        AbstractInfo {
            text: full_text.join(" "),
            sections,
        }
    }

    /// Collect upstream identifiers and derive resolver URLs for the common
    /// types.
    fn normalize_article_ids(article: &PubmedArticle) -> BTreeMap<String, String> {
        let mut ids = BTreeMap::new();

        let Some(list) = article
            .PubmedData
            .as_ref()
            .and_then(|data| data.ArticleIdList.as_ref())
        else {
            return ids;
        };

        for id in &list.ids {
            let Some(id_type) = id.id_type.as_deref().filter(|t| !t.is_empty()) else {
                continue;
            };
            let value = id.value.clone().unwrap_or_default();

            if id_type == "doi" {
                ids.insert("doi_url".to_string(), format!("https://doi.org/{}", value));
            } else if id_type == "pmc" {
                ids.insert(
                    "pmc_url".to_string(),
                    format!("https://www.ncbi.nlm.nih.gov/pmc/articles/{}/", value),
                );
            }
            ids.insert(id_type.to_string(), value);
        }

        ids
    }

    fn normalize_mesh_terms(article: &PubmedArticle) -> Vec<MeshTerm> {
        let Some(list) = article
            .MedlineCitation
            .as_ref()
            .and_then(|citation| citation.MeshHeadingList.as_ref())
        else {
            return Vec::new();
        };

        list.headings
            .iter()
            .filter_map(|heading| {
                let descriptor = heading.DescriptorName.as_ref()?;
                Some(MeshTerm {
                    descriptor: descriptor.text().to_string(),
                    major_topic: descriptor.is_major(),
                    qualifiers: heading
                        .qualifiers
                        .iter()
                        .map(|qualifier| MeshQualifier {
                            name: qualifier.text().to_string(),
                            major_topic: qualifier.is_major(),
                        })
                        .collect(),
                })
            })
            .collect()
    }

    fn normalize_grants(body: &Article) -> Vec<GrantRecord> {
        let Some(list) = body.GrantList.as_ref() else {
            return Vec::new();
        };

        list.grants
            .iter()
            .filter_map(|grant| {
                let record = GrantRecord {
                    grant_id: text_of(&grant.GrantID).to_string(),
                    agency: text_of(&grant.Agency).to_string(),
                    country: text_of(&grant.Country).to_string(),
                };
                if record.grant_id.is_empty()
                    && record.agency.is_empty()
                    && record.country.is_empty()
                {
                    None
                } else {
                    Some(record)
                }
            })
            .collect()
    }

    /// Normalize one article into a detailed record, or `None` when the
    /// PMID (or the whole Article element) is missing.
    fn normalize_detailed(
        article: &PubmedArticle,
        request: &ArticleFetchRequest,
    ) -> Option<ArticleRecord> {
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

        let article_ids = Self::normalize_article_ids(article);
        let doi_url = article_ids.get("doi_url").cloned().unwrap_or_default();
        let pmc_url = article_ids.get("pmc_url").cloned().unwrap_or_default();

        let language = body
            .languages
            .first()
            .map(|node| node.text())
            .filter(|text| !text.is_empty())
            .unwrap_or("eng")
            .to_string();

        let keywords = citation
            .KeywordList
            .as_ref()
            .map(|list| {
                list.keywords
                    .iter()
                    .map(|node| node.text().to_string())
                    .filter(|text| !text.is_empty())
                    .collect()
            })
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

        let mesh_terms = if request.include_mesh_terms {
            Self::normalize_mesh_terms(article)
        } else {
            Vec::new()
        };

        let grants = if request.include_grants {
            Self::normalize_grants(body)
        } else {
            Vec::new()
        };

        Some(ArticleRecord {
            urls: ArticleUrls {
                pubmed: format!("https://pubmed.ncbi.nlm.nih.gov/{}/", pmid),
                doi: doi_url,
                pmc: pmc_url,
            },
            title,
            authors: Self::normalize_authors(body),
            journal: Self::normalize_journal(body),
            publication_date: Self::normalize_publication_date(body),
            r#abstract: Self::normalize_abstract(body),
            article_ids,
            publication_types,
            language,
            keywords,
            mesh_terms,
            grants,
            // efetch does not expose reference lists.
            references: Vec::new(),
            conflict_of_interest: text_of(&citation.CoiStatement).to_string(),
            fetch_timestamp: Utc::now().to_rfc3339(),
            pmid,
        })
    }

    async fn run(
        &self,
        request: &ArticleFetchRequest,
        kb: Option<&dyn KnowledgeStore>,
    ) -> Result<ToolResponse, ConnectorError> {
        if request.pmids.is_empty() {
            return Err(ConnectorError::InvalidRequest(
                "At least one PMID must be provided".to_string(),
            ));
        }

        let valid_pmids = self.validate_pmids(&request.pmids);
        if valid_pmids.is_empty() {
            return Err(ConnectorError::InvalidRequest(
                "No valid PMIDs provided. PMIDs must be numeric.".to_string(),
            ));
        }

        tracing::info!(
            pmids = ?valid_pmids,
            include_mesh = request.include_mesh_terms,
            include_grants = request.include_grants,
            "ncbi_fetch_started"
        );

        // Per-article cache gate: fetch only the misses.
        let mut cached_articles: Vec<Value> = Vec::new();
        let mut pmids_to_fetch: Vec<String> = Vec::new();

        if let Some(store) = kb {
            for pmid in &valid_pmids {
                match store.get_item_by_uri(&article_cache_uri(pmid)).await {
                    Some(entry) => {
                        tracing::info!(pmid = %pmid, "ncbi_fetch_cache_hit");
                        cached_articles.push(entry.content);
                    }
                    None => pmids_to_fetch.push(pmid.clone()),
                }
            }
        } else {
            pmids_to_fetch = valid_pmids.clone();
        }

        let mut fetched_articles: Vec<ArticleRecord> = Vec::new();
        if !pmids_to_fetch.is_empty() {
            let params = vec![
                ("db".to_string(), "pubmed".to_string()),
                ("id".to_string(), pmids_to_fetch.join(",")),
                ("retmode".to_string(), "xml".to_string()),
                ("rettype".to_string(), "full".to_string()),
            ];
            let url = format!("{}/efetch.fcgi?{}", self.base_url, encode_query(&params));
            let xml = self.client.get_text(&url, self.timeout, PROVIDER).await?;

            let article_set: PubmedArticleSet =
                from_str(&xml).map_err(|e| ConnectorError::Parse(format!("efetch XML: {}", e)))?;

            for article in &article_set.articles {
                match Self::normalize_detailed(article, request) {
                    Some(record) => fetched_articles.push(record),
                    None => {
                        tracing::warn!("detailed_article_parse_skipped");
                    }
                }
            }
        }

        let articles_found = cached_articles.len() + fetched_articles.len();
        if articles_found == 0 {
            let payload = serde_json::json!({
                "pmids_requested": valid_pmids,
                "articles_found": 0,
                "articles": [],
                "message": "No articles found for the provided PMIDs",
            });
            return Ok(ToolResponse::success(payload));
        }

        // One proposed write per newly fetched article, keyed by the same
        // URI the cache gate reads.
        let mut items = Vec::new();
        for record in &fetched_articles {
            let title: String = record.title.chars().take(METADATA_TITLE_LIMIT).collect();
            items.push(KnowledgeItem {
                item_type: ITEM_TYPE.to_string(),
                content: serde_json::to_value(record)?,
                source_uri: article_cache_uri(&record.pmid),
                metadata: serde_json::json!({
                    "pmid": record.pmid,
                    "title": title,
                    "fetch_type": "detailed_article",
                    "fetch_timestamp": record.fetch_timestamp,
                }),
            });
        }

        let mut articles = cached_articles;
        let newly_fetched = fetched_articles.len();
        for record in &fetched_articles {
            articles.push(serde_json::to_value(record)?);
        }

        let payload = ArticleFetchPayload {
            pmids_requested: valid_pmids,
            articles_found,
            articles,
            fetch_metadata: FetchMetadata {
                cached_articles: articles_found - newly_fetched,
                newly_fetched,
                fetch_timestamp: Utc::now().to_rfc3339(),
            },
        };

        Ok(ToolResponse::success(serde_json::to_value(&payload)?).with_knowledge_items(items))
    }
}

#[derive(Debug, Serialize)]
struct FetchMetadata {
    cached_articles: usize,
    newly_fetched: usize,
    fetch_timestamp: String,
}

#[derive(Debug, Serialize)]
struct ArticleFetchPayload {
    pmids_requested: Vec<String>,
    articles_found: usize,
    articles: Vec<Value>,
    fetch_metadata: FetchMetadata,
}

#[async_trait]
impl Connector for PubMedFetchConnector {
    type Request = ArticleFetchRequest;

    fn id(&self) -> &str {
        "ncbi_fetch_article"
    }

    fn name(&self) -> &str {
        "PubMed Article Fetch"
    }

    async fn execute(
        &self,
        request: &ArticleFetchRequest,
        kb: Option<&dyn KnowledgeStore>,
    ) -> ToolResponse {
        match self.run(request, kb).await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(error = %e, kind = e.kind(), "ncbi_fetch_error");
                ToolResponse::from(e)
            }
        }
    }
}
