//! Normalized PubMed article records.
//!
//! Two shapes exist: [`ArticleSummary`] is the flat record produced by the
//! search connector, [`ArticleRecord`] is the comprehensive record produced
//! by the detail-fetch connector. As with studies, every field is
//! serde-defaulted so keys are never absent.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A flat article record from a PubMed search.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArticleSummary {
    /// PubMed identifier (mandatory; records without one are dropped)
    #[serde(default)]
    pub pmid: String,

    #[serde(default)]
    pub title: String,

    /// Author display names ("Last, First"), capped at the first ten
    #[serde(default)]
    pub authors: Vec<String>,

    #[serde(default)]
    pub journal: String,

    #[serde(default)]
    pub publication_date: String,

    #[serde(default)]
    pub r#abstract: String,

    #[serde(default)]
    pub doi: String,

    #[serde(default)]
    pub publication_types: Vec<String>,

    /// Canonical article URL, derived from the PMID
    #[serde(default)]
    pub pubmed_url: String,

    /// DOI resolver URL; empty when the article has no DOI
    #[serde(default)]
    pub doi_url: String,
}

/// A comprehensive article record from a detail fetch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArticleRecord {
    #[serde(default)]
    pub pmid: String,

    #[serde(default)]
    pub title: String,

    /// Detailed author records, capped at the first ten
    #[serde(default)]
    pub authors: Vec<AuthorRecord>,

    #[serde(default)]
    pub journal: JournalInfo,

    #[serde(default)]
    pub publication_date: PublicationDate,

    #[serde(default)]
    pub r#abstract: AbstractInfo,

    /// All upstream identifiers keyed by type (doi, pmc, pubmed, ...), plus
    /// derived `doi_url`/`pmc_url` entries
    #[serde(default)]
    pub article_ids: BTreeMap<String, String>,

    #[serde(default)]
    pub publication_types: Vec<String>,

    /// Article language; "eng" when upstream omits it
    #[serde(default)]
    pub language: String,

    /// Author-supplied keywords
    #[serde(default)]
    pub keywords: Vec<String>,

    /// MeSH descriptors; empty when not requested
    #[serde(default)]
    pub mesh_terms: Vec<MeshTerm>,

    /// Grant/funding records; empty when not requested
    #[serde(default)]
    pub grants: Vec<GrantRecord>,

    /// Always empty: efetch does not expose reference lists
    #[serde(default)]
    pub references: Vec<String>,

    #[serde(default)]
    pub conflict_of_interest: String,

    #[serde(default)]
    pub urls: ArticleUrls,

    /// RFC 3339 timestamp of the fetch
    #[serde(default)]
    pub fetch_timestamp: String,
}

/// One article author.
///
/// Authors without a last name are skipped during normalization; one
/// author's failure never invalidates the article.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuthorRecord {
    #[serde(default)]
    pub last_name: String,

    #[serde(default)]
    pub first_name: String,

    #[serde(default)]
    pub initials: String,

    /// "Last, First" (or "Last, Initials" when the fore name is missing)
    #[serde(default)]
    pub full_name: String,

    #[serde(default)]
    pub affiliation: String,
}

/// Journal metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JournalInfo {
    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub iso_abbreviation: String,

    #[serde(default)]
    pub issn: String,

    #[serde(default)]
    pub issn_type: String,

    #[serde(default)]
    pub volume: String,

    #[serde(default)]
    pub issue: String,
}

/// Publication date information from both the electronic article date and
/// the journal issue date.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PublicationDate {
    #[serde(default)]
    pub year: String,

    #[serde(default)]
    pub month: String,

    #[serde(default)]
    pub day: String,

    /// Electronic article date as `YYYY[-MM[-DD]]`, zero-padded
    #[serde(default)]
    pub article_date: String,

    /// Journal issue date as `YYYY[ Month]`
    #[serde(default)]
    pub journal_date: String,
}

/// Abstract text with its labeled sections, when the abstract is
/// structured.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AbstractInfo {
    /// Full abstract text; labeled sections are joined as "Label: text"
    #[serde(default)]
    pub text: String,

    /// Labeled sections, in document order; empty for unstructured
    /// abstracts
    #[serde(default)]
    pub sections: Vec<AbstractSection>,
}

/// One labeled section of a structured abstract.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AbstractSection {
    #[serde(default)]
    pub label: String,

    #[serde(default)]
    pub text: String,
}

/// A MeSH heading.
///
/// The qualifier list is always present, even when the heading carries
/// none.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeshTerm {
    #[serde(default)]
    pub descriptor: String,

    #[serde(default)]
    pub major_topic: bool,

    #[serde(default)]
    pub qualifiers: Vec<MeshQualifier>,
}

/// A qualifier attached to a MeSH heading.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeshQualifier {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub major_topic: bool,
}

/// Grant/funding information.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GrantRecord {
    #[serde(default)]
    pub grant_id: String,

    #[serde(default)]
    pub agency: String,

    #[serde(default)]
    pub country: String,
}

/// Derived article URLs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArticleUrls {
    /// Canonical PubMed page, derived from the PMID
    #[serde(default)]
    pub pubmed: String,

    /// DOI resolver URL; empty without a DOI
    #[serde(default)]
    pub doi: String,

    /// PubMed Central URL; empty without a PMC ID
    #[serde(default)]
    pub pmc: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_serializes_all_keys() {
        let summary = ArticleSummary {
            pmid: "12345678".to_string(),
            ..Default::default()
        };
        let value = serde_json::to_value(&summary).unwrap();
        let obj = value.as_object().unwrap();
        assert_eq!(obj["pmid"], "12345678");
        assert_eq!(obj["abstract"], "");
        assert_eq!(obj["authors"], serde_json::json!([]));
        assert!(obj.contains_key("doi_url"));
    }

    #[test]
    fn test_mesh_term_without_qualifiers_keeps_empty_list() {
        let term = MeshTerm {
            descriptor: "Melanoma".to_string(),
            major_topic: true,
            qualifiers: Vec::new(),
        };
        let value = serde_json::to_value(&term).unwrap();
        assert_eq!(value["qualifiers"], serde_json::json!([]));
    }

    #[test]
    fn test_record_roundtrip() {
        let record = ArticleRecord {
            pmid: "1".to_string(),
            language: "eng".to_string(),
            ..Default::default()
        };
        let value = serde_json::to_value(&record).unwrap();
        let back: ArticleRecord = serde_json::from_value(value).unwrap();
        assert_eq!(back, record);
    }
}
