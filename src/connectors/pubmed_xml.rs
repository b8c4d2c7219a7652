//! Serde tree for E-utilities efetch XML.
//!
//! Element and attribute names mirror the PubMed DTD, hence the
//! non-snake-case. Every level is `Option` or a defaulted `Vec`: the
//! normalizers downstream default whatever is missing instead of erroring,
//! and unknown elements are skipped by serde.

use serde::Deserialize;

/// An element whose text content is all we keep. Child markup inside the
/// element is ignored.
#[derive(Debug, Default, Deserialize)]
pub struct TextNode {
    #[serde(rename = "$text", default)]
    pub value: Option<String>,
}

impl TextNode {
    /// The trimmed text content, or `""`.
    pub fn text(&self) -> &str {
        self.value.as_deref().map(str::trim).unwrap_or("")
    }
}

/// Text content of an optional element, or `""`.
pub fn text_of(node: &Option<TextNode>) -> &str {
    node.as_ref().map(TextNode::text).unwrap_or("")
}

#[derive(Debug, Deserialize)]
#[allow(non_snake_case)]
pub struct PubmedArticleSet {
    #[serde(rename = "PubmedArticle", default)]
    pub articles: Vec<PubmedArticle>,
}

#[derive(Debug, Default, Deserialize)]
#[allow(non_snake_case)]
pub struct PubmedArticle {
    pub MedlineCitation: Option<MedlineCitation>,
    pub PubmedData: Option<PubmedData>,
}

#[derive(Debug, Default, Deserialize)]
#[allow(non_snake_case)]
pub struct MedlineCitation {
    pub PMID: Option<TextNode>,
    pub Article: Option<Article>,
    pub MeshHeadingList: Option<MeshHeadingList>,
    pub KeywordList: Option<KeywordList>,
    pub CoiStatement: Option<TextNode>,
}

#[derive(Debug, Default, Deserialize)]
#[allow(non_snake_case)]
pub struct Article {
    pub Journal: Option<Journal>,
    pub ArticleTitle: Option<TextNode>,
    pub Abstract: Option<Abstract>,
    pub AuthorList: Option<AuthorList>,
    // Language can repeat; the first one wins downstream.
    #[serde(rename = "Language", default)]
    pub languages: Vec<TextNode>,
    pub PublicationTypeList: Option<PublicationTypeList>,
    pub GrantList: Option<GrantList>,
    pub ArticleDate: Option<DateParts>,
}

#[derive(Debug, Default, Deserialize)]
#[allow(non_snake_case)]
pub struct Journal {
    pub Title: Option<TextNode>,
    pub ISOAbbreviation: Option<TextNode>,
    pub ISSN: Option<Issn>,
    pub JournalIssue: Option<JournalIssue>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Issn {
    #[serde(rename = "@IssnType", default)]
    pub issn_type: Option<String>,

    #[serde(rename = "$text", default)]
    pub value: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[allow(non_snake_case)]
pub struct JournalIssue {
    pub Volume: Option<TextNode>,
    pub Issue: Option<TextNode>,
    pub PubDate: Option<PubDate>,
}

#[derive(Debug, Default, Deserialize)]
#[allow(non_snake_case)]
pub struct PubDate {
    pub Year: Option<TextNode>,
    pub Month: Option<TextNode>,
}

#[derive(Debug, Default, Deserialize)]
#[allow(non_snake_case)]
pub struct DateParts {
    pub Year: Option<TextNode>,
    pub Month: Option<TextNode>,
    pub Day: Option<TextNode>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Abstract {
    #[serde(rename = "AbstractText", default)]
    pub texts: Vec<AbstractText>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AbstractText {
    #[serde(rename = "@Label", default)]
    pub label: Option<String>,

    #[serde(rename = "$text", default)]
    pub value: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AuthorList {
    #[serde(rename = "Author", default)]
    pub authors: Vec<Author>,
}

#[derive(Debug, Default, Deserialize)]
#[allow(non_snake_case)]
pub struct Author {
    pub LastName: Option<TextNode>,
    pub ForeName: Option<TextNode>,
    pub Initials: Option<TextNode>,
    pub CollectiveName: Option<TextNode>,
    // AffiliationInfo repeats; only the first affiliation is kept.
    #[serde(rename = "AffiliationInfo", default)]
    pub affiliations: Vec<AffiliationInfo>,
}

#[derive(Debug, Default, Deserialize)]
#[allow(non_snake_case)]
pub struct AffiliationInfo {
    pub Affiliation: Option<TextNode>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PublicationTypeList {
    #[serde(rename = "PublicationType", default)]
    pub types: Vec<TextNode>,
}

#[derive(Debug, Default, Deserialize)]
pub struct KeywordList {
    #[serde(rename = "Keyword", default)]
    pub keywords: Vec<TextNode>,
}

#[derive(Debug, Default, Deserialize)]
pub struct MeshHeadingList {
    #[serde(rename = "MeshHeading", default)]
    pub headings: Vec<MeshHeading>,
}

#[derive(Debug, Default, Deserialize)]
#[allow(non_snake_case)]
pub struct MeshHeading {
    pub DescriptorName: Option<TopicName>,

    #[serde(rename = "QualifierName", default)]
    pub qualifiers: Vec<TopicName>,
}

/// A descriptor or qualifier name with its major-topic marker.
#[derive(Debug, Default, Deserialize)]
pub struct TopicName {
    #[serde(rename = "@MajorTopicYN", default)]
    pub major_topic: Option<String>,

    #[serde(rename = "$text", default)]
    pub value: Option<String>,
}

impl TopicName {
    /// The name text, or `""`.
    pub fn text(&self) -> &str {
        self.value.as_deref().map(str::trim).unwrap_or("")
    }

    /// Whether `MajorTopicYN` is `"Y"`.
    pub fn is_major(&self) -> bool {
        self.major_topic.as_deref() == Some("Y")
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct GrantList {
    #[serde(rename = "Grant", default)]
    pub grants: Vec<Grant>,
}

#[derive(Debug, Default, Deserialize)]
#[allow(non_snake_case)]
pub struct Grant {
    pub GrantID: Option<TextNode>,
    pub Agency: Option<TextNode>,
    pub Country: Option<TextNode>,
}

#[derive(Debug, Default, Deserialize)]
#[allow(non_snake_case)]
pub struct PubmedData {
    pub ArticleIdList: Option<ArticleIdList>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ArticleIdList {
    #[serde(rename = "ArticleId", default)]
    pub ids: Vec<ArticleId>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ArticleId {
    #[serde(rename = "@IdType", default)]
    pub id_type: Option<String>,

    #[serde(rename = "$text", default)]
    pub value: Option<String>,
}
