//! Core data models for requests, normalized records, and responses.

mod article;
mod request;
mod response;
mod study;

pub use article::{
    AbstractInfo, AbstractSection, ArticleRecord, ArticleSummary, ArticleUrls, AuthorRecord,
    GrantRecord, JournalInfo, MeshQualifier, MeshTerm, PublicationDate,
};
pub use request::{
    ArticleFetchRequest, DateRange, LiteratureSearchRequest, SortOrder, TrialSearchRequest,
};
pub use response::{ResponseStatus, ToolResponse};
pub use study::{EligibilitySummary, InterventionRecord, LocationRecord, StudyRecord};
