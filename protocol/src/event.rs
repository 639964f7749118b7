//! Stream records and the decoded events derived from them.

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::model::ArticleEntry;
use crate::model::Citation;
use crate::model::RegulationEntry;
use crate::model::RelatedDocument;
use crate::model::Summary;

/// Kind tag carried by every stream record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Regulation,
    Article,
    Citation,
    Summary,
    RelatedDocument,
    Error,
}

impl EventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::Regulation => "regulation",
            EventKind::Article => "article",
            EventKind::Citation => "citation",
            EventKind::Summary => "summary",
            EventKind::RelatedDocument => "related_document",
            EventKind::Error => "error",
        }
    }
}

/// Raw `{"type", "content"}` record as it appears on the wire, before the
/// content payload has been interpreted.
///
/// `content` is either a JSON object or a JSON-encoded string, depending on
/// the record kind.
#[derive(Debug, Clone, Deserialize)]
pub struct RawRecord {
    #[serde(rename = "type")]
    pub kind: String,
    pub content: Value,
}

/// One decoded unit of analysis data.
///
/// Events are immutable once decoded; aggregate views are derived from the
/// full ordered history rather than mutated in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AnalysisEvent {
    Regulations(Vec<RegulationEntry>),
    Articles(Vec<ArticleEntry>),
    Citations(Vec<Citation>),
    RelatedDocument(RelatedDocument),
    Summary(Summary),
    /// Backend-reported failure; terminates the stream.
    Error(String),
}

impl AnalysisEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            AnalysisEvent::Regulations(_) => EventKind::Regulation,
            AnalysisEvent::Articles(_) => EventKind::Article,
            AnalysisEvent::Citations(_) => EventKind::Citation,
            AnalysisEvent::RelatedDocument(_) => EventKind::RelatedDocument,
            AnalysisEvent::Summary(_) => EventKind::Summary,
            AnalysisEvent::Error(_) => EventKind::Error,
        }
    }
}
