//! Payload records carried by the analysis stream.
//!
//! Field names mirror the wire format; batches keep their arrival order.

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

/// One regulation the backend judged relevant to the submitted text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegulationEntry {
    pub regulation: String,
    pub description: String,
}

/// Payload of a `regulation` record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegulationBatch {
    pub regulations: Vec<RegulationEntry>,
}

/// One article within a previously named regulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleEntry {
    pub regulation: String,
    pub article: String,
    pub description: String,
}

/// Payload of an `article` record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleBatch {
    pub articles: Vec<ArticleEntry>,
}

/// One citation supporting an article.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Citation {
    pub regulation: String,
    pub article: String,
    #[serde(rename = "citation")]
    pub text: String,
}

/// Payload of a `citation` record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CitationBatch {
    pub citations: Vec<Citation>,
}

/// A source document the retrieval layer matched to a regulation/article
/// pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelatedDocument {
    pub regulation: String,
    pub article: String,
    pub document: DocumentHit,
}

/// Search hit metadata for a related document. Unknown backend fields are
/// ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentHit {
    pub document_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    pub source_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub semantic_identifier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blurb: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub match_highlights: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relevance_explanation: Option<String>,
}

/// Severity the backend assigned to one consideration. Variants are
/// declared in escalation order, so comparisons read naturally
/// (`High > Low`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    /// Case-insensitive; `"High"`, `"HIGH"` and `"high"` all parse.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.to_ascii_lowercase().as_str() {
            "high" => Some(Severity::High),
            "medium" => Some(Severity::Medium),
            "low" => Some(Severity::Low),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Severity::High => "high",
            Severity::Medium => "medium",
            Severity::Low => "low",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// Model output does not reliably lowercase severities, so they are matched
// case-insensitively.
impl<'de> Deserialize<'de> for Severity {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Severity::parse(&raw).ok_or_else(|| {
            serde::de::Error::unknown_variant(&raw, &["high", "medium", "low"])
        })
    }
}

/// One flagged segment of the submitted text, with analysis and guidance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Consideration {
    pub text_segment: String,
    pub regulation: String,
    pub article: String,
    pub analysis: String,
    pub severity: Severity,
    pub recommended_action: String,
}

/// Payload of a `summary` record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    #[serde(default)]
    pub considerations: Vec<Consideration>,
}

/// Wire envelope around [`Summary`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryEnvelope {
    pub summary: Summary,
}
