//! Decoding of individual stream records into typed events.

use reglens_protocol::AnalysisEvent;
use reglens_protocol::event::RawRecord;
use reglens_protocol::model::ArticleBatch;
use reglens_protocol::model::CitationBatch;
use reglens_protocol::model::RegulationBatch;
use reglens_protocol::model::RelatedDocument;
use reglens_protocol::model::SummaryEnvelope;
use serde_json::Value;
use thiserror::Error;

/// Failure to decode one record. Always contained to the offending line;
/// the stream continues past it.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("malformed record envelope: {0}")]
    Envelope(#[source] serde_json::Error),
    #[error("malformed `{kind}` payload: {source}")]
    Payload {
        kind: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("unknown record kind `{0}`")]
    UnknownKind(String),
}

/// Decodes one payload line into a typed [`AnalysisEvent`].
///
/// The `content` field arrives as a JSON-encoded string for model-generated
/// kinds and as a plain object for `related_document`; both forms are
/// accepted for every kind.
pub fn decode_record(payload: &str) -> Result<AnalysisEvent, DecodeError> {
    let record: RawRecord = serde_json::from_str(payload).map_err(DecodeError::Envelope)?;
    match record.kind.as_str() {
        "regulation" => {
            let batch: RegulationBatch = decode_content("regulation", record.content)?;
            Ok(AnalysisEvent::Regulations(batch.regulations))
        }
        "article" => {
            let batch: ArticleBatch = decode_content("article", record.content)?;
            Ok(AnalysisEvent::Articles(batch.articles))
        }
        "citation" => {
            let batch: CitationBatch = decode_content("citation", record.content)?;
            Ok(AnalysisEvent::Citations(batch.citations))
        }
        "related_document" => {
            let document: RelatedDocument = decode_content("related_document", record.content)?;
            Ok(AnalysisEvent::RelatedDocument(document))
        }
        "summary" => {
            let envelope: SummaryEnvelope = decode_content("summary", record.content)?;
            Ok(AnalysisEvent::Summary(envelope.summary))
        }
        "error" => Ok(AnalysisEvent::Error(error_message(record.content))),
        _ => Err(DecodeError::UnknownKind(record.kind)),
    }
}

/// Interprets a `content` value as `T`, unwrapping the JSON-encoded string
/// form first when present.
fn decode_content<T>(kind: &'static str, content: Value) -> Result<T, DecodeError>
where
    T: serde::de::DeserializeOwned,
{
    let structured = match content {
        Value::String(raw) => {
            serde_json::from_str(&raw).map_err(|source| DecodeError::Payload { kind, source })?
        }
        other => other,
    };
    serde_json::from_value(structured).map_err(|source| DecodeError::Payload { kind, source })
}

/// The `error` kind carries a plain message rather than nested JSON.
fn error_message(content: Value) -> String {
    match content {
        Value::String(message) => message,
        other => other.to_string(),
    }
}
