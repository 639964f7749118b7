//! Session transcript of submitted texts and their analysis messages.

use std::fmt;

use chrono::DateTime;
use chrono::Utc;
use reglens_protocol::AnalysisEvent;
use reglens_protocol::model::Consideration;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::highlight::AnnotatedText;
use crate::highlight::annotate;
use crate::index::RegulationIndex;

/// Identifier of one analysis message within a transcript.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct MessageId(Uuid);

impl MessageId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// How a finished analysis ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisOutcome {
    /// End of stream reached with no failure.
    Completed,
    /// Transport failure or backend `error` record.
    Failed { reason: String },
    /// Cancelled mid-stream; events received so far are retained.
    Interrupted,
}

/// Lifecycle status of an analysis message. Moves from `InProgress` to
/// `Done` exactly once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisStatus {
    InProgress,
    Done(AnalysisOutcome),
}

impl AnalysisStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, AnalysisStatus::Done(_))
    }

    /// User-visible text for the message footer.
    pub fn display_text(&self) -> String {
        match self {
            AnalysisStatus::InProgress => "analyzing...".to_string(),
            AnalysisStatus::Done(AnalysisOutcome::Completed) => "analysis complete".to_string(),
            AnalysisStatus::Done(AnalysisOutcome::Failed { reason }) => format!("error: {reason}"),
            AnalysisStatus::Done(AnalysisOutcome::Interrupted) => {
                "error: analysis interrupted".to_string()
            }
        }
    }
}

/// Misuse of the transcript API.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("unknown analysis message `{0}`")]
    UnknownMessage(MessageId),
    #[error("analysis message `{0}` already reached a terminal state")]
    AlreadyTerminal(MessageId),
}

/// A text the user submitted for analysis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserMessage {
    pub text: String,
    pub submitted_at: DateTime<Utc>,
}

/// One analysis response, owning the ordered event history that feeds the
/// derived views.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisMessage {
    id: MessageId,
    originating_text: String,
    events: Vec<AnalysisEvent>,
    status: AnalysisStatus,
    started_at: DateTime<Utc>,
}

impl AnalysisMessage {
    fn new(originating_text: String) -> Self {
        Self {
            id: MessageId::new(),
            originating_text,
            events: Vec::new(),
            status: AnalysisStatus::InProgress,
            started_at: Utc::now(),
        }
    }

    pub fn id(&self) -> MessageId {
        self.id
    }

    pub fn originating_text(&self) -> &str {
        &self.originating_text
    }

    pub fn events(&self) -> &[AnalysisEvent] {
        &self.events
    }

    pub fn status(&self) -> &AnalysisStatus {
        &self.status
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn display_text(&self) -> String {
        self.status.display_text()
    }

    /// Rebuilds the hierarchical index from the full event history. The
    /// returned value is an owned snapshot; appending further events never
    /// mutates it.
    pub fn index(&self) -> RegulationIndex {
        RegulationIndex::rebuild(&self.events)
    }

    /// The originating text overlaid with highlights from the latest
    /// summary.
    pub fn annotated_text(&self) -> AnnotatedText {
        annotate(&self.originating_text, self.latest_considerations())
    }

    fn latest_considerations(&self) -> &[Consideration] {
        self.events
            .iter()
            .rev()
            .find_map(|event| match event {
                AnalysisEvent::Summary(summary) => Some(summary.considerations.as_slice()),
                _ => None,
            })
            .unwrap_or_default()
    }
}

/// Entries of a transcript, in display order.
#[derive(Debug, Clone, Serialize)]
pub enum TranscriptEntry {
    User(UserMessage),
    Analysis(AnalysisMessage),
}

/// Append-only conversation of user texts and their paired analyses.
#[derive(Debug, Default, Serialize)]
pub struct Transcript {
    entries: Vec<TranscriptEntry>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends the user message and its paired analysis message, which
    /// starts empty and in progress. Returns the analysis message id so a
    /// stream driver can populate it.
    pub fn submit(&mut self, text: impl Into<String>) -> MessageId {
        let text = text.into();
        let message = AnalysisMessage::new(text.clone());
        let id = message.id;
        self.entries.push(TranscriptEntry::User(UserMessage {
            text,
            submitted_at: Utc::now(),
        }));
        self.entries.push(TranscriptEntry::Analysis(message));
        id
    }

    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    pub fn analysis(&self, id: MessageId) -> Option<&AnalysisMessage> {
        self.entries.iter().find_map(|entry| match entry {
            TranscriptEntry::Analysis(message) if message.id == id => Some(message),
            _ => None,
        })
    }

    fn analysis_mut(&mut self, id: MessageId) -> Result<&mut AnalysisMessage, SessionError> {
        self.entries
            .iter_mut()
            .find_map(|entry| match entry {
                TranscriptEntry::Analysis(message) if message.id == id => Some(message),
                _ => None,
            })
            .ok_or(SessionError::UnknownMessage(id))
    }

    /// Appends one decoded event to the message's history. Rejected once
    /// the message is terminal.
    pub fn append_event(&mut self, id: MessageId, event: AnalysisEvent) -> Result<(), SessionError> {
        let message = self.analysis_mut(id)?;
        if message.status.is_terminal() {
            return Err(SessionError::AlreadyTerminal(id));
        }
        message.events.push(event);
        Ok(())
    }

    /// Moves the message to its terminal status. A second call is an error
    /// and leaves the first outcome in place.
    pub fn finalize(
        &mut self,
        id: MessageId,
        outcome: AnalysisOutcome,
    ) -> Result<(), SessionError> {
        let message = self.analysis_mut(id)?;
        if message.status.is_terminal() {
            return Err(SessionError::AlreadyTerminal(id));
        }
        message.status = AnalysisStatus::Done(outcome);
        let unresolved = message.index().unresolved.total();
        if unresolved > 0 {
            tracing::warn!(
                message_id = %id,
                unresolved,
                "analysis ended with unresolved references"
            );
        }
        Ok(())
    }
}
