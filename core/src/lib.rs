//! Root of the `reglens-core` library.

// Prevent accidental direct writes to stdout/stderr in library code. All
// user-visible output must go through the CLI renderer or the tracing stack.
#![deny(clippy::print_stdout, clippy::print_stderr)]

pub mod client;
pub mod decoder;
pub mod highlight;
pub mod index;
pub mod session;
pub mod sse;

// Re-export the protocol crate so consumers only need one dependency.
pub use reglens_protocol as protocol;

pub use client::ANALYZE_PATH;
pub use client::AnalysisClient;
pub use client::AnalysisStream;
pub use client::StreamError;
pub use client::drive;
pub use client::pump_events;
pub use decoder::DecodeError;
pub use decoder::decode_record;
pub use highlight::AnnotatedText;
pub use highlight::HighlightSpan;
pub use highlight::HighlightStyle;
pub use highlight::Segment;
pub use highlight::annotate;
pub use index::ArticleNode;
pub use index::RegulationIndex;
pub use index::RegulationNode;
pub use index::Unresolved;
pub use session::AnalysisMessage;
pub use session::AnalysisOutcome;
pub use session::AnalysisStatus;
pub use session::MessageId;
pub use session::SessionError;
pub use session::Transcript;
pub use session::TranscriptEntry;
pub use session::UserMessage;
pub use sse::FrameSplitter;
