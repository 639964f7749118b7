pub mod event;
pub mod model;

// Re-export the event types at the crate root for convenience
pub use event::AnalysisEvent;
pub use event::EventKind;
