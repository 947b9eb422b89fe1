//! Stage-transition engine for the deal pipeline.
//!
//! Owns the in-memory working set of deals, validates proposed stage
//! moves, applies them optimistically ahead of persistence, and keeps a
//! bounded history of completed moves so the most recent ones can be
//! undone. The record store remains the source of truth; `load`
//! replaces the working set wholesale with the store's snapshot.

pub mod engine;
pub mod history;
pub mod notify;
pub mod stage;

pub use engine::{
    Board, EngineError, EngineState, MoveOutcome, PipelineEngine, StageColumn, StageSummary,
    UndoOutcome,
};
pub use history::{MoveHistory, MoveId, MoveRecord, UNDO_DEPTH};
pub use notify::{NotificationId, NotificationSink, TracingSink};
pub use stage::transition_allowed;
