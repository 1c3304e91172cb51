//! RondaGuard round-execution core.
//!
//! Owns the lifecycle of a single timed inspection round: a guarded state
//! machine with a one-second tick clock, a free-hand signature capture
//! surface, and the pure builder that freezes a finished session into an
//! immutable, tokenized round log for persistence and reporting. Storage,
//! authentication and document layout live behind the [`boundary`] traits.

pub mod boundary;
pub mod error;
pub mod models;
pub mod record;
pub mod report;
pub mod round;
pub mod signature;
pub mod utils;

pub use boundary::{ReportRenderer, RoundLogSink};
pub use error::{RoundError, SignatureError};
pub use models::{ChecklistItem, ChecklistItemDef, PhotoPayload, RoundLog, TaskDefinition};
pub use record::{build_round_log, validation_token};
pub use round::{RoundController, RoundPhase, RoundSnapshot, RoundState};
pub use signature::{Point, PointerEvent, SignaturePad, SurfaceFrame};
