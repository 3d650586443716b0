/// State module
///
/// The match-phase state machine and its timing primitives. Everything here
/// is pure bookkeeping over host-supplied timestamps, so it is fully
/// testable without a screen or an OCR engine.

pub mod match_phase;
pub mod timer;
pub mod tracker;

// Re-export commonly used types
pub use match_phase::MatchPhase;
pub use timer::{Countdown, PhaseTimer, MATCH_DURATION_SECS};
pub use tracker::MatchTracker;
