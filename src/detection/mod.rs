/// Detection module
///
/// Scene classification and the capability interface to the vision pipeline.
///
/// ## Architecture
///
/// ```text
/// MatchTracker (state machine)
///   └── VisionBackend (capability trait)
///         ├── SceneClassifier (frame -> SceneLabel)
///         ├── crop geometry  (frame -> per-slot images)
///         └── OCR            (images -> ids / digits / result)
/// SceneEdge sits beside the tracker and turns the re-reported
/// BlackTransition level into a one-tick rising edge.
/// ```

pub mod backend;
pub mod classifier;
pub mod scene;

// Re-export commonly used types
pub use backend::{RegionKind, VisionBackend};
pub use classifier::SceneClassifier;
pub use scene::{SceneEdge, SceneLabel};
