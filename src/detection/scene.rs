/// Scene labels and transition-edge detection
///
/// The classifier re-reports a label every frame, so anything that must fire
/// once per screen change has to look at edges, not levels.

/// Classification of the current video frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneLabel {
    /// Team preview / draft screen
    SelectPokemon,
    /// Black cross-fade between scenes
    BlackTransition,
    /// Anything we don't recognize
    Unknown,
}

impl SceneLabel {
    /// Short name for log lines
    pub fn as_str(&self) -> &'static str {
        match self {
            SceneLabel::SelectPokemon => "select_pokemon",
            SceneLabel::BlackTransition => "black_transition",
            SceneLabel::Unknown => "unknown",
        }
    }
}

impl Default for SceneLabel {
    fn default() -> Self {
        SceneLabel::Unknown
    }
}

/// Tracks the previously observed scene and exposes the rising edge into
/// the black transition as a one-tick pulse.
#[derive(Debug, Default)]
pub struct SceneEdge {
    prev: SceneLabel,
}

impl SceneEdge {
    pub fn new() -> Self {
        Self {
            prev: SceneLabel::Unknown,
        }
    }

    /// True iff this tick is the first tick the screen turned black.
    /// A held black screen keeps reporting `BlackTransition` but only the
    /// first occurrence counts.
    pub fn entered_transition(&self, current: SceneLabel) -> bool {
        self.prev != SceneLabel::BlackTransition && current == SceneLabel::BlackTransition
    }

    /// Record the scene observed this tick. Must be called exactly once per
    /// non-skipped tick, after the state machine has consulted the edge.
    pub fn observe(&mut self, current: SceneLabel) {
        self.prev = current;
    }

    pub fn prev(&self) -> SceneLabel {
        self.prev
    }
}
