/// Match phase state
///
/// Represents where we are in the lifecycle of one ranked battle. Exactly one
/// phase is active at a time; `Unknown` is both the initial state and the
/// state every completed match returns to.

/// Phase of the monitored match
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum MatchPhase {
    /// Nothing recognized yet, or between matches
    Unknown,

    /// Select screen just appeared; debouncing before committing (transitional)
    EnteringSelect,

    /// Team select / draft screen confirmed
    Select,

    /// Black transition out of select observed; waiting for the edge into
    /// the battle itself (transitional)
    EnteringMatch,

    /// Battle in progress
    Match,

    /// Battle ended; waiting for the result screen to render (transitional)
    Result,
}

impl MatchPhase {
    /// Check if this phase exists purely to apply debounce/edge logic
    pub fn is_transitional(&self) -> bool {
        matches!(
            self,
            MatchPhase::EnteringSelect | MatchPhase::EnteringMatch | MatchPhase::Result
        )
    }

    /// Check if a battle is currently running
    pub fn in_battle(&self) -> bool {
        matches!(self, MatchPhase::Match)
    }

    /// Name used in transition log lines
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchPhase::Unknown => "UNKNOWN",
            MatchPhase::EnteringSelect => "ENTERING_SELECT",
            MatchPhase::Select => "SELECT",
            MatchPhase::EnteringMatch => "ENTERING_MATCH",
            MatchPhase::Match => "MATCH",
            MatchPhase::Result => "RESULT",
        }
    }
}

impl Default for MatchPhase {
    fn default() -> Self {
        MatchPhase::Unknown
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_predicates() {
        assert!(MatchPhase::EnteringSelect.is_transitional());
        assert!(MatchPhase::EnteringMatch.is_transitional());
        assert!(MatchPhase::Result.is_transitional());

        assert!(!MatchPhase::Unknown.is_transitional());
        assert!(!MatchPhase::Select.is_transitional());
        assert!(!MatchPhase::Match.is_transitional());

        assert!(MatchPhase::Match.in_battle());
        assert!(!MatchPhase::Select.in_battle());
    }

    #[test]
    fn test_default_phase() {
        assert_eq!(MatchPhase::default(), MatchPhase::Unknown);
    }

    #[test]
    fn test_phase_names() {
        assert_eq!(MatchPhase::Unknown.as_str(), "UNKNOWN");
        assert_eq!(MatchPhase::EnteringSelect.as_str(), "ENTERING_SELECT");
        assert_eq!(MatchPhase::Result.as_str(), "RESULT");
    }
}
