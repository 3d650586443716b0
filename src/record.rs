/// Per-match record accumulation and the append-only match log
///
/// One record is open at a time. It fills up incrementally across the
/// select / battle / result phases and is flushed (appended to
/// `match_log.txt`, then reset) exactly once per completed or abandoned
/// match, so nothing ever leaks into the next match's record.
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use crate::error::RecordError;

/// Team size in ranked battles
pub const TEAM_SIZE: usize = 6;

/// Outcome of one battle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchOutcome {
    Win,
    Loss,
    /// Result screen not recognized, or match abandoned before it appeared
    Unknown,
}

impl MatchOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchOutcome::Win => "win",
            MatchOutcome::Loss => "loss",
            MatchOutcome::Unknown => "unknown",
        }
    }
}

impl Default for MatchOutcome {
    fn default() -> Self {
        MatchOutcome::Unknown
    }
}

/// Accumulated data for the match in progress
#[derive(Debug, Clone)]
pub struct MatchRecord {
    /// Opponent species per slot; empty string = not recognized
    pub opponents: [String; TEAM_SIZE],
    /// Draft order shown on each of our slots; -1 = unassigned
    pub selection_order: [i8; TEAM_SIZE],
    pub outcome: MatchOutcome,
}

impl MatchRecord {
    pub fn new() -> Self {
        Self {
            opponents: Default::default(),
            selection_order: [-1; TEAM_SIZE],
            outcome: MatchOutcome::Unknown,
        }
    }

    /// Clear everything back to the freshly-created state
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn is_empty(&self) -> bool {
        self.opponents.iter().all(|s| s.is_empty())
            && self.selection_order.iter().all(|&o| o < 0)
            && self.outcome == MatchOutcome::Unknown
    }

    /// One tab-separated log line: 6 opponent ids, 6 draft orders, outcome.
    /// Unrecognized opponents are written as `-` so columns stay aligned.
    pub fn to_log_line(&self) -> String {
        let mut fields: Vec<String> = Vec::with_capacity(TEAM_SIZE * 2 + 1);
        for id in &self.opponents {
            fields.push(if id.is_empty() {
                "-".to_string()
            } else {
                id.clone()
            });
        }
        for order in &self.selection_order {
            fields.push(order.to_string());
        }
        fields.push(self.outcome.as_str().to_string());
        fields.join("\t")
    }

    /// Append this record as one line to the match log
    pub fn append_to(&self, log_file: &Path) -> Result<(), RecordError> {
        if let Some(parent) = log_file.parent() {
            std::fs::create_dir_all(parent).map_err(|source| RecordError::AppendFailed {
                path: log_file.display().to_string(),
                source,
            })?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_file)
            .map_err(|source| RecordError::AppendFailed {
                path: log_file.display().to_string(),
                source,
            })?;

        writeln!(file, "{}", self.to_log_line()).map_err(|source| RecordError::AppendFailed {
            path: log_file.display().to_string(),
            source,
        })
    }
}

impl Default for MatchRecord {
    fn default() -> Self {
        Self::new()
    }
}
