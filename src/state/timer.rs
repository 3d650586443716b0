/// Phase timing
///
/// All debounce decisions in the tracker run off a single state-entry
/// timestamp: host-supplied nanoseconds, monotonically increasing. The
/// countdown derives the on-stream timer text from the match-start time and
/// only produces output when the whole-second value changes.

/// Ranked battles run on a fixed 20 minute clock.
pub const MATCH_DURATION_SECS: u64 = 20 * 60;

const NANOS_PER_SEC: u64 = 1_000_000_000;

/// Records when the current phase was entered and answers elapsed-time
/// predicates against it.
#[derive(Debug, Clone, Copy, Default)]
pub struct PhaseTimer {
    entry_ns: u64,
}

impl PhaseTimer {
    pub fn new() -> Self {
        Self { entry_ns: 0 }
    }

    /// Record entry into a new phase
    pub fn enter(&mut self, now_ns: u64) {
        self.entry_ns = now_ns;
    }

    /// Nanoseconds since the current phase was entered
    pub fn elapsed_ns(&self, now_ns: u64) -> u64 {
        now_ns.saturating_sub(self.entry_ns)
    }

    /// True once at least `secs` whole seconds have passed in this phase
    pub fn elapsed_at_least(&self, now_ns: u64, secs: u64) -> bool {
        self.elapsed_ns(now_ns) > secs * NANOS_PER_SEC
    }
}

/// Remaining-time display, gated to one update per whole second.
///
/// The tracker ticks many times per second; pushing the same `MM:SS` text to
/// the host widget on every tick would be pure waste, so the last displayed
/// second is remembered and only a change produces output.
#[derive(Debug, Clone, Copy)]
pub struct Countdown {
    match_start_ns: u64,
    last_elapsed_secs: u64,
    duration_secs: u64,
}

impl Countdown {
    pub fn new(duration_secs: u64) -> Self {
        Self {
            match_start_ns: 0,
            last_elapsed_secs: 0,
            duration_secs,
        }
    }

    /// Start the clock at the beginning of a battle
    pub fn start(&mut self, now_ns: u64) {
        self.match_start_ns = now_ns;
        self.last_elapsed_secs = 0;
    }

    /// Returns the new `MM:SS` text if the whole-second value changed since
    /// the previous call, `None` otherwise.
    pub fn tick(&mut self, now_ns: u64) -> Option<String> {
        let elapsed_secs = now_ns.saturating_sub(self.match_start_ns) / NANOS_PER_SEC;
        if elapsed_secs == self.last_elapsed_secs {
            return None;
        }
        self.last_elapsed_secs = elapsed_secs;

        let remaining_secs = self.duration_secs.saturating_sub(elapsed_secs);
        Some(format!(
            "{:02}:{:02}",
            remaining_secs / 60,
            remaining_secs % 60
        ))
    }
}

impl Default for Countdown {
    fn default() -> Self {
        Self::new(MATCH_DURATION_SECS)
    }
}
