/// Match tracker state machine
///
/// Consumes one classified scene per captured frame and drives the phase
/// transitions that trigger capture, recognition, and logging. Every
/// destructive or export action hangs off a transition edge; the only
/// sustained per-tick work is the change-gated selection-order scan in
/// `Select` and the per-second countdown update in `Match`.
use std::path::PathBuf;

use tracing::{info, warn};

use super::match_phase::MatchPhase;
use super::timer::{Countdown, PhaseTimer};
use crate::config::OutputPaths;
use crate::detection::{RegionKind, SceneEdge, SceneLabel, VisionBackend};
use crate::host::HostIntegration;
use crate::record::{MatchRecord, TEAM_SIZE};
use crate::utils;

/// Debounce before a freshly observed select screen is trusted. Filters the
/// one-or-two frames of misclassification during scene cross-fades.
const SELECT_CONFIRM_SECS: u64 = 1;

/// Delay after the match-ending transition before harvesting the result,
/// giving the result screen time to fully render.
const RESULT_RENDER_SECS: u64 = 2;

const SELECTION_ORDER_PREFIX: &str = "SelectionOrder";

/// One tracker instance per monitored video source. All state is owned here;
/// the host calls `tick` once per rendered frame with a monotonic timestamp.
pub struct MatchTracker {
    phase: MatchPhase,
    timer: PhaseTimer,
    edge: SceneEdge,
    countdown: Countdown,
    /// Draft position -> our slot index, -1 while the position is unclaimed
    order_map: [i8; TEAM_SIZE],
    record: MatchRecord,
    output: OutputPaths,
    match_log_file: PathBuf,
}

impl MatchTracker {
    pub fn new(output: OutputPaths, match_log_file: PathBuf, match_duration_secs: u64) -> Self {
        Self {
            phase: MatchPhase::Unknown,
            timer: PhaseTimer::new(),
            edge: SceneEdge::new(),
            countdown: Countdown::new(match_duration_secs),
            order_map: [-1; TEAM_SIZE],
            record: MatchRecord::new(),
            output,
            match_log_file,
        }
    }

    pub fn phase(&self) -> MatchPhase {
        self.phase
    }

    pub fn record(&self) -> &MatchRecord {
        &self.record
    }

    /// Advance the state machine by one frame.
    ///
    /// `frame_ready == false` skips the tick entirely: no classification, no
    /// transition, and the previous-scene memory stays untouched for the
    /// next tick.
    pub fn tick<V: VisionBackend, H: HostIntegration>(
        &mut self,
        vision: &mut V,
        host: &mut H,
        frame_ready: bool,
        now_ns: u64,
    ) {
        if !frame_ready {
            return;
        }

        let scene = vision.classify_scene();

        match self.phase {
            MatchPhase::Unknown => {
                if scene == SceneLabel::SelectPokemon {
                    self.set_phase(MatchPhase::EnteringSelect, now_ns);
                }
            }
            MatchPhase::EnteringSelect => {
                // Unconditional after the debounce, whatever the label says:
                // the select screen stays up long enough that a momentary
                // relabel mid-fade must not push the capture point around.
                if self.timer.elapsed_at_least(now_ns, SELECT_CONFIRM_SECS) {
                    self.capture_opponent_team(vision);
                    self.set_phase(MatchPhase::Select, now_ns);
                }
            }
            MatchPhase::Select => {
                if self.scan_selection_order(vision) {
                    self.export_selection_order(vision);
                }

                if scene == SceneLabel::BlackTransition {
                    self.set_phase(MatchPhase::EnteringMatch, now_ns);
                }
            }
            MatchPhase::EnteringMatch => {
                if self.edge.entered_transition(scene) {
                    self.countdown.start(now_ns);
                    self.set_phase(MatchPhase::Match, now_ns);
                } else if scene == SceneLabel::SelectPokemon {
                    // False start: back to the draft without touching the record.
                    self.set_phase(MatchPhase::Select, now_ns);
                }
            }
            MatchPhase::Match => {
                if let Some(text) = self.countdown.tick(now_ns) {
                    host.update_countdown_display(&text);
                }

                if scene == SceneLabel::SelectPokemon {
                    // Match abandoned or reset from outside.
                    self.set_phase(MatchPhase::EnteringSelect, now_ns);
                } else if self.edge.entered_transition(scene) {
                    self.set_phase(MatchPhase::Result, now_ns);
                }
            }
            MatchPhase::Result => {
                if self.timer.elapsed_at_least(now_ns, RESULT_RENDER_SECS) {
                    host.take_screenshot();
                    vision.crop_region(RegionKind::Result);
                    self.record.outcome = vision.recognize_result();
                    self.flush_record();
                    self.set_phase(MatchPhase::Unknown, now_ns);
                } else if scene == SceneLabel::SelectPokemon {
                    // Next draft showed up before the result rendered: flush
                    // what we have, outcome stays unknown.
                    self.flush_record();
                    self.set_phase(MatchPhase::EnteringSelect, now_ns);
                }
            }
        }

        self.edge.observe(scene);
    }

    fn set_phase(&mut self, next: MatchPhase, now_ns: u64) {
        info!("State: {} to {}", self.phase.as_str(), next.as_str());
        self.phase = next;
        self.timer.enter(now_ns);
    }

    /// `EnteringSelect -> Select` edge: crop the opponent column, export each
    /// slot to the stream and log destinations, and recognize the six
    /// opponent identities into the record. Runs exactly once per draft.
    fn capture_opponent_team<V: VisionBackend>(&mut self, vision: &mut V) {
        vision.crop_region(RegionKind::OpponentTeam);

        for slot in 0..TEAM_SIZE {
            let filename = utils::slot_filename(&self.output.stream_prefix, slot, "png");
            if let Err(e) = vision.export_opponent_image(slot, &self.output.stream_path, &filename)
            {
                warn!("Stream export failed for slot {}: {}", slot + 1, e);
            }
        }

        for slot in 0..TEAM_SIZE {
            let filename = utils::slot_filename(&self.output.log_prefix, slot, "png");
            if let Err(e) = vision.export_opponent_image(slot, &self.output.log_path, &filename) {
                warn!("Log export failed for slot {}: {}", slot + 1, e);
            }

            let id = vision.recognize_opponent(slot);
            info!(
                "Opponent slot {}: {}",
                slot + 1,
                if id.is_empty() { "?" } else { &id }
            );
            self.record.opponents[slot] = id;
        }
    }

    /// Re-run draft-order recognition over all six slots. Returns true if any
    /// resolved position changed. Recognition runs every tick with no
    /// stability guarantee, so the map is the gate that keeps a stable draft
    /// from re-exporting six images per frame.
    fn scan_selection_order<V: VisionBackend>(&mut self, vision: &mut V) -> bool {
        vision.crop_region(RegionKind::SelectionOrder);

        let mut orders = [0u8; TEAM_SIZE];
        let mut changed = false;
        for slot in 0..TEAM_SIZE {
            orders[slot] = vision.recognize_selection_order(slot);
            let order = orders[slot] as usize;
            if (1..=TEAM_SIZE).contains(&order) && self.order_map[order - 1] != slot as i8 {
                self.order_map[order - 1] = slot as i8;
                changed = true;
            }
        }

        if changed {
            info!(
                "My order: {} {} {} {} {} {}",
                orders[0], orders[1], orders[2], orders[3], orders[4], orders[5]
            );
            for slot in 0..TEAM_SIZE {
                // A slot that flickers back to 0 keeps its recorded order.
                if orders[slot] > 0 {
                    self.record.selection_order[slot] = orders[slot] as i8;
                }
            }
        }
        changed
    }

    /// Export the full six-image batch, flagging still-unassigned slots so
    /// the overlay renders them dimmed.
    fn export_selection_order<V: VisionBackend>(&mut self, vision: &mut V) {
        for slot in 0..TEAM_SIZE {
            let filename = utils::slot_filename(SELECTION_ORDER_PREFIX, slot, "png");
            let path = self.output.stream_path.join(filename);
            let unassigned = self.record.selection_order[slot] < 0;
            if let Err(e) = vision.export_selection_order_image(slot, &path, unassigned) {
                warn!("Selection order export failed for slot {}: {}", slot + 1, e);
            }
        }
    }

    /// Append the open record to the match log and reset it, together with
    /// the order map, so nothing carries into the next match.
    fn flush_record(&mut self) {
        info!("Match record: {}", self.record.to_log_line());
        if let Err(e) = self.record.append_to(&self.match_log_file) {
            warn!("{}", e);
        }
        self.record.reset();
        self.order_map = [-1; TEAM_SIZE];
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExportError;
    use crate::record::MatchOutcome;
    use image::RgbaImage;
    use std::path::{Path, PathBuf};

    const SEC: u64 = 1_000_000_000;

    /// Scripted vision backend: plays back a scene per tick and an order
    /// array per selection-order scan, counting every side effect.
    struct StubVision {
        scenes: Vec<SceneLabel>,
        scene_idx: usize,
        order_scans: Vec<[u8; TEAM_SIZE]>,
        scan_idx: usize,
        opponents: [&'static str; TEAM_SIZE],
        result: MatchOutcome,
        crops: Vec<RegionKind>,
        opponent_exports: usize,
        order_exports: Vec<(usize, bool)>,
        opponent_recognitions: usize,
    }

    impl StubVision {
        fn new(scenes: Vec<SceneLabel>) -> Self {
            Self {
                scenes,
                scene_idx: 0,
                order_scans: vec![[0; TEAM_SIZE]],
                scan_idx: 0,
                opponents: ["garchomp", "gholdengo", "dondozo", "", "talonflame", "kingambit"],
                result: MatchOutcome::Win,
                crops: Vec::new(),
                opponent_exports: 0,
                order_exports: Vec::new(),
                opponent_recognitions: 0,
            }
        }

        fn with_order_scans(mut self, scans: Vec<[u8; TEAM_SIZE]>) -> Self {
            self.order_scans = scans;
            self
        }

        fn with_result(mut self, result: MatchOutcome) -> Self {
            self.result = result;
            self
        }
    }

    impl VisionBackend for StubVision {
        fn load_frame(&mut self, _frame: RgbaImage) {}

        fn classify_scene(&mut self) -> SceneLabel {
            let scene = self.scenes[self.scene_idx.min(self.scenes.len() - 1)];
            self.scene_idx += 1;
            scene
        }

        fn crop_region(&mut self, kind: RegionKind) {
            if kind == RegionKind::SelectionOrder && self.crops.last() == Some(&kind) {
                // Advance the scan script once per scan tick.
                self.scan_idx += 1;
            }
            self.crops.push(kind);
        }

        fn recognize_opponent(&mut self, slot: usize) -> String {
            self.opponent_recognitions += 1;
            self.opponents[slot].to_string()
        }

        fn recognize_selection_order(&mut self, slot: usize) -> u8 {
            let scan = self.order_scans[self.scan_idx.min(self.order_scans.len() - 1)];
            scan[slot]
        }

        fn recognize_result(&mut self) -> MatchOutcome {
            self.result
        }

        fn export_opponent_image(
            &mut self,
            _slot: usize,
            _dir: &Path,
            _filename: &str,
        ) -> Result<(), ExportError> {
            self.opponent_exports += 1;
            Ok(())
        }

        fn export_selection_order_image(
            &mut self,
            slot: usize,
            _path: &Path,
            unassigned: bool,
        ) -> Result<(), ExportError> {
            self.order_exports.push((slot, unassigned));
            Ok(())
        }
    }

    #[derive(Default)]
    struct StubHost {
        countdown_updates: Vec<String>,
        screenshots: usize,
    }

    impl HostIntegration for StubHost {
        fn update_countdown_display(&mut self, text: &str) {
            self.countdown_updates.push(text.to_string());
        }

        fn take_screenshot(&mut self) {
            self.screenshots += 1;
        }
    }

    fn test_tracker(name: &str) -> (MatchTracker, PathBuf) {
        let dir = std::env::temp_dir();
        let log_file = dir.join(format!("sv-tracker-{}-{}.txt", name, std::process::id()));
        let _ = std::fs::remove_file(&log_file);
        let output = OutputPaths {
            stream_path: dir.clone(),
            stream_prefix: "OpponentPokemon".to_string(),
            log_path: dir,
            log_prefix: "OpponentPokemon".to_string(),
        };
        (
            MatchTracker::new(output, log_file.clone(), 20 * 60),
            log_file,
        )
    }

    use SceneLabel::{BlackTransition, SelectPokemon, Unknown as Other};

    #[test]
    fn test_select_confirm_fires_capture_once() {
        // Noisy labels after the initial sighting must not matter: the
        // 1-second debounce is unconditional.
        let (mut tracker, log) = test_tracker("confirm");
        let mut vision = StubVision::new(vec![Other, SelectPokemon, Other, Other, Other]);
        let mut host = StubHost::default();

        tracker.tick(&mut vision, &mut host, true, 0);
        assert_eq!(tracker.phase(), MatchPhase::Unknown);

        tracker.tick(&mut vision, &mut host, true, SEC);
        assert_eq!(tracker.phase(), MatchPhase::EnteringSelect);

        // 0.5s in: still debouncing.
        tracker.tick(&mut vision, &mut host, true, SEC + 500_000_000);
        assert_eq!(tracker.phase(), MatchPhase::EnteringSelect);
        assert_eq!(vision.opponent_exports, 0);

        // Past the debounce: capture fires exactly once.
        tracker.tick(&mut vision, &mut host, true, 2 * SEC + 500_000_000);
        assert_eq!(tracker.phase(), MatchPhase::Select);
        assert_eq!(vision.opponent_exports, 2 * TEAM_SIZE); // stream + log
        assert_eq!(vision.opponent_recognitions, TEAM_SIZE);
        assert_eq!(tracker.record().opponents[0], "garchomp");
        assert_eq!(tracker.record().opponents[3], "");

        // Staying in Select does not re-capture opponents.
        tracker.tick(&mut vision, &mut host, true, 3 * SEC);
        assert_eq!(vision.opponent_exports, 2 * TEAM_SIZE);
        assert_eq!(vision.opponent_recognitions, TEAM_SIZE);

        let _ = std::fs::remove_file(&log);
    }

    #[test]
    fn test_frame_not_ready_skips_tick() {
        let (mut tracker, log) = test_tracker("skip");
        let mut vision = StubVision::new(vec![SelectPokemon]);
        let mut host = StubHost::default();

        tracker.tick(&mut vision, &mut host, false, 0);
        assert_eq!(tracker.phase(), MatchPhase::Unknown);
        // Classifier untouched on a skipped tick.
        assert_eq!(vision.scene_idx, 0);

        let _ = std::fs::remove_file(&log);
    }

    #[test]
    fn test_selection_order_change_gating() {
        let (mut tracker, log) = test_tracker("order");
        // Tick 1 enters select path quickly via script below; scans:
        // first slot picked, then second, then stable repeats.
        let mut scenes = vec![SelectPokemon, Other];
        scenes.extend(std::iter::repeat(Other).take(6));
        let mut vision = StubVision::new(scenes).with_order_scans(vec![
            [1, 0, 0, 0, 0, 0],
            [1, 2, 0, 0, 0, 0],
            [1, 2, 0, 0, 0, 0],
            [1, 2, 0, 0, 0, 0],
        ]);
        let mut host = StubHost::default();

        tracker.tick(&mut vision, &mut host, true, 0); // -> EnteringSelect
        tracker.tick(&mut vision, &mut host, true, 2 * SEC); // -> Select

        tracker.tick(&mut vision, &mut host, true, 3 * SEC); // scan [1,0,...]
        assert_eq!(vision.order_exports.len(), TEAM_SIZE);
        assert_eq!(vision.order_exports[0], (0, false));
        assert_eq!(vision.order_exports[1], (1, true)); // still unassigned

        tracker.tick(&mut vision, &mut host, true, 4 * SEC); // scan [1,2,...]
        assert_eq!(vision.order_exports.len(), 2 * TEAM_SIZE);

        // Stable scans: no further exports.
        tracker.tick(&mut vision, &mut host, true, 5 * SEC);
        tracker.tick(&mut vision, &mut host, true, 6 * SEC);
        assert_eq!(vision.order_exports.len(), 2 * TEAM_SIZE);

        assert_eq!(tracker.order_map[0], 0);
        assert_eq!(tracker.order_map[1], 1);
        assert_eq!(&tracker.order_map[2..], &[-1, -1, -1, -1]);
        assert_eq!(
            tracker.record().selection_order,
            [1, 2, -1, -1, -1, -1]
        );

        let _ = std::fs::remove_file(&log);
    }

    #[test]
    fn test_order_flicker_does_not_clear_assignment() {
        let (mut tracker, log) = test_tracker("flicker");
        let scenes = vec![SelectPokemon, Other, Other, Other, Other];
        let mut vision = StubVision::new(scenes).with_order_scans(vec![
            [1, 0, 0, 0, 0, 0],
            // Slot 1 flickers back to unrecognized while slot 2 resolves.
            [0, 2, 0, 0, 0, 0],
        ]);
        let mut host = StubHost::default();

        tracker.tick(&mut vision, &mut host, true, 0);
        tracker.tick(&mut vision, &mut host, true, 2 * SEC);
        tracker.tick(&mut vision, &mut host, true, 3 * SEC);
        tracker.tick(&mut vision, &mut host, true, 4 * SEC);

        assert_eq!(
            tracker.record().selection_order,
            [1, 2, -1, -1, -1, -1]
        );

        let _ = std::fs::remove_file(&log);
    }

    #[test]
    fn test_full_match_lifecycle() {
        let (mut tracker, log) = test_tracker("lifecycle");
        let scenes = vec![
            SelectPokemon,   // t=0   -> EnteringSelect
            Other,           // t=2s  -> Select (capture)
            BlackTransition, // t=3s  -> EnteringMatch (and prev becomes black)
            Other,           // t=4s  screen lit again inside the fade
            BlackTransition, // t=5s  rising edge -> Match
            Other,           // t=6s  battling
            Other,           // t=66s battling
            BlackTransition, // t=67s rising edge -> Result
            BlackTransition, // t=68s held black, still waiting
            Other,           // t=70s delay passed -> harvest + flush -> Unknown
        ];
        let mut vision = StubVision::new(scenes).with_result(MatchOutcome::Win);
        let mut host = StubHost::default();

        let times = [
            0,
            2 * SEC,
            3 * SEC,
            4 * SEC,
            5 * SEC,
            6 * SEC,
            66 * SEC,
            67 * SEC,
            68 * SEC,
            71 * SEC,
        ];
        let expected = [
            MatchPhase::EnteringSelect,
            MatchPhase::Select,
            MatchPhase::EnteringMatch,
            MatchPhase::EnteringMatch,
            MatchPhase::Match,
            MatchPhase::Match,
            MatchPhase::Match,
            MatchPhase::Result,
            MatchPhase::Result,
            MatchPhase::Unknown,
        ];
        for (now, want) in times.iter().zip(expected.iter()) {
            tracker.tick(&mut vision, &mut host, true, *now);
            assert_eq!(tracker.phase(), *want, "at t={}s", now / SEC);
        }

        // Countdown updated while battling (6s and 66s after the 5s start).
        assert_eq!(host.countdown_updates[0], "19:59");
        assert!(host.countdown_updates.contains(&"18:59".to_string()));

        // Result edge: one screenshot, one flush.
        assert_eq!(host.screenshots, 1);
        let content = std::fs::read_to_string(&log).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("garchomp\t"));
        assert!(lines[0].ends_with("\twin"));

        // Record fully reset after the flush.
        assert!(tracker.record().is_empty());
        assert_eq!(tracker.order_map, [-1; TEAM_SIZE]);

        let _ = std::fs::remove_file(&log);
    }

    #[test]
    fn test_false_start_returns_to_select() {
        let (mut tracker, log) = test_tracker("falsestart");
        let scenes = vec![
            SelectPokemon,   // -> EnteringSelect
            Other,           // -> Select
            BlackTransition, // -> EnteringMatch
            SelectPokemon,   // aborted -> Select
        ];
        let mut vision = StubVision::new(scenes);
        let mut host = StubHost::default();

        tracker.tick(&mut vision, &mut host, true, 0);
        tracker.tick(&mut vision, &mut host, true, 2 * SEC);
        tracker.tick(&mut vision, &mut host, true, 3 * SEC);
        assert_eq!(tracker.phase(), MatchPhase::EnteringMatch);

        tracker.tick(&mut vision, &mut host, true, 4 * SEC);
        assert_eq!(tracker.phase(), MatchPhase::Select);
        // Nothing was flushed.
        assert!(!log.exists());

        let _ = std::fs::remove_file(&log);
    }

    #[test]
    fn test_held_black_screen_is_one_edge() {
        let (mut tracker, log) = test_tracker("heldblack");
        let mut scenes = vec![SelectPokemon, Other, BlackTransition, Other];
        // A long black fade into the battle: edge must fire exactly once.
        scenes.extend(std::iter::repeat(BlackTransition).take(100));
        let mut vision = StubVision::new(scenes);
        let mut host = StubHost::default();

        tracker.tick(&mut vision, &mut host, true, 0);
        tracker.tick(&mut vision, &mut host, true, 2 * SEC);
        tracker.tick(&mut vision, &mut host, true, 3 * SEC);
        tracker.tick(&mut vision, &mut host, true, 4 * SEC);
        assert_eq!(tracker.phase(), MatchPhase::EnteringMatch);

        for i in 0..100u64 {
            tracker.tick(&mut vision, &mut host, true, 5 * SEC + i * SEC / 30);
        }
        // The single rising edge took us to Match; the held black screen
        // afterwards never produced another transition out of it.
        assert_eq!(tracker.phase(), MatchPhase::Match);

        let _ = std::fs::remove_file(&log);
    }

    #[test]
    fn test_abandoned_match_returns_to_entering_select() {
        let (mut tracker, log) = test_tracker("abandoned");
        let scenes = vec![
            SelectPokemon,   // -> EnteringSelect
            Other,           // -> Select
            BlackTransition, // -> EnteringMatch
            Other,           //
            BlackTransition, // -> Match
            SelectPokemon,   // reset externally -> EnteringSelect
        ];
        let mut vision = StubVision::new(scenes);
        let mut host = StubHost::default();

        for (i, now) in [0, 2, 3, 4, 5, 6].iter().enumerate() {
            tracker.tick(&mut vision, &mut host, true, *now * SEC);
            if i == 4 {
                assert_eq!(tracker.phase(), MatchPhase::Match);
            }
        }
        assert_eq!(tracker.phase(), MatchPhase::EnteringSelect);

        let _ = std::fs::remove_file(&log);
    }

    #[test]
    fn test_early_reselect_flushes_without_result() {
        let (mut tracker, log) = test_tracker("earlyflush");
        let scenes = vec![
            SelectPokemon,   // -> EnteringSelect
            Other,           // -> Select
            BlackTransition, // -> EnteringMatch
            Other,           //
            BlackTransition, // -> Match
            Other,           //
            BlackTransition, // -> Result
            SelectPokemon,   // before the 2s delay -> flush + EnteringSelect
        ];
        let mut vision = StubVision::new(scenes).with_result(MatchOutcome::Win);
        let mut host = StubHost::default();

        for now in [0, 2, 3, 4, 5, 6, 7] {
            tracker.tick(&mut vision, &mut host, true, now * SEC);
        }
        assert_eq!(tracker.phase(), MatchPhase::Result);

        // 1s later, still inside the render delay, the next draft appears.
        tracker.tick(&mut vision, &mut host, true, 8 * SEC);
        assert_eq!(tracker.phase(), MatchPhase::EnteringSelect);

        // No screenshot, no result harvest; the record went out with
        // outcome unknown and nothing survived into the next match.
        assert_eq!(host.screenshots, 0);
        let content = std::fs::read_to_string(&log).unwrap();
        assert!(content.lines().next().unwrap().ends_with("\tunknown"));
        assert!(tracker.record().is_empty());

        let _ = std::fs::remove_file(&log);
    }
}
