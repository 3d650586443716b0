/// Vision backend capability interface
///
/// Everything the tracker needs from the vision pipeline, as a trait so the
/// transition logic can be tested against a scripted stub instead of a live
/// screen. The real implementation lives in `crate::vision`.
use std::path::Path;

use image::RgbaImage;

use super::scene::SceneLabel;
use crate::error::ExportError;
use crate::record::MatchOutcome;

/// UI region the backend knows how to crop out of the current frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionKind {
    /// Opponent team column on the select screen (6 slots)
    OpponentTeam,
    /// Draft-order badges on our own team column (6 slots)
    SelectionOrder,
    /// WIN/LOSE banner on the result screen
    Result,
}

/// Recognition and export operations backed by the vision pipeline.
///
/// Recognition methods never fail: a slot the backend cannot read comes back
/// as an empty string, `0`, or `MatchOutcome::Unknown`, and the tracker
/// records it as-is. Exports return errors so callers can log them, but they
/// are fire-and-forget from the tracker's point of view.
pub trait VisionBackend {
    /// Supply the freshly captured frame. Must be called before any
    /// classify/crop/recognize call in the same tick.
    fn load_frame(&mut self, frame: RgbaImage);

    /// Classify the current frame into a scene label
    fn classify_scene(&mut self) -> SceneLabel;

    /// Crop the per-slot images for `kind` out of the current frame and keep
    /// them for the recognize/export calls that follow.
    fn crop_region(&mut self, kind: RegionKind);

    /// Species id of the opponent in `slot`, empty if unrecognized
    fn recognize_opponent(&mut self, slot: usize) -> String;

    /// Draft order badge shown on our `slot`: 1..=6, or 0 if not yet shown
    fn recognize_selection_order(&mut self, slot: usize) -> u8;

    /// Win/loss from the result banner
    fn recognize_result(&mut self) -> MatchOutcome;

    /// Save the cropped opponent image for `slot` as `dir/filename`
    fn export_opponent_image(
        &mut self,
        slot: usize,
        dir: &Path,
        filename: &str,
    ) -> Result<(), ExportError>;

    /// Save the cropped selection-order image for `slot` to `path`.
    /// `unassigned` slots are exported dimmed so overlays can tell them apart.
    fn export_selection_order_image(
        &mut self,
        slot: usize,
        path: &Path,
        unassigned: bool,
    ) -> Result<(), ExportError>;
}
