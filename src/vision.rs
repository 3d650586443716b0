/// Real vision backend
///
/// Implements the `VisionBackend` capability trait over the heuristic scene
/// classifier and the Tesseract OCR engine. Crop geometry is expressed as
/// fractions of the frame so any 16:9 capture resolution works; the
/// reference layout is the Switch's 1920x1080 battle UI.
use std::path::Path;

use image::{imageops, RgbaImage};
use tracing::{debug, warn};

use crate::detection::{RegionKind, SceneClassifier, SceneLabel, VisionBackend};
use crate::error::ExportError;
use crate::ocr::OcrManager;
use crate::record::{MatchOutcome, TEAM_SIZE};

/// Normalized rect: (x, y, width, height) as fractions of the frame
type NormRect = (f32, f32, f32, f32);

/// Opponent team cards, stacked in the right-hand column of the select screen
const OPPONENT_SLOT_X: f32 = 0.76;
const OPPONENT_SLOT_W: f32 = 0.18;

/// Draft-order badges on the corner of our own team cards, left column
const ORDER_BADGE_X: f32 = 0.06;
const ORDER_BADGE_W: f32 = 0.05;

/// Vertical layout shared by both columns: first card top and card pitch
const SLOT_Y0: f32 = 0.16;
const SLOT_PITCH: f32 = 0.115;
const OPPONENT_SLOT_H: f32 = 0.10;
const ORDER_BADGE_H: f32 = 0.06;

/// WIN/LOSE banner on the result screen
const RESULT_REGION: NormRect = (0.38, 0.10, 0.24, 0.12);

pub(crate) fn opponent_slot_region(slot: usize) -> NormRect {
    (
        OPPONENT_SLOT_X,
        SLOT_Y0 + slot as f32 * SLOT_PITCH,
        OPPONENT_SLOT_W,
        OPPONENT_SLOT_H,
    )
}

pub(crate) fn order_badge_region(slot: usize) -> NormRect {
    (
        ORDER_BADGE_X,
        SLOT_Y0 + slot as f32 * SLOT_PITCH,
        ORDER_BADGE_W,
        ORDER_BADGE_H,
    )
}

/// Crop a normalized rect out of the frame, clamped to the frame bounds
pub(crate) fn crop_norm(frame: &RgbaImage, rect: NormRect) -> RgbaImage {
    let (fw, fh) = frame.dimensions();
    let x = ((rect.0 * fw as f32) as u32).min(fw.saturating_sub(1));
    let y = ((rect.1 * fh as f32) as u32).min(fh.saturating_sub(1));
    let w = ((rect.2 * fw as f32) as u32).max(1).min(fw - x);
    let h = ((rect.3 * fh as f32) as u32).max(1).min(fh - y);
    imageops::crop_imm(frame, x, y, w, h).to_image()
}

/// Darken an export so overlays can tell unassigned slots apart
pub(crate) fn dim_image(image: &RgbaImage) -> RgbaImage {
    let mut dimmed = image.clone();
    for pixel in dimmed.pixels_mut() {
        pixel[0] = (pixel[0] as f32 * 0.35) as u8;
        pixel[1] = (pixel[1] as f32 * 0.35) as u8;
        pixel[2] = (pixel[2] as f32 * 0.35) as u8;
    }
    dimmed
}

pub struct SvVisionBackend {
    classifier: SceneClassifier,
    ocr: OcrManager,
    frame: Option<RgbaImage>,
    opponent_crops: [Option<RgbaImage>; TEAM_SIZE],
    order_crops: [Option<RgbaImage>; TEAM_SIZE],
    result_crop: Option<RgbaImage>,
}

impl SvVisionBackend {
    pub fn new(ocr: OcrManager) -> Self {
        Self {
            classifier: SceneClassifier::new(),
            ocr,
            frame: None,
            opponent_crops: Default::default(),
            order_crops: Default::default(),
            result_crop: None,
        }
    }

    fn save_crop(crop: Option<&RgbaImage>, slot: usize, path: &Path) -> Result<(), ExportError> {
        let image = crop.ok_or(ExportError::MissingCrop(slot))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ExportError::WriteFailed {
                path: path.display().to_string(),
                source: Box::new(e),
            })?;
        }
        image.save(path).map_err(|e| ExportError::WriteFailed {
            path: path.display().to_string(),
            source: Box::new(e),
        })
    }
}

impl VisionBackend for SvVisionBackend {
    fn load_frame(&mut self, frame: RgbaImage) {
        self.frame = Some(frame);
    }

    fn classify_scene(&mut self) -> SceneLabel {
        match &self.frame {
            Some(frame) => self.classifier.classify(frame),
            None => SceneLabel::Unknown,
        }
    }

    fn crop_region(&mut self, kind: RegionKind) {
        let Some(frame) = self.frame.as_ref() else {
            warn!("crop_region({:?}) called with no frame loaded", kind);
            return;
        };

        match kind {
            RegionKind::OpponentTeam => {
                for slot in 0..TEAM_SIZE {
                    self.opponent_crops[slot] = Some(crop_norm(frame, opponent_slot_region(slot)));
                }
            }
            RegionKind::SelectionOrder => {
                for slot in 0..TEAM_SIZE {
                    self.order_crops[slot] = Some(crop_norm(frame, order_badge_region(slot)));
                }
            }
            RegionKind::Result => {
                self.result_crop = Some(crop_norm(frame, RESULT_REGION));
            }
        }
    }

    fn recognize_opponent(&mut self, slot: usize) -> String {
        let Some(crop) = self.opponent_crops.get(slot).and_then(|c| c.as_ref()) else {
            return String::new();
        };
        match self.ocr.recognize_text(crop) {
            Ok(text) => text.to_lowercase(),
            Err(e) => {
                debug!("Opponent OCR failed for slot {}: {}", slot + 1, e);
                String::new()
            }
        }
    }

    fn recognize_selection_order(&mut self, slot: usize) -> u8 {
        let Some(crop) = self.order_crops.get(slot).and_then(|c| c.as_ref()) else {
            return 0;
        };
        match self.ocr.recognize_order_digit(crop) {
            Ok(digit) => digit,
            Err(e) => {
                debug!("Order OCR failed for slot {}: {}", slot + 1, e);
                0
            }
        }
    }

    fn recognize_result(&mut self) -> MatchOutcome {
        let Some(crop) = self.result_crop.as_ref() else {
            return MatchOutcome::Unknown;
        };
        match self.ocr.recognize_text(crop) {
            Ok(text) if text.contains("WIN") || text.contains("VICTORY") => MatchOutcome::Win,
            Ok(text) if text.contains("LOSE") || text.contains("DEFEAT") => MatchOutcome::Loss,
            Ok(text) => {
                debug!("Unrecognized result banner text: '{}'", text);
                MatchOutcome::Unknown
            }
            Err(e) => {
                debug!("Result OCR failed: {}", e);
                MatchOutcome::Unknown
            }
        }
    }

    fn export_opponent_image(
        &mut self,
        slot: usize,
        dir: &Path,
        filename: &str,
    ) -> Result<(), ExportError> {
        Self::save_crop(
            self.opponent_crops.get(slot).and_then(|c| c.as_ref()),
            slot,
            &dir.join(filename),
        )
    }

    fn export_selection_order_image(
        &mut self,
        slot: usize,
        path: &Path,
        unassigned: bool,
    ) -> Result<(), ExportError> {
        let crop = self
            .order_crops
            .get(slot)
            .and_then(|c| c.as_ref())
            .ok_or(ExportError::MissingCrop(slot))?;

        let image = if unassigned { dim_image(crop) } else { crop.clone() };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ExportError::WriteFailed {
                path: path.display().to_string(),
                source: Box::new(e),
            })?;
        }
        image.save(path).map_err(|e| ExportError::WriteFailed {
            path: path.display().to_string(),
            source: Box::new(e),
        })
    }
}
