/// Pixel-heuristic scene classifier
///
/// Classifies a frame from cheap luminance statistics instead of a trained
/// model. The black transition is a near-black frame; the team-select screen
/// has its two bright team columns flanking a darker center band. Anything
/// else is `Unknown`, which the tracker treats as signal noise.
use image::RgbaImage;

use super::scene::SceneLabel;

/// Mean luma below this is a black cross-fade frame
const BLACK_LUMA_MAX: f32 = 12.0;

/// How much brighter both team columns must be than the center band
const SIDE_CONTRAST_MIN: f32 = 25.0;

/// Overall brightness window for the select screen
const SELECT_MEAN_MIN: f32 = 30.0;
const SELECT_MEAN_MAX: f32 = 180.0;

/// Sample every Nth pixel; full-resolution stats buy nothing here
const SAMPLE_STEP: u32 = 4;

pub struct SceneClassifier;

impl SceneClassifier {
    pub fn new() -> Self {
        Self
    }

    pub fn classify(&self, frame: &RgbaImage) -> SceneLabel {
        let (width, height) = frame.dimensions();
        if width < 8 || height < 8 {
            return SceneLabel::Unknown;
        }

        let overall = mean_luma(frame, 0, width);
        if overall < BLACK_LUMA_MAX {
            return SceneLabel::BlackTransition;
        }

        // Select screen signature: both team columns brighter than the
        // center band, with the whole frame in a mid-brightness window.
        let quarter = width / 4;
        let left = mean_luma(frame, 0, quarter);
        let center = mean_luma(frame, quarter, width - quarter);
        let right = mean_luma(frame, width - quarter, width);

        let sides_lit = left - center >= SIDE_CONTRAST_MIN && right - center >= SIDE_CONTRAST_MIN;
        if sides_lit && (SELECT_MEAN_MIN..=SELECT_MEAN_MAX).contains(&overall) {
            return SceneLabel::SelectPokemon;
        }

        SceneLabel::Unknown
    }
}

impl Default for SceneClassifier {
    fn default() -> Self {
        Self::new()
    }
}

/// Mean luma over a vertical band `[x_start, x_end)`, sampled sparsely.
/// Standard grayscale conversion: 0.299*R + 0.587*G + 0.114*B
fn mean_luma(frame: &RgbaImage, x_start: u32, x_end: u32) -> f32 {
    let (_, height) = frame.dimensions();
    let mut sum = 0.0f32;
    let mut count = 0u32;

    let mut y = 0;
    while y < height {
        let mut x = x_start;
        while x < x_end {
            let pixel = frame.get_pixel(x, y);
            sum += 0.299 * pixel[0] as f32 + 0.587 * pixel[1] as f32 + 0.114 * pixel[2] as f32;
            count += 1;
            x += SAMPLE_STEP;
        }
        y += SAMPLE_STEP;
    }

    if count == 0 {
        0.0
    } else {
        sum / count as f32
    }
}
