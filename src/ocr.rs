use image::{GrayImage, ImageBuffer, Luma, Rgba};
use leptess::{LepTess, Variable};

use crate::error::OcrError;

/// OCR manager that reuses the Tesseract instance for optimal performance.
///
/// Two recognition modes are used by the vision backend: free text for
/// opponent names and the WIN/LOSE banner, and single-character digit mode
/// for the draft-order badges (whitelist 1-6).
pub struct OcrManager {
    tess: LepTess,
}

impl OcrManager {
    pub fn new() -> Result<Self, OcrError> {
        let tess = LepTess::new(None, "eng").map_err(|e| OcrError::InitFailed(Box::new(e)))?;
        Ok(Self { tess })
    }

    /// Recognize a single line of text from the image.
    /// Returns uppercase trimmed text; empty string when nothing was read.
    pub fn recognize_text(&mut self, image: &ImageBuffer<Rgba<u8>, Vec<u8>>) -> Result<String, OcrError> {
        // PSM 7 = treat the image as a single text line
        self.tess
            .set_variable(Variable::TesseditPagesegMode, "7")
            .map_err(|e| OcrError::RecognitionFailed(Box::new(e)))?;
        self.tess
            .set_variable(Variable::TesseditCharWhitelist, "")
            .map_err(|e| OcrError::RecognitionFailed(Box::new(e)))?;

        let text = self.run(image)?;
        Ok(text.trim().to_uppercase())
    }

    /// Recognize one draft-order digit. Returns 1..=6, or 0 when the badge
    /// is absent or unreadable (the tracker records 0 as "not yet shown").
    pub fn recognize_order_digit(&mut self, image: &ImageBuffer<Rgba<u8>, Vec<u8>>) -> Result<u8, OcrError> {
        // PSM 10 = single character
        self.tess
            .set_variable(Variable::TesseditPagesegMode, "10")
            .map_err(|e| OcrError::RecognitionFailed(Box::new(e)))?;
        self.tess
            .set_variable(Variable::TesseditCharWhitelist, "123456")
            .map_err(|e| OcrError::RecognitionFailed(Box::new(e)))?;

        let text = self.run(image)?;
        let digit = text
            .trim()
            .chars()
            .find_map(|c| c.to_digit(10))
            .unwrap_or(0) as u8;
        Ok(if (1..=6).contains(&digit) { digit } else { 0 })
    }

    fn run(&mut self, image: &ImageBuffer<Rgba<u8>, Vec<u8>>) -> Result<String, OcrError> {
        let binary = preprocess_for_ocr(image);

        // leptess wants a file path
        let temp_path = std::env::temp_dir().join(format!("sv-ocr-{}.png", std::process::id()));
        binary
            .save(&temp_path)
            .map_err(|e| OcrError::RecognitionFailed(Box::new(e)))?;

        self.tess
            .set_image(&temp_path)
            .map_err(|e| OcrError::RecognitionFailed(Box::new(e)))?;
        let text = self
            .tess
            .get_utf8_text()
            .map_err(|e| OcrError::RecognitionFailed(Box::new(e)))?;

        let _ = std::fs::remove_file(&temp_path);
        Ok(text)
    }
}

/// Binarize for OCR: grayscale, Otsu threshold, then invert if the result is
/// mostly white (Tesseract expects dark text on light background).
pub(crate) fn preprocess_for_ocr(image: &ImageBuffer<Rgba<u8>, Vec<u8>>) -> GrayImage {
    let gray = rgba_to_grayscale(image);
    let (width, height) = gray.dimensions();

    let threshold = calculate_otsu_threshold(&gray);
    let mut binary = GrayImage::new(width, height);
    for (x, y, pixel) in gray.enumerate_pixels() {
        let value = if pixel[0] >= threshold { 255 } else { 0 };
        binary.put_pixel(x, y, Luma([value]));
    }

    let white_pixels = binary.pixels().filter(|p| p[0] > 127).count();
    let total_pixels = (width * height) as usize;
    if white_pixels < total_pixels / 2 {
        image::imageops::invert(&mut binary);
    }

    binary
}

/// Calculate optimal threshold using Otsu's method
pub(crate) fn calculate_otsu_threshold(gray: &GrayImage) -> u8 {
    let mut histogram = [0u32; 256];
    for pixel in gray.pixels() {
        histogram[pixel[0] as usize] += 1;
    }

    let total_pixels = gray.width() * gray.height();

    let mut sum = 0u64;
    for i in 0..256 {
        sum += (i as u64) * (histogram[i] as u64);
    }

    let mut sum_background = 0u64;
    let mut weight_background = 0u32;
    let mut max_variance = 0.0;
    let mut threshold = 0u8;

    for i in 0..256 {
        weight_background += histogram[i];
        if weight_background == 0 {
            continue;
        }

        let weight_foreground = total_pixels - weight_background;
        if weight_foreground == 0 {
            break;
        }

        sum_background += (i as u64) * (histogram[i] as u64);

        let mean_background = sum_background as f64 / weight_background as f64;
        let mean_foreground = (sum - sum_background) as f64 / weight_foreground as f64;

        let variance = (weight_background as f64)
            * (weight_foreground as f64)
            * (mean_background - mean_foreground).powi(2);

        if variance > max_variance {
            max_variance = variance;
            threshold = i as u8;
        }
    }

    threshold
}

fn rgba_to_grayscale(image: &ImageBuffer<Rgba<u8>, Vec<u8>>) -> GrayImage {
    let (width, height) = image.dimensions();
    let mut gray = GrayImage::new(width, height);

    for y in 0..height {
        for x in 0..width {
            let pixel = image.get_pixel(x, y);
            // Standard grayscale conversion: 0.299*R + 0.587*G + 0.114*B
            let gray_value = (0.299 * pixel[0] as f32
                + 0.587 * pixel[1] as f32
                + 0.114 * pixel[2] as f32) as u8;
            gray.put_pixel(x, y, Luma([gray_value]));
        }
    }

    gray
}
