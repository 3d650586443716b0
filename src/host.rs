/// Host-side integration points
///
/// The tracker calls out through `HostIntegration` for the two things that
/// belong to the broadcast setup rather than the vision pipeline: updating
/// the on-stream countdown text and taking a full-frame screenshot at the
/// end of a match. Both are fire-and-forget; failures are logged and
/// swallowed so the state machine never stalls on them.
use std::fs;
use std::path::PathBuf;

use image::RgbaImage;
use tracing::{debug, warn};

use crate::utils;

/// Collaborator surface the tracker drives on specific transitions
pub trait HostIntegration {
    /// Push new countdown text to the stream overlay
    fn update_countdown_display(&mut self, text: &str);

    /// Capture the full host frame to disk
    fn take_screenshot(&mut self);
}

/// File-based host bridge.
///
/// OBS text sources can read from a file on disk, so the countdown widget is
/// just a small text file the overlay points at. Screenshots land in the
/// configured directory with timestamped names.
pub struct FileHostBridge {
    countdown_file: PathBuf,
    screenshot_dir: PathBuf,
    current_frame: Option<RgbaImage>,
}

impl FileHostBridge {
    pub fn new(countdown_file: PathBuf, screenshot_dir: PathBuf) -> Self {
        Self {
            countdown_file,
            screenshot_dir,
            current_frame: None,
        }
    }

    /// Keep a handle on the frame captured this tick so the result-screen
    /// screenshot matches what the tracker just saw.
    pub fn set_current_frame(&mut self, frame: RgbaImage) {
        self.current_frame = Some(frame);
    }
}

impl HostIntegration for FileHostBridge {
    fn update_countdown_display(&mut self, text: &str) {
        if let Err(e) = fs::write(&self.countdown_file, text) {
            warn!(
                "Failed to update countdown file {}: {}",
                self.countdown_file.display(),
                e
            );
        }
    }

    fn take_screenshot(&mut self) {
        let Some(frame) = self.current_frame.as_ref() else {
            warn!("Screenshot requested before any frame was captured");
            return;
        };

        if let Err(e) = fs::create_dir_all(&self.screenshot_dir) {
            warn!(
                "Failed to create screenshot directory {}: {}",
                self.screenshot_dir.display(),
                e
            );
            return;
        }

        let path = self
            .screenshot_dir
            .join(utils::timestamped_filename("Result", "png"));
        match frame.save(&path) {
            Ok(()) => debug!("Saved result screenshot to {}", path.display()),
            Err(e) => warn!("Failed to save screenshot to {}: {}", path.display(), e),
        }
    }
}
