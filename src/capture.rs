use image::RgbaImage;
use tracing::info;
use xcap::Monitor;

use crate::error::CaptureError;

/// Frame source over the first display xcap reports.
///
/// The monitor handle is resolved once and reused for every capture; xcap
/// keeps the platform capture session alive underneath (Metal on macOS,
/// Windows.Graphics.Capture on Windows, X11/Wayland on Linux).
pub struct FrameSource {
    monitor: Monitor,
}

impl FrameSource {
    pub fn new() -> Result<Self, CaptureError> {
        let mut monitors =
            Monitor::all().map_err(|e| CaptureError::EnumerationFailed(Box::new(e)))?;
        if monitors.is_empty() {
            return Err(CaptureError::NoDisplays);
        }

        let monitor = monitors.swap_remove(0);
        info!("Capture initialized on the first reported display");

        Ok(Self { monitor })
    }

    /// Grab one full frame of the monitored display
    pub fn capture_frame(&self) -> Result<RgbaImage, CaptureError> {
        self.monitor
            .capture_image()
            .map_err(|e| CaptureError::CaptureFailed(Box::new(e)))
    }
}
