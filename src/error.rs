use thiserror::Error;

/// Application-level errors using thiserror for structured error handling.
///
/// Recognition failures are deliberately NOT errors: the tracker records
/// empty/sentinel values and keeps going. These types cover the things that
/// can genuinely fail: capture, OCR setup, file I/O, and configuration.

#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("Failed to enumerate displays")]
    EnumerationFailed(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("No displays found")]
    NoDisplays,

    #[error("Failed to capture screen")]
    CaptureFailed(#[source] Box<dyn std::error::Error + Send + Sync>),
}

#[derive(Error, Debug)]
pub enum OcrError {
    #[error("Failed to initialize OCR engine")]
    InitFailed(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("Failed to perform OCR on image")]
    RecognitionFailed(#[source] Box<dyn std::error::Error + Send + Sync>),
}

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("No cropped image for slot {0}")]
    MissingCrop(usize),

    #[error("Failed to write image to {path}")]
    WriteFailed {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration from {path}")]
    LoadFailed {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Failed to save configuration to {path}")]
    SaveFailed {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Could not determine executable directory")]
    NoExeDir,
}

#[derive(Error, Debug)]
pub enum RecordError {
    #[error("Failed to append match record to {path}")]
    AppendFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Type alias for application Results using anyhow for context chaining
pub type AppResult<T> = anyhow::Result<T>;
