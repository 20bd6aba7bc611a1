//! Error types for unocr library.

use std::io;
use thiserror::Error;

/// Result type alias for unocr operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur during extraction.
///
/// Most heuristic misses never reach the caller: a failing strategy, a
/// degenerate crop box or an unresolved asset path degrade to partial
/// results. These variants cover the cases that do propagate (unreadable
/// input, serialization) plus the internal failures that strategies and the
/// raster pipeline report before being absorbed.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Malformed JSON input (content list, layout report, asset map).
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Error decoding or encoding raster data.
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// Error decoding base64 or text data.
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// Error rendering or cropping a page raster.
    #[error("Raster error: {0}")]
    Raster(String),

    /// Page number is out of range.
    #[error("Page {0} is out of range (document has {1} pages)")]
    PageOutOfRange(u32, u32),

    /// The input could not be interpreted.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A single detection strategy failed.
    #[error("Strategy '{strategy}' failed: {message}")]
    Strategy {
        /// Strategy name (e.g. "table_ascii")
        strategy: &'static str,
        /// Failure description
        message: String,
    },

    /// The file format is not recognized.
    #[error("Unknown file format")]
    UnknownFormat,

    /// Error during rendering (JSON).
    #[error("Rendering error: {0}")]
    Render(String),

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a strategy failure.
    pub fn strategy(strategy: &'static str, message: impl Into<String>) -> Self {
        Error::Strategy {
            strategy,
            message: message.into(),
        }
    }
}

impl From<base64::DecodeError> for Error {
    fn from(err: base64::DecodeError) -> Self {
        Error::Encoding(err.to_string())
    }
}
