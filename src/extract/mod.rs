//! Structured content extraction from OCR output.
//!
//! The [`Extractor`] turns backend markdown, content items and image assets
//! into a [`UnifiedDocument`](crate::model::UnifiedDocument). Each detection
//! heuristic runs as an isolated strategy: a failing strategy contributes
//! nothing instead of aborting the extraction.

pub mod cleanup;
pub mod formulas;
pub mod images;
pub mod options;
pub mod pipeline;
pub mod response;
pub mod summary;
pub mod tables;

pub use cleanup::{CleanupOptions, CleanupPipeline};
pub use formulas::FormulaDetector;
pub use images::{AssetResolution, AssetResolver, ImageDetector};
pub use options::{ExtractOptions, FormulaConfidence, KeywordMode, TextSegmentation};
pub use pipeline::{ExtractInput, Extractor};
pub use response::{assets_from_value, BackendResponse};
pub use summary::TextSummarizer;
pub use tables::TableDetector;

use crate::error::Result;
use std::panic::{self, AssertUnwindSafe};

/// Run one detection strategy, turning an error or a panic into an empty result.
pub fn run_strategy<T, F>(name: &'static str, strategy: F) -> Vec<T>
where
    F: FnOnce() -> Result<Vec<T>>,
{
    match panic::catch_unwind(AssertUnwindSafe(strategy)) {
        Ok(Ok(found)) => {
            log::debug!("{}: {} found", name, found.len());
            found
        }
        Ok(Err(e)) => {
            log::warn!("{} failed, skipping: {}", name, e);
            Vec::new()
        }
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            log::warn!("{} panicked, skipping: {}", name, message);
            Vec::new()
        }
    }
}
