//! Coordinate transforms and page-raster cropping.
//!
//! Used when an OCR backend reports where images are but not what they look
//! like: the regions are located on rendered pages, cropped, trimmed of
//! white borders and encoded as PNG data URIs.

mod crop;
mod source;
mod synthesize;
mod transform;

pub use crop::{auto_trim, crop, encode_png_data_uri, PixelRect};
#[cfg(feature = "pdfium")]
pub use source::PdfiumPages;
pub use source::{PageSource, RasterPages};
pub use synthesize::{AssetSynthesizer, Geometry};
pub use transform::{to_raster, CoordinateTransform, PageTransforms};
