//! Page raster providers.

use std::path::Path;

use image::{imageops::FilterType, RgbImage};

use crate::error::{Error, Result};

/// Something that can render document pages to RGB rasters.
pub trait PageSource: Send + Sync {
    /// Number of pages.
    fn page_count(&self) -> usize;

    /// Page size in PDF points, if known.
    fn page_size(&self, page_idx: u32) -> Option<(f64, f64)>;

    /// Render a page at the given scale (pixels per PDF point).
    fn render_page(&self, page_idx: u32, scale: f32) -> Result<RgbImage>;
}

/// Pre-rendered page images.
///
/// Rendering returns the stored image. When a PDF page size is known and the
/// stored image is smaller than the requested scale implies, the image is
/// upsampled to that size.
#[derive(Debug, Clone, Default)]
pub struct RasterPages {
    pages: Vec<RgbImage>,
    sizes: Vec<Option<(f64, f64)>>,
}

impl RasterPages {
    /// Wrap page images whose PDF size is unknown.
    pub fn new(pages: Vec<RgbImage>) -> Self {
        let sizes = vec![None; pages.len()];
        Self { pages, sizes }
    }

    /// Add a page with an optional PDF size.
    pub fn with_page(mut self, image: RgbImage, pdf_size: Option<(f64, f64)>) -> Self {
        self.pages.push(image);
        self.sizes.push(pdf_size);
        self
    }

    /// Load page images from files, in the given order.
    pub fn from_files<P: AsRef<Path>>(paths: &[P]) -> Result<Self> {
        let mut pages = Vec::with_capacity(paths.len());
        for path in paths {
            let image = image::open(path.as_ref())?;
            pages.push(image.to_rgb8());
        }
        log::debug!("loaded {} page images", pages.len());
        Ok(Self::new(pages))
    }

    /// Load every PNG/JPEG page image in a directory, sorted by file name.
    pub fn from_dir<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let mut paths: Vec<_> = std::fs::read_dir(dir.as_ref())?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.extension()
                    .and_then(|ext| ext.to_str())
                    .map(|ext| {
                        matches!(ext.to_ascii_lowercase().as_str(), "png" | "jpg" | "jpeg")
                    })
                    .unwrap_or(false)
            })
            .collect();
        paths.sort();
        Self::from_files(&paths)
    }

    /// Set the PDF size of an existing page.
    pub fn set_page_size(&mut self, page_idx: usize, width: f64, height: f64) {
        if let Some(size) = self.sizes.get_mut(page_idx) {
            *size = Some((width, height));
        }
    }
}

impl PageSource for RasterPages {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page_size(&self, page_idx: u32) -> Option<(f64, f64)> {
        self.sizes.get(page_idx as usize).copied().flatten()
    }

    fn render_page(&self, page_idx: u32, scale: f32) -> Result<RgbImage> {
        let image = self
            .pages
            .get(page_idx as usize)
            .ok_or(Error::PageOutOfRange(page_idx, self.pages.len() as u32))?;

        if let Some((width, height)) = self.page_size(page_idx) {
            let target_w = (width * f64::from(scale)).round() as u32;
            let target_h = (height * f64::from(scale)).round() as u32;
            if target_w > image.width() && target_h > image.height() {
                return Ok(image::imageops::resize(
                    image,
                    target_w,
                    target_h,
                    FilterType::Triangle,
                ));
            }
        }

        Ok(image.clone())
    }
}

#[cfg(feature = "pdfium")]
pub use pdfium::PdfiumPages;

#[cfg(feature = "pdfium")]
mod pdfium {
    use super::PageSource;
    use crate::error::{Error, Result};
    use image::RgbImage;
    use pdfium_render::prelude::*;
    use std::path::Path;
    use std::sync::{Arc, Mutex};

    /// Pages of a PDF rendered with pdfium.
    pub struct PdfiumPages {
        // Declared before `_pdfium` so it is dropped first.
        document: Mutex<PdfDocument<'static>>,
        _pdfium: Arc<Pdfium>,
        sizes: Vec<(f64, f64)>,
    }

    // SAFETY: pdfium-render's thread_safe feature serializes every call into
    // the library, and the document is only touched under the mutex.
    unsafe impl Send for PdfiumPages {}
    unsafe impl Sync for PdfiumPages {}

    impl PdfiumPages {
        fn bind() -> Result<Pdfium> {
            let bindings =
                Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
                    .or_else(|_| Pdfium::bind_to_system_library())
                    .map_err(|e| Error::Raster(format!("failed to bind pdfium: {}", e)))?;
            Ok(Pdfium::new(bindings))
        }

        /// Open a PDF from bytes.
        pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
            let pdfium = Arc::new(Self::bind()?);
            let document = pdfium
                .load_pdf_from_byte_vec(data, None)
                .map_err(|e| Error::Raster(format!("failed to load PDF: {}", e)))?;

            // SAFETY: the document borrows `pdfium`, which this struct keeps
            // alive in an Arc for at least as long as the document.
            let document: PdfDocument<'static> = unsafe { std::mem::transmute(document) };

            let sizes = document
                .pages()
                .iter()
                .map(|page| (f64::from(page.width().value), f64::from(page.height().value)))
                .collect();

            Ok(Self {
                document: Mutex::new(document),
                _pdfium: pdfium,
                sizes,
            })
        }

        /// Open a PDF file.
        pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
            Self::from_bytes(std::fs::read(path)?)
        }
    }

    impl PageSource for PdfiumPages {
        fn page_count(&self) -> usize {
            self.sizes.len()
        }

        fn page_size(&self, page_idx: u32) -> Option<(f64, f64)> {
            self.sizes.get(page_idx as usize).copied()
        }

        fn render_page(&self, page_idx: u32, scale: f32) -> Result<RgbImage> {
            let count = self.sizes.len() as u32;
            if page_idx >= count {
                return Err(Error::PageOutOfRange(page_idx, count));
            }
            let index = u16::try_from(page_idx).map_err(|_| Error::PageOutOfRange(page_idx, count))?;

            let document = self
                .document
                .lock()
                .map_err(|_| Error::Raster("pdfium document lock poisoned".to_string()))?;
            let page = document
                .pages()
                .get(index)
                .map_err(|e| Error::Raster(format!("failed to load page {}: {}", page_idx, e)))?;

            let config = PdfRenderConfig::new().scale_page_by_factor(scale);
            let bitmap = page
                .render_with_config(&config)
                .map_err(|e| Error::Raster(format!("failed to render page {}: {}", page_idx, e)))?;

            Ok(bitmap.as_image().to_rgb8())
        }
    }
}
