//! Image asset synthesis from page rasters.
//!
//! When a backend reports image regions but no pixel data, the regions are
//! cropped out of rendered pages and encoded as PNG data URIs.

use std::collections::HashMap;

use image::RgbImage;

use crate::error::Result;
use crate::extract::ExtractOptions;
use crate::model::{AssetMap, BBox, ContentItem, ContentKind, ImageAsset, LayoutReport};

use super::crop::{auto_trim, crop, encode_png_data_uri, PixelRect};
use super::source::PageSource;
use super::transform::{to_raster, CoordinateTransform, PageTransforms};

/// Where an image region lands on its page raster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Geometry {
    /// A non-empty pixel region
    Region(PixelRect),
    /// The region is empty or outside the raster after clamping
    Degenerate,
}

impl Geometry {
    /// Locate a content-space box on a raster.
    pub fn locate(
        bbox: BBox,
        transform: &CoordinateTransform,
        raster: (u32, u32),
        pdf_size: (f64, f64),
    ) -> Self {
        let pdf_bbox = transform.invert(bbox);
        let raster_bbox = to_raster(pdf_bbox, raster.0, raster.1, pdf_size.0, pdf_size.1);
        match PixelRect::from_bbox(raster_bbox, raster.0, raster.1) {
            Some(rect) => Geometry::Region(rect),
            None => Geometry::Degenerate,
        }
    }
}

/// Crops image items out of rendered pages.
#[derive(Debug, Clone)]
pub struct AssetSynthesizer {
    render_scale: f32,
    trim_threshold: u8,
    trim_margin: u32,
    default_page_size: (f64, f64),
}

impl AssetSynthesizer {
    /// Create a synthesizer from extraction options.
    pub fn new(options: &ExtractOptions) -> Self {
        Self {
            render_scale: options.effective_render_scale(),
            trim_threshold: options.trim_threshold,
            trim_margin: options.trim_margin,
            default_page_size: options.default_page_size,
        }
    }

    /// Whether any item is an image with a path and a box.
    pub fn has_candidates(items: &[ContentItem]) -> bool {
        items.iter().any(is_candidate)
    }

    /// Build an asset map keyed by `img_path` for every croppable image item.
    ///
    /// Each page is rendered at most once. Items that fail are logged and
    /// left out of the map.
    pub fn synthesize(
        &self,
        items: &[ContentItem],
        layout: Option<&LayoutReport>,
        source: &dyn PageSource,
    ) -> AssetMap {
        let mut transforms = PageTransforms::new(layout, items);
        let mut pages: HashMap<u32, Option<RgbImage>> = HashMap::new();
        let mut assets = AssetMap::new();

        for item in items.iter().filter(|item| is_candidate(item)) {
            let (Some(path), Some(bbox)) = (item.img_path.as_deref(), item.bbox) else {
                continue;
            };
            let page_idx = item.page_idx;

            let page = pages.entry(page_idx).or_insert_with(|| {
                if page_idx as usize >= source.page_count() {
                    log::warn!("page {} out of range for image {}", page_idx, path);
                    return None;
                }
                match source.render_page(page_idx, self.render_scale) {
                    Ok(image) => {
                        log::debug!("rendered page {}: {:?}", page_idx, image.dimensions());
                        Some(image)
                    }
                    Err(e) => {
                        log::warn!("failed to render page {}: {}", page_idx, e);
                        None
                    }
                }
            });
            let Some(page) = page.as_ref() else {
                continue;
            };

            let transform = transforms.get(page_idx);
            let pdf_size = self.page_size(page_idx, layout, source);

            match self.crop_region(page, bbox, &transform, pdf_size) {
                Ok(Some(uri)) => {
                    assets.insert(path.to_string(), ImageAsset::Encoded(uri));
                }
                Ok(None) => {
                    log::warn!("degenerate region for image {}: {:?}", path, bbox);
                }
                Err(e) => {
                    log::warn!("failed to crop image {}: {}", path, e);
                }
            }
        }

        log::info!("synthesized {} image assets", assets.len());
        assets
    }

    /// PDF page size: layout report, then page source, then the default.
    pub fn page_size(
        &self,
        page_idx: u32,
        layout: Option<&LayoutReport>,
        source: &dyn PageSource,
    ) -> (f64, f64) {
        layout
            .and_then(|report| report.page(page_idx))
            .and_then(|page| page.size())
            .or_else(|| source.page_size(page_idx))
            .unwrap_or(self.default_page_size)
    }

    fn crop_region(
        &self,
        page: &RgbImage,
        bbox: BBox,
        transform: &CoordinateTransform,
        pdf_size: (f64, f64),
    ) -> Result<Option<String>> {
        let rect = match Geometry::locate(bbox, transform, page.dimensions(), pdf_size) {
            Geometry::Region(rect) => rect,
            Geometry::Degenerate => return Ok(None),
        };

        let cropped = crop(page, rect);
        let trimmed = auto_trim(&cropped, self.trim_threshold, self.trim_margin);
        encode_png_data_uri(&trimmed).map(Some)
    }
}

impl Default for AssetSynthesizer {
    fn default() -> Self {
        Self::new(&ExtractOptions::default())
    }
}

fn is_candidate(item: &ContentItem) -> bool {
    item.kind() == ContentKind::Image && item.img_path.is_some() && item.bbox.is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::raster::RasterPages;
    use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
    use image::Rgb;

    /// A 1190x1682 white page (595x841 at 2x) with a black square at
    /// PDF points (100,100)-(150,150).
    fn page_with_square() -> RgbImage {
        let mut page = RgbImage::from_pixel(1190, 1682, Rgb([255, 255, 255]));
        for x in 200..300 {
            for y in 200..300 {
                page.put_pixel(x, y, Rgb([0, 0, 0]));
            }
        }
        page
    }

    fn decode(uri: &str) -> RgbImage {
        let data = uri.strip_prefix("data:image/png;base64,").unwrap();
        let bytes = BASE64.decode(data).unwrap();
        image::load_from_memory(&bytes).unwrap().to_rgb8()
    }

    #[test]
    fn test_geometry() {
        let identity = CoordinateTransform::identity();
        let geometry = Geometry::locate([10.0, 10.0, 20.0, 30.0], &identity, (200, 200), (100.0, 100.0));
        assert_eq!(
            geometry,
            Geometry::Region(PixelRect { x1: 20, y1: 20, x2: 40, y2: 60 })
        );

        let geometry = Geometry::locate([150.0, 0.0, 160.0, 10.0], &identity, (200, 200), (100.0, 100.0));
        assert_eq!(geometry, Geometry::Degenerate);
    }

    #[test]
    fn test_synthesize_crops_and_trims() {
        let source = RasterPages::new(vec![page_with_square()]);
        let items = vec![
            ContentItem::new("image", "")
                .with_img_path("images/square.jpg")
                .with_bbox([90.0, 90.0, 160.0, 160.0]),
            ContentItem::new("text", "caption").with_bbox([0.0, 0.0, 10.0, 10.0]),
        ];

        let assets = AssetSynthesizer::default().synthesize(&items, None, &source);
        assert_eq!(assets.len(), 1);

        let uri = assets["images/square.jpg"].data_uri().unwrap();
        assert!(uri.starts_with("data:image/png;base64,"));
        // 100px square plus a 2px margin on each side
        assert_eq!(decode(&uri).dimensions(), (104, 104));
    }

    #[test]
    fn test_synthesize_skips_degenerate_and_missing_pages() {
        let source = RasterPages::new(vec![page_with_square()]);
        let items = vec![
            ContentItem::new("image", "")
                .with_img_path("flat.png")
                .with_bbox([100.0, 100.0, 100.1, 200.0]),
            ContentItem::new("image", "")
                .with_img_path("far.png")
                .with_bbox([10.0, 10.0, 20.0, 20.0])
                .with_page(5),
            ContentItem::new("image", "").with_bbox([10.0, 10.0, 20.0, 20.0]),
        ];

        let assets = AssetSynthesizer::default().synthesize(&items, None, &source);
        assert!(assets.is_empty());
    }

    struct FailingSource;

    impl PageSource for FailingSource {
        fn page_count(&self) -> usize {
            1
        }
        fn page_size(&self, _page_idx: u32) -> Option<(f64, f64)> {
            None
        }
        fn render_page(&self, _page_idx: u32, _scale: f32) -> Result<RgbImage> {
            Err(Error::Raster("no renderer".into()))
        }
    }

    #[test]
    fn test_render_failure_is_skipped() {
        let items = vec![ContentItem::new("image", "")
            .with_img_path("a.png")
            .with_bbox([0.0, 0.0, 50.0, 50.0])];
        let assets = AssetSynthesizer::default().synthesize(&items, None, &FailingSource);
        assert!(assets.is_empty());
    }

    #[test]
    fn test_page_size_precedence() {
        let synthesizer = AssetSynthesizer::default();
        let source = RasterPages::default().with_page(RgbImage::new(1, 1), Some((300.0, 400.0)));
        assert_eq!(synthesizer.page_size(0, None, &source), (300.0, 400.0));
        assert_eq!(synthesizer.page_size(1, None, &source), (595.0, 841.0));

        let layout: LayoutReport = serde_json::from_str(
            r#"{"pdf_info": [{"page_idx": 0, "page_size": [612, 792], "preproc_blocks": []}]}"#,
        )
        .unwrap();
        assert_eq!(synthesizer.page_size(0, Some(&layout), &source), (612.0, 792.0));
    }

    #[test]
    fn test_has_candidates() {
        let items = vec![ContentItem::new("image", "").with_img_path("a.png")];
        assert!(!AssetSynthesizer::has_candidates(&items));
        let items = vec![ContentItem::new("figure", "")
            .with_img_path("a.png")
            .with_bbox([0.0, 0.0, 1.0, 1.0])];
        assert!(AssetSynthesizer::has_candidates(&items));
    }
}
