//! Coordinate transforms between layout, content and raster space.
//!
//! One backend reports image boxes in a "content" space that is an affine
//! (scale + offset) image of the layout space its structural report uses.
//! The transform for a page is recovered from one pair of corresponding
//! boxes, inverted to get back to PDF points, then scaled to the raster.

use std::collections::HashMap;

use crate::model::{BBox, ContentItem, LayoutReport};

/// Per-axis scale and offset mapping layout space to content space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinateTransform {
    /// Horizontal scale
    pub scale_x: f64,
    /// Vertical scale
    pub scale_y: f64,
    /// Horizontal offset
    pub offset_x: f64,
    /// Vertical offset
    pub offset_y: f64,
}

impl CoordinateTransform {
    /// The transform that changes nothing.
    pub fn identity() -> Self {
        Self {
            scale_x: 1.0,
            scale_y: 1.0,
            offset_x: 0.0,
            offset_y: 0.0,
        }
    }

    /// Derive a transform from a layout box and the content box it maps to.
    ///
    /// An axis whose layout span is not positive keeps a scale of 1.
    pub fn from_pair(layout: BBox, content: BBox) -> Self {
        let scale_x = axis_scale(layout[0], layout[2], content[0], content[2]);
        let scale_y = axis_scale(layout[1], layout[3], content[1], content[3]);
        Self {
            scale_x,
            scale_y,
            offset_x: content[0] - layout[0] * scale_x,
            offset_y: content[1] - layout[1] * scale_y,
        }
    }

    /// Map a layout box into content space.
    pub fn apply(&self, bbox: BBox) -> BBox {
        [
            bbox[0] * self.scale_x + self.offset_x,
            bbox[1] * self.scale_y + self.offset_y,
            bbox[2] * self.scale_x + self.offset_x,
            bbox[3] * self.scale_y + self.offset_y,
        ]
    }

    /// Map a content box back into layout (PDF point) space.
    ///
    /// A zero or non-finite scale leaves that axis undivided.
    pub fn invert(&self, bbox: BBox) -> BBox {
        let unscale = |v: f64, scale: f64| {
            if scale != 0.0 && scale.is_finite() {
                v / scale
            } else {
                v
            }
        };
        [
            unscale(bbox[0] - self.offset_x, self.scale_x),
            unscale(bbox[1] - self.offset_y, self.scale_y),
            unscale(bbox[2] - self.offset_x, self.scale_x),
            unscale(bbox[3] - self.offset_y, self.scale_y),
        ]
    }

    /// Whether this is the identity transform.
    pub fn is_identity(&self) -> bool {
        *self == Self::identity()
    }
}

impl Default for CoordinateTransform {
    fn default() -> Self {
        Self::identity()
    }
}

fn axis_scale(layout_min: f64, layout_max: f64, content_min: f64, content_max: f64) -> f64 {
    let layout_span = layout_max - layout_min;
    let content_span = content_max - content_min;
    if layout_span > 0.0 && layout_span.is_finite() && content_span.is_finite() {
        content_span / layout_span
    } else {
        1.0
    }
}

/// Scale a PDF-space box to raster pixels.
///
/// A non-positive PDF dimension uses a factor of 1 on that axis.
pub fn to_raster(bbox: BBox, raster_w: u32, raster_h: u32, pdf_w: f64, pdf_h: f64) -> BBox {
    let sx = if pdf_w > 0.0 {
        f64::from(raster_w) / pdf_w
    } else {
        1.0
    };
    let sy = if pdf_h > 0.0 {
        f64::from(raster_h) / pdf_h
    } else {
        1.0
    };
    [bbox[0] * sx, bbox[1] * sy, bbox[2] * sx, bbox[3] * sy]
}

/// Lazily computed transforms for the pages of one extraction call.
pub struct PageTransforms<'a> {
    layout: Option<&'a LayoutReport>,
    items: &'a [ContentItem],
    cache: HashMap<u32, CoordinateTransform>,
}

impl<'a> PageTransforms<'a> {
    /// Create an empty cache over a layout report and content items.
    pub fn new(layout: Option<&'a LayoutReport>, items: &'a [ContentItem]) -> Self {
        Self {
            layout,
            items,
            cache: HashMap::new(),
        }
    }

    /// Transform for a page, computed on first use.
    ///
    /// Uses the first layout block with a box and the first content item with
    /// a box on that page; identity when either is missing.
    pub fn get(&mut self, page_idx: u32) -> CoordinateTransform {
        if let Some(transform) = self.cache.get(&page_idx) {
            return *transform;
        }

        let layout_bbox = self
            .layout
            .and_then(|report| report.page(page_idx))
            .and_then(|page| page.first_bbox());
        let content_bbox = self
            .items
            .iter()
            .filter(|item| item.page_idx == page_idx)
            .find_map(|item| item.bbox);

        let transform = match (layout_bbox, content_bbox) {
            (Some(layout), Some(content)) => CoordinateTransform::from_pair(layout, content),
            _ => CoordinateTransform::identity(),
        };
        log::debug!("page {} transform: {:?}", page_idx, transform);

        self.cache.insert(page_idx, transform);
        transform
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{LayoutBlock, LayoutPage};

    fn assert_bbox_eq(a: BBox, b: BBox) {
        for (x, y) in a.iter().zip(b.iter()) {
            assert!((x - y).abs() < 1e-9, "{:?} != {:?}", a, b);
        }
    }

    #[test]
    fn test_identity() {
        let bbox = [10.0, 20.0, 30.0, 40.0];
        let identity = CoordinateTransform::identity();
        assert_eq!(identity.apply(bbox), bbox);
        assert_eq!(identity.invert(bbox), bbox);
        assert!(identity.is_identity());
    }

    #[test]
    fn test_from_pair_round_trip() {
        let layout = [10.0, 20.0, 110.0, 220.0];
        let content = [50.0, 60.0, 250.0, 460.0];
        let transform = CoordinateTransform::from_pair(layout, content);

        assert_eq!(transform.scale_x, 2.0);
        assert_eq!(transform.scale_y, 2.0);
        assert_eq!(transform.offset_x, 30.0);
        assert_eq!(transform.offset_y, 20.0);
        assert_bbox_eq(transform.apply(layout), content);

        let other = [0.0, 5.0, 42.0, 77.0];
        assert_bbox_eq(transform.invert(transform.apply(other)), other);
    }

    #[test]
    fn test_degenerate_layout_span() {
        let transform = CoordinateTransform::from_pair([5.0, 5.0, 5.0, 5.0], [1.0, 2.0, 3.0, 4.0]);
        assert_eq!(transform.scale_x, 1.0);
        assert_eq!(transform.scale_y, 1.0);
        assert_eq!(transform.offset_x, -4.0);
    }

    #[test]
    fn test_zero_scale_invert() {
        let transform = CoordinateTransform {
            scale_x: 0.0,
            scale_y: 2.0,
            offset_x: 1.0,
            offset_y: 0.0,
        };
        assert_eq!(transform.invert([3.0, 4.0, 5.0, 6.0]), [2.0, 2.0, 4.0, 3.0]);
    }

    #[test]
    fn test_to_raster() {
        let bbox = to_raster([100.0, 100.0, 200.0, 300.0], 1190, 1682, 595.0, 841.0);
        assert_bbox_eq(bbox, [200.0, 200.0, 400.0, 600.0]);

        let bbox = to_raster([1.0, 2.0, 3.0, 4.0], 100, 100, 0.0, -5.0);
        assert_eq!(bbox, [1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_page_transforms() {
        let layout = LayoutReport {
            pdf_info: vec![LayoutPage {
                page_idx: Some(0),
                width: Some(595.0),
                height: Some(841.0),
                preproc_blocks: vec![
                    LayoutBlock {
                        block_type: "title".into(),
                        bbox: None,
                    },
                    LayoutBlock {
                        block_type: "text".into(),
                        bbox: Some([10.0, 10.0, 20.0, 20.0]),
                    },
                ],
            }],
        };
        let items = vec![
            ContentItem::new("text", "no box"),
            ContentItem::new("text", "boxed").with_bbox([20.0, 20.0, 40.0, 40.0]),
            ContentItem::new("text", "other page")
                .with_bbox([0.0, 0.0, 1.0, 1.0])
                .with_page(1),
        ];

        let mut transforms = PageTransforms::new(Some(&layout), &items);
        let page0 = transforms.get(0);
        assert_eq!(page0.scale_x, 2.0);
        assert_eq!(page0.offset_x, 0.0);

        assert!(transforms.get(1).is_identity());
        assert!(PageTransforms::new(None, &items).get(0).is_identity());
    }
}
