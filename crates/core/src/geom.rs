//! Geometry types and the capture-space to document-space transform.
//!
//! Capture space is the pixel grid of an on-screen page preview: origin at
//! the top-left, y growing downward, scaled by the preview's render scale.
//! Document space is PDF user space: origin at the page's bottom-left,
//! unit one point, y growing upward. The vertical flip lives here, in one
//! pure function, and nowhere else.

/// An axis-aligned rectangle in document space, positioned by its
/// bottom-left corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// The context a preview was rendered under, needed to invert its
/// coordinate system.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CaptureContext {
    /// Pixels per point used when the page was rasterized
    pub render_scale: f64,
    /// Height of the target page in points.
    ///
    /// Always the target page's own height - pages in one document may
    /// differ in size, and passing a fixed or first-page height silently
    /// misplaces every signature vertically.
    pub page_height_pts: f64,
}

/// Where and how large to stamp the signature, in document space.
///
/// `x`/`y` position the rectangle's bottom-left corner, i.e. exactly what
/// [`to_document_space`] produces. When `width`/`height` are omitted the
/// image's intrinsic pixel dimensions are used as point dimensions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    /// 1-based page number; out-of-range values clamp to the nearest page
    pub page: u32,
    pub x: f64,
    pub y: f64,
    pub width: Option<f64>,
    pub height: Option<f64>,
}

impl Placement {
    pub fn new(page: u32, x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            page,
            x,
            y,
            width: Some(width),
            height: Some(height),
        }
    }

    /// Placement at intrinsic image size (1 pixel = 1 point).
    pub fn at(page: u32, x: f64, y: f64) -> Self {
        Self {
            page,
            x,
            y,
            width: None,
            height: None,
        }
    }
}

/// Convert a rectangle captured on a rasterized preview into document
/// space.
///
/// `pixel_x`/`pixel_y` are the rectangle's top-left corner in preview
/// pixels; the result positions the same rectangle by its bottom-left
/// corner in points. Extents divide by the render scale; the y axis flips
/// against the page height. No clamping is performed - a rectangle placed
/// outside the page is accepted and will render off-page.
pub fn to_document_space(
    pixel_x: f64,
    pixel_y: f64,
    pixel_width: f64,
    pixel_height: f64,
    ctx: CaptureContext,
) -> Rect {
    let x = pixel_x / ctx.render_scale;
    let y_top = pixel_y / ctx.render_scale;
    let width = pixel_width / ctx.render_scale;
    let height = pixel_height / ctx.render_scale;

    Rect {
        x,
        y: ctx.page_height_pts - y_top - height,
        width,
        height,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f64 = 1e-6;

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < TOLERANCE, "{} != {}", a, b);
    }

    #[test]
    fn test_letter_page_at_preview_scale() {
        // H=792, S=1.5, click at (120, 150), 90x50 px box
        let ctx = CaptureContext {
            render_scale: 1.5,
            page_height_pts: 792.0,
        };
        let rect = to_document_space(120.0, 150.0, 90.0, 50.0, ctx);

        assert_close(rect.x, 80.0);
        assert_close(rect.width, 60.0);
        assert_close(rect.height, 50.0 / 1.5);
        // y = 792 - 150/1.5 - 50/1.5 = 792 - 100 - 33.333...
        assert_close(rect.y, 658.0 + 2.0 / 3.0);
    }

    #[test]
    fn test_unit_scale_is_pure_flip() {
        let ctx = CaptureContext {
            render_scale: 1.0,
            page_height_pts: 842.0,
        };
        let rect = to_document_space(10.0, 20.0, 100.0, 40.0, ctx);

        assert_close(rect.x, 10.0);
        assert_close(rect.y, 842.0 - 20.0 - 40.0);
        assert_close(rect.width, 100.0);
        assert_close(rect.height, 40.0);
    }

    #[test]
    fn test_bottom_of_page_maps_to_zero() {
        let ctx = CaptureContext {
            render_scale: 2.0,
            page_height_pts: 400.0,
        };
        // A 100pt-tall box whose top edge sits 300pt down the preview
        let rect = to_document_space(0.0, 600.0, 0.0, 200.0, ctx);
        assert_close(rect.y, 0.0);
    }

    #[test]
    fn test_off_page_rectangle_not_clamped() {
        let ctx = CaptureContext {
            render_scale: 1.0,
            page_height_pts: 100.0,
        };
        let rect = to_document_space(-50.0, 150.0, 20.0, 20.0, ctx);
        assert_close(rect.x, -50.0);
        assert_close(rect.y, -70.0);
    }

    #[test]
    fn test_page_height_varies_per_page() {
        // Same click on two pages of different heights lands differently
        let click = (30.0, 60.0, 90.0, 30.0);
        let short = to_document_space(
            click.0,
            click.1,
            click.2,
            click.3,
            CaptureContext {
                render_scale: 1.0,
                page_height_pts: 300.0,
            },
        );
        let tall = to_document_space(
            click.0,
            click.1,
            click.2,
            click.3,
            CaptureContext {
                render_scale: 1.0,
                page_height_pts: 900.0,
            },
        );
        assert_close(tall.y - short.y, 600.0);
    }
}
