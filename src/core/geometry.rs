//! Pixel-snapping math shared by every shape renderer.
//!
//! All helpers are pure and hold exactly for the device pixel ratios the
//! renderers care about (1, 2, 3).

/// Half-open span in bitmap (device pixel) coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitmapSpan {
    pub position: i64,
    pub length: i64,
}

/// Maps a media-coordinate interval `[p1, p2]` to a bitmap span.
///
/// Endpoint order does not matter. A degenerate interval (`p1 == p2`)
/// still covers one device pixel.
#[must_use]
pub fn positions_box(p1: f64, p2: f64, ratio: f64) -> BitmapSpan {
    let scaled1 = (p1 * ratio).round() as i64;
    let scaled2 = (p2 * ratio).round() as i64;
    BitmapSpan {
        position: scaled1.min(scaled2),
        length: (scaled2 - scaled1).abs() + 1,
    }
}

/// Centers a stroke of `desired_width` on a media coordinate and snaps it to
/// whole device pixels.
///
/// When `width_is_bitmap` is set the width is already expressed in device
/// pixels and is not rescaled.
#[must_use]
pub fn positions_line(pos: f64, ratio: f64, desired_width: f64, width_is_bitmap: bool) -> BitmapSpan {
    let scaled_pos = (pos * ratio).round() as i64;
    let bitmap_width = if width_is_bitmap {
        desired_width.round() as i64
    } else {
        (desired_width * ratio).round() as i64
    };
    BitmapSpan {
        position: scaled_pos - bitmap_width.div_euclid(2),
        length: bitmap_width,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn degenerate_box_covers_one_pixel() {
        for ratio in [1.0, 2.0, 3.0] {
            let span = positions_box(4.3, 4.3, ratio);
            assert_eq!(span.length, 1);
            assert_eq!(span.position, (4.3_f64 * ratio).round() as i64);
        }
    }

    #[test]
    fn box_is_order_independent() {
        assert_eq!(positions_box(2.0, 9.0, 2.0), positions_box(9.0, 2.0, 2.0));
    }

    #[test]
    fn line_width_in_bitmap_pixels_is_not_rescaled() {
        let span = positions_line(10.0, 2.0, 3.0, true);
        assert_eq!(span.length, 3);
        assert_eq!(span.position, 20 - 1);
    }

    #[test]
    fn line_width_in_media_pixels_is_rescaled() {
        let span = positions_line(10.0, 2.0, 3.0, false);
        assert_eq!(span.length, 6);
        assert_eq!(span.position, 20 - 3);
    }
}
