use chart_overlays::core::{positions_box, positions_line};
use proptest::prelude::*;

proptest! {
    #[test]
    fn degenerate_box_always_covers_one_pixel(
        p in -10_000.0f64..10_000.0,
        ratio_idx in 0usize..3
    ) {
        let ratio = [1.0, 2.0, 3.0][ratio_idx];
        let span = positions_box(p, p, ratio);
        prop_assert_eq!(span.length, 1);
        prop_assert_eq!(span.position, (p * ratio).round() as i64);
    }

    #[test]
    fn ordered_box_length_matches_rounded_span(
        p1 in -10_000.0f64..10_000.0,
        delta in 0.0f64..5_000.0,
        ratio_idx in 0usize..3
    ) {
        let ratio = [1.0, 2.0, 3.0][ratio_idx];
        let p2 = p1 + delta;
        let span = positions_box(p1, p2, ratio);
        let expected = ((p2 * ratio).round() as i64) - ((p1 * ratio).round() as i64) + 1;
        prop_assert_eq!(span.length, expected);
        prop_assert!(span.length >= 1);
    }

    #[test]
    fn box_order_independence(
        p1 in -10_000.0f64..10_000.0,
        p2 in -10_000.0f64..10_000.0,
        ratio_idx in 0usize..3
    ) {
        let ratio = [1.0, 2.0, 3.0][ratio_idx];
        prop_assert_eq!(positions_box(p1, p2, ratio), positions_box(p2, p1, ratio));
    }

    #[test]
    fn line_span_covers_requested_bitmap_width(
        pos in -10_000.0f64..10_000.0,
        width in 1.0f64..32.0,
        ratio_idx in 0usize..3
    ) {
        let ratio = [1.0, 2.0, 3.0][ratio_idx];
        let span = positions_line(pos, ratio, width.round(), true);
        prop_assert_eq!(span.length, width.round() as i64);
        let scaled = (pos * ratio).round() as i64;
        prop_assert!(span.position <= scaled);
        prop_assert!(span.position + span.length > scaled);
    }
}
