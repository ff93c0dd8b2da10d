//! Property-based tests for scroll metric computation.
//!
//! For any scrollable page, the emitted percentage is the position over the
//! scrollable range and the pixel value is the offset itself. Pages without a
//! scrollable range never produce metrics.

use proptest::prelude::*;

use splitscroll::types::scroll::ScrollMetrics;

// **Property 1: Metrics reflect the position within the range**
proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn metrics_match_position(range in 1u32..100_000, frac in 0.0f64..=1.0, viewport in 1u32..4000) {
        let y = (frac * range as f64).floor();
        let height = range as f64 + viewport as f64;

        let m = ScrollMetrics::compute(y, height, viewport as f64).unwrap();
        prop_assert_eq!(m.percentage, y / range as f64);
        prop_assert_eq!(m.pixel, y as u64);
        prop_assert!((0.0..=1.0).contains(&m.percentage));
    }

    #[test]
    fn overscroll_is_clamped(range in 1u32..10_000, past in 1u32..5000) {
        let height = range as f64 + 600.0;

        let below = ScrollMetrics::compute(range as f64 + past as f64, height, 600.0).unwrap();
        prop_assert_eq!(below.percentage, 1.0);

        let above = ScrollMetrics::compute(-(past as f64), height, 600.0).unwrap();
        prop_assert_eq!(above.percentage, 0.0);
        prop_assert_eq!(above.pixel, 0);
    }
}

// **Property 2: No scrollable range, no metrics**
proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn non_scrollable_pages_emit_nothing(viewport in 1u32..4000, shortfall in 0u32..4000, y in 0u32..1000) {
        let height = viewport.saturating_sub(shortfall) as f64;
        prop_assert!(ScrollMetrics::compute(y as f64, height, viewport as f64).is_none());
    }
}
