/// Property tests for curve planning and chapter classification.

use novel_planner::core::curve::{plan_curve, CurveType};
use novel_planner::core::plot::PlotManager;
use novel_planner::core::volume::VolumeManager;
use novel_planner::schema::chapter::ChapterType;
use proptest::prelude::*;

fn arb_curve_type() -> impl Strategy<Value = CurveType> {
    prop_oneof![
        Just(CurveType::WaveWithClimax),
        Just(CurveType::Linear),
        Just(CurveType::Exponential),
    ]
}

proptest! {
    /// Every curve has one value per chapter, all within [0, 1].
    #[test]
    fn prop_curve_is_bounded(n in 1u32..500, curve_type in arb_curve_type()) {
        let curve = plan_curve(n, curve_type);
        prop_assert_eq!(curve.len(), n as usize);
        for (i, v) in curve.iter().enumerate() {
            prop_assert!((0.0..=1.0).contains(v), "chapter {} has intensity {}", i + 1, v);
        }
    }

    /// Linear and exponential curves never decrease.
    #[test]
    fn prop_monotone_curves(n in 2u32..300) {
        for curve_type in [CurveType::Linear, CurveType::Exponential] {
            let curve = plan_curve(n, curve_type);
            prop_assert!(curve.windows(2).all(|w| w[1] + 1e-12 >= w[0]));
        }
    }

    /// Chapter phases never move backwards through the book.
    #[test]
    fn prop_phases_are_ordered(n in 2u32..300) {
        let plot = PlotManager::new(n, CurveType::Linear);
        let rank = |t: ChapterType| ChapterType::ALL.iter().position(|x| *x == t);
        let ranks: Vec<_> = (1..=n).map(|ch| rank(plot.chapter_type(ch, None))).collect();
        prop_assert!(ranks.windows(2).all(|w| w[0] <= w[1]));
        prop_assert_eq!(plot.chapter_type(1, None), ChapterType::Opening);
    }

    /// Volumes partition the book exactly.
    #[test]
    fn prop_volumes_partition(n in 1u32..1000, size in proptest::option::of(1u32..60)) {
        let mut volumes = VolumeManager::new();
        let plan = volumes.plan_volumes("t", "g", "th", n, size).unwrap();
        prop_assert!(plan.validate().is_ok());
        prop_assert_eq!(plan.volumes.iter().map(|v| v.chapter_count).sum::<u32>(), n);
    }
}
