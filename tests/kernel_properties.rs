use ferrite_filter::{build_filter_set, generate_kernel, FilterParams};
use proptest::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

fn odd_size() -> impl Strategy<Value = usize> {
    (0usize..6).prop_map(|n| 2 * n + 1)
}

#[test]
fn kernels_are_normalized() {
    proptest!(|(size in odd_size(), blur in 0.001f64..50.0, center in prop::option::of(0.0f64..10.0), seed in any::<u64>())| {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let kernel = generate_kernel(size, blur, center, &mut rng).unwrap();
        prop_assert_eq!(kernel.weights().len(), size * size);
        prop_assert!((kernel.sum() - 1.0).abs() < 1e-9);
        prop_assert!(kernel.weights().iter().all(|w| *w >= 0.0 && w.is_finite()));
    });
}

#[test]
fn filter_sets_cover_every_label() {
    proptest!(|(n in 0usize..16, seed in any::<u64>())| {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let set = build_filter_set(n, &FilterParams::new(3, 1.0, Some(1.0)), &mut rng).unwrap();
        prop_assert_eq!(set.len(), n);
        for label in 0..n {
            prop_assert!(set.get(label).is_ok());
        }
        prop_assert!(set.get(n).is_err());
    });
}

#[test]
fn center_weight_is_at_least_its_share_of_a_bounded_total() {
    // All random entries are below `blur`, so the pinned center can never be
    // diluted below center / (center + (size² - 1) · blur).
    proptest!(|(blur in 0.01f64..5.0, center in 0.01f64..5.0, seed in any::<u64>())| {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let kernel = generate_kernel(3, blur, Some(center), &mut rng).unwrap();
        let floor = center / (center + 8.0 * blur);
        prop_assert!(kernel.center() >= floor - 1e-12);
        prop_assert!(kernel.center() <= 1.0 + 1e-12);
    });
}
