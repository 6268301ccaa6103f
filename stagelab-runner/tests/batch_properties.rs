//! Property tests for batch-level guarantees.
//!
//! 1. Output is sorted by security id in every execution mode
//! 2. Parallel and sequential runs produce identical snapshots

use proptest::prelude::*;
use stagelab_core::data::InMemoryPrices;
use stagelab_runner::{generate_universe, run_batch, BatchConfig, SyntheticConfig};

proptest! {
    #![proptest_config(ProptestConfig::with_cases(8))]

    #[test]
    fn batch_is_sorted_and_mode_independent(securities in 1usize..6, seed in 0u64..1000) {
        let universe = generate_universe(&SyntheticConfig {
            securities,
            days: 150,
            seed,
            ..SyntheticConfig::default()
        });
        let reference = universe[0].last_date().unwrap();
        let source = InMemoryPrices::from_series("synthetic", universe);

        let mut config = BatchConfig::default();
        config.batch.reference_date = Some(reference);
        config.batch.parallel = false;
        let sequential = run_batch(&config, &source, None, reference).unwrap();
        config.batch.parallel = true;
        let parallel = run_batch(&config, &source, None, reference).unwrap();

        let ids: Vec<&str> = parallel.snapshots.iter().map(|s| s.security_id.as_str()).collect();
        let mut sorted = ids.clone();
        sorted.sort();
        prop_assert_eq!(&ids, &sorted);
        prop_assert_eq!(ids.len(), securities);
        prop_assert_eq!(
            serde_json::to_value(&sequential.snapshots).unwrap(),
            serde_json::to_value(&parallel.snapshots).unwrap()
        );
    }
}
