//! # Concurrency Scenarios
//!
//! Independent handles racing on one filter, each standing in for a separate
//! process. Growth is decided by compare-and-swap on the level count, so a
//! race appends exactly one level however many writers see the full level.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use scalable_bloom::service::MetadataStore;
    use scalable_bloom::{FilterError, Metrics, ScalableFilter};

    use crate::support::{item, shared_store, small_config, small_filter};

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_growth_race_appends_exactly_one_level() {
        let store = shared_store();
        let seed = small_filter(&store, "visits").await;
        for i in 0..10 {
            seed.add(&item(i)).await.unwrap();
        }

        let metrics = Arc::new(Metrics::new());
        let mut tasks = Vec::new();
        // 16 writers fit in level 1 (capacity 20), so only the full level 0 triggers growth
        for i in 10..26 {
            let store = store.clone();
            let metrics = metrics.clone();
            tasks.push(tokio::spawn(async move {
                let handle = ScalableFilter::open(store, "visits")
                    .await
                    .unwrap()
                    .with_metrics(metrics);
                handle.add(&item(i)).await.unwrap()
            }));
        }
        for task in tasks {
            assert_eq!(task.await.unwrap().level, 1);
        }

        let stats = seed.stats().await.unwrap();
        assert_eq!(stats.level_count(), 2);
        assert_eq!(stats.levels[0].count, 10);
        assert_eq!(stats.levels[1].count, 16);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.levels_created, 1);
        assert!(snapshot.growth_races_lost <= 15);

        for i in 0..26 {
            assert!(seed.contains(&item(i)).await.unwrap());
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_writers_leave_no_gaps() {
        let store = shared_store();
        let seed = small_filter(&store, "visits").await;

        let mut tasks = Vec::new();
        for writer in 0..8 {
            let store = store.clone();
            tasks.push(tokio::spawn(async move {
                let handle = ScalableFilter::open(store, "visits").await.unwrap();
                for i in 0..50 {
                    handle.add(&item(writer * 50 + i)).await.unwrap();
                }
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        let stats = seed.stats().await.unwrap();
        assert_eq!(stats.count(), 400);
        // Levels 0..=4 hold 310 items plus at most 7 in-flight overshoot each,
        // which leaves at least 55 items for level 5
        assert_eq!(stats.level_count(), 6);

        let metadata = MetadataStore::new(store.clone(), seed.keys().clone());
        for index in 0..stats.level_count() {
            assert!(metadata.level_meta(index).await.unwrap().is_some());
        }
        assert!(metadata.level_meta(stats.level_count()).await.unwrap().is_none());

        for i in 0..400 {
            assert!(seed.contains(&item(i)).await.unwrap(), "item-{} missing", i);
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_racing_initializers_create_one_filter() {
        let store = shared_store();

        let mut tasks = Vec::new();
        for _ in 0..8 {
            let store = store.clone();
            tasks.push(tokio::spawn(async move {
                ScalableFilter::initialize(store, "visits", small_config()).await
            }));
        }
        for task in tasks {
            let filter = task.await.unwrap().unwrap();
            assert_eq!(filter.config(), &small_config());
        }

        let filter = ScalableFilter::open(store.clone(), "visits").await.unwrap();
        assert_eq!(filter.level_count().await.unwrap(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_racing_initializers_with_different_configs() {
        let store = shared_store();

        let mut tasks = Vec::new();
        for capacity in [10u64, 20, 10, 20, 10, 20] {
            let store = store.clone();
            tasks.push(tokio::spawn(async move {
                let config = small_config().with_base_capacity(capacity);
                (
                    capacity,
                    ScalableFilter::initialize(store, "visits", config).await,
                )
            }));
        }

        let mut results = Vec::new();
        for task in tasks {
            results.push(task.await.unwrap());
        }

        let winner = ScalableFilter::open(store.clone(), "visits")
            .await
            .unwrap()
            .config()
            .base_capacity;

        for (capacity, result) in results {
            match result {
                Ok(filter) => assert_eq!(filter.config().base_capacity, winner),
                Err(FilterError::ConfigurationMismatch { field, .. }) => {
                    assert_ne!(capacity, winner);
                    assert_eq!(field, "base_capacity");
                }
                Err(other) => panic!("unexpected error: {}", other),
            }
        }
        assert!(winner == 10 || winner == 20);
    }
}
