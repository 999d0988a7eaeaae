//! # Lifecycle Scenarios
//!
//! Creating, reopening, flushing and expiring filters. A filter lives only in
//! the store: dropping every handle loses nothing.

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use scalable_bloom::{FilterError, ScalableFilter};

    use crate::support::{item, items, shared_store, small_config, small_filter};

    #[tokio::test]
    async fn test_open_unknown_filter_is_not_found() {
        let store = shared_store();

        match ScalableFilter::open(store.clone(), "never-created").await {
            Err(FilterError::NotFound(name)) => assert_eq!(name, "never-created"),
            Err(other) => panic!("unexpected error: {}", other),
            Ok(_) => panic!("opened a filter that was never created"),
        }
        assert!(!FilterError::NotFound("x".into()).is_retryable());
    }

    #[tokio::test]
    async fn test_reinitialize_with_other_error_rate_is_mismatch() {
        let store = shared_store();
        small_filter(&store, "visits").await;

        let result = ScalableFilter::initialize(
            store.clone(),
            "visits",
            small_config().with_base_error_rate(0.05),
        )
        .await;

        match result {
            Err(FilterError::ConfigurationMismatch { field, .. }) => {
                assert_eq!(field, "base_error_rate")
            }
            Err(other) => panic!("unexpected error: {}", other),
            Ok(_) => panic!("initialize accepted a different configuration"),
        }
    }

    #[tokio::test]
    async fn test_state_survives_dropping_all_handles() {
        let store = shared_store();
        let before = {
            let filter = small_filter(&store, "visits").await;
            filter.add_many(&items(0..75)).await.unwrap();
            filter.stats().await.unwrap()
        };

        let reopened = ScalableFilter::open(store.clone(), "visits").await.unwrap();

        assert_eq!(reopened.stats().await.unwrap(), before);
        for i in 0..75 {
            assert!(reopened.contains(&item(i)).await.unwrap());
        }
    }

    #[tokio::test]
    async fn test_flush_then_recreate_with_new_config() {
        let store = shared_store();
        let filter = small_filter(&store, "visits").await;
        filter.add_many(&items(0..40)).await.unwrap();

        filter.flush().await.unwrap();
        assert_eq!(store.key_count(), 0);
        assert!(matches!(
            filter.add(b"late").await,
            Err(FilterError::NotFound(_))
        ));

        let config = small_config().with_base_capacity(500);
        let recreated = ScalableFilter::initialize(store.clone(), "visits", config.clone())
            .await
            .unwrap();
        assert_eq!(recreated.config(), &config);
        assert!(!recreated.contains(&item(1)).await.unwrap());
    }

    #[tokio::test]
    async fn test_flush_leaves_other_filters() {
        let store = shared_store();
        let visits = small_filter(&store, "visits").await;
        let clicks = small_filter(&store, "clicks").await;
        visits.add_many(&items(0..40)).await.unwrap();
        clicks.add(b"alice").await.unwrap();

        visits.flush().await.unwrap();

        assert!(clicks.contains(b"alice").await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_filter_disappears() {
        let store = shared_store();
        let filter = small_filter(&store, "visits").await;
        filter.add_many(&items(0..40)).await.unwrap();

        filter.expire(Duration::from_secs(30)).await.unwrap();
        tokio::time::advance(Duration::from_secs(10)).await;
        assert!(filter.contains(&item(5)).await.unwrap());

        tokio::time::advance(Duration::from_secs(21)).await;
        assert!(matches!(
            filter.contains(&item(5)).await,
            Err(FilterError::NotFound(_))
        ));
        assert_eq!(store.key_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_filter_grown_after_expire_can_be_recreated() {
        let store = shared_store();
        let filter = small_filter(&store, "visits").await;
        filter.add_many(&items(0..10)).await.unwrap();

        filter.expire(Duration::from_secs(30)).await.unwrap();
        filter.add(&item(10)).await.unwrap();
        assert_eq!(filter.level_count().await.unwrap(), 2);

        tokio::time::advance(Duration::from_secs(31)).await;
        assert_eq!(store.key_count(), 0);

        let recreated = ScalableFilter::initialize(
            store.clone(),
            "visits",
            small_config().with_base_capacity(20),
        )
        .await
        .unwrap();
        for i in 0..21 {
            recreated.add(&item(i)).await.unwrap();
        }

        let stats = recreated.stats().await.unwrap();
        assert_eq!(stats.level_count(), 2);
        assert_eq!(stats.levels[1].params.capacity, 40);
        assert_eq!(stats.levels[1].count, 1);
    }

    #[cfg(feature = "rocksdb")]
    #[tokio::test]
    async fn test_rocksdb_filter_survives_restart() {
        use std::sync::Arc;

        use scalable_bloom::{RocksDbFilterStore, RocksDbStoreConfig};
        use tempfile::TempDir;

        crate::support::init_tracing();
        let dir = TempDir::new().unwrap();
        let config = RocksDbStoreConfig::for_testing(dir.path().to_string_lossy().to_string());

        {
            let store = Arc::new(RocksDbFilterStore::open(config.clone()).unwrap());
            let filter = small_filter(&store, "visits").await;
            filter.add_many(&items(0..50)).await.unwrap();
            assert_eq!(filter.level_count().await.unwrap(), 3);
        }

        let store = Arc::new(RocksDbFilterStore::open(config).unwrap());
        let filter = ScalableFilter::open(store, "visits").await.unwrap();

        assert_eq!(filter.config(), &small_config());
        assert_eq!(filter.level_count().await.unwrap(), 3);
        assert_eq!(filter.stats().await.unwrap().count(), 50);
        for i in 0..50 {
            assert!(filter.contains(&item(i)).await.unwrap());
        }
    }
}
