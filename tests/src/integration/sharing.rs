//! # Shared Filter Scenarios
//!
//! Handles created independently on the same store behave as one filter:
//! writes through any handle are visible through every other handle, with no
//! state cached in between.

#[cfg(test)]
mod tests {
    use scalable_bloom::{ScalableFilter, ScalableFilterApi};

    use crate::support::{item, items, shared_store, small_filter};

    #[tokio::test]
    async fn test_add_on_one_handle_visible_on_another() {
        let store = shared_store();
        let writer = small_filter(&store, "visits").await;
        let reader = ScalableFilter::open(store.clone(), "visits").await.unwrap();

        writer.add(b"alice").await.unwrap();

        assert!(reader.contains(b"alice").await.unwrap());
        assert!(!reader.contains(b"bob").await.unwrap());
    }

    #[tokio::test]
    async fn test_growth_by_one_handle_seen_by_all() {
        let store = shared_store();
        let first = small_filter(&store, "visits").await;
        let second = small_filter(&store, "visits").await;

        for i in 0..10 {
            first.add(&item(i)).await.unwrap();
        }
        // The second handle sees the full level and grows the filter
        let receipt = second.add(&item(10)).await.unwrap();
        assert_eq!(receipt.level, 1);

        assert_eq!(first.level_count().await.unwrap(), 2);
        for i in 0..=10 {
            assert!(first.contains(&item(i)).await.unwrap());
        }
    }

    #[tokio::test]
    async fn test_interleaved_writers_no_false_negatives() {
        let store = shared_store();
        let handles = vec![
            small_filter(&store, "visits").await,
            small_filter(&store, "visits").await,
            small_filter(&store, "visits").await,
        ];

        for i in 0..300 {
            handles[i % handles.len()].add(&item(i)).await.unwrap();
        }

        let reader = ScalableFilter::open(store.clone(), "visits").await.unwrap();
        for i in 0..300 {
            assert!(reader.contains(&item(i)).await.unwrap(), "item-{} missing", i);
        }

        let stats = reader.stats().await.unwrap();
        assert_eq!(stats.count(), 300);
        // 10 + 20 + 40 + 80 = 150 < 300 <= 310
        assert_eq!(stats.level_count(), 5);
    }

    #[tokio::test]
    async fn test_filters_with_different_names_are_independent() {
        let store = shared_store();
        let visits = small_filter(&store, "visits").await;
        let clicks = small_filter(&store, "clicks").await;

        visits.add_many(&items(0..50)).await.unwrap();

        assert!(visits.contains(&item(1)).await.unwrap());
        assert!(!clicks.contains(&item(1)).await.unwrap());
        assert_eq!(clicks.level_count().await.unwrap(), 1);
        assert_eq!(clicks.stats().await.unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_handles_through_api_trait() {
        let store = shared_store();
        let handles: Vec<Box<dyn ScalableFilterApi>> = vec![
            Box::new(small_filter(&store, "visits").await),
            Box::new(ScalableFilter::open(store.clone(), "visits").await.unwrap()),
        ];

        handles[0].add(b"alice").await.unwrap();
        handles[1].add_many(&[b"bob".to_vec(), b"carol".to_vec()]).await.unwrap();

        for handle in &handles {
            assert!(handle.contains(b"alice").await.unwrap());
            assert!(handle.contains(b"carol").await.unwrap());
            assert_eq!(handle.stats().await.unwrap().count(), 3);
        }
    }
}
