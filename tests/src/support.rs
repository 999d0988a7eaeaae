//! Shared fixtures for the integration scenarios

use std::sync::{Arc, Once};

use scalable_bloom::{FilterConfig, FilterStore, InMemoryFilterStore, ScalableFilter};
use tracing_subscriber::EnvFilter;

static TRACING: Once = Once::new();

/// Install a test-writer fmt subscriber once per test binary
///
/// Honors `RUST_LOG`; defaults to warnings only.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .try_init();
    });
}

/// Level 0 holds 10 items at 1% error, doubling per level
pub fn small_config() -> FilterConfig {
    FilterConfig::default()
        .with_base_capacity(10)
        .with_base_error_rate(0.01)
        .with_growth_ratio(0.9)
        .with_scale(2)
}

pub fn shared_store() -> Arc<InMemoryFilterStore> {
    init_tracing();
    Arc::new(InMemoryFilterStore::new())
}

pub async fn small_filter<S: FilterStore + ?Sized>(store: &Arc<S>, name: &str) -> ScalableFilter<S> {
    ScalableFilter::initialize(store.clone(), name, small_config())
        .await
        .unwrap()
}

pub fn item(i: usize) -> Vec<u8> {
    format!("item-{}", i).into_bytes()
}

pub fn items(range: std::ops::Range<usize>) -> Vec<Vec<u8>> {
    range.map(item).collect()
}
