mod support;

use std::collections::HashSet;
use std::num::NonZeroUsize;
use std::sync::Arc;

use metrics_util::debugging::DebuggingRecorder;
use songbook::infra::cache_warmer::CacheWarmer;

use support::{MemorySongs, broken_cache_service, harness, song};

#[tokio::test]
async fn cache_paths_emit_expected_metric_keys() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();
    recorder
        .install()
        .expect("debug metrics recorder should install in this test process");

    // hit, miss and store fallback
    let h = harness();
    let cached = h
        .service
        .add_song("Muse", "Uprising")
        .await
        .expect("add")
        .report("add_song", 0);
    h.service.verses(cached, 1, 1).await.expect("cache hit");
    let uncached = h.store.insert(song("Muse", "Resistance")).await;
    h.service.verses(uncached, 1, 1).await.expect("store fallback");

    // warm latency
    CacheWarmer::new(h.store.clone(), h.cache.clone(), NonZeroUsize::MIN)
        .warm_initial()
        .await
        .expect("warm");

    // mirror failure
    let broken = broken_cache_service(Arc::new(MemorySongs::default()));
    broken
        .add_song("Muse", "Exogenesis")
        .await
        .expect("add")
        .report("add_song", 0);

    let names: HashSet<String> = snapshotter
        .snapshot()
        .into_vec()
        .into_iter()
        .map(|(composite_key, _, _, _)| composite_key.key().name().to_string())
        .collect();

    let expected = [
        "songbook_cache_hit_total",
        "songbook_cache_miss_total",
        "songbook_store_fallback_total",
        "songbook_cache_mirror_failure_total",
        "songbook_cache_warm_ms",
    ];

    for metric in expected {
        assert!(names.contains(metric), "missing metric: {metric}");
    }
}
