use std::sync::Once;

use metrics::{Unit, describe_counter, describe_histogram};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::config::{LogFormat, LoggingSettings};

use super::error::InfraError;

static METRIC_DESCRIPTIONS: Once = Once::new();

/// Install a global tracing subscriber using the provided logging settings.
pub fn init(logging: &LoggingSettings) -> Result<(), InfraError> {
    describe_metrics();

    let env_filter = EnvFilter::builder()
        .with_default_directive(logging.level.into())
        .from_env_lossy();

    let fmt_layer = match logging.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .boxed(),
        LogFormat::Compact => fmt::layer().compact().with_target(true).boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(ErrorLayer::default())
        .with(fmt_layer)
        .try_init()
        .map_err(|err| {
            InfraError::telemetry(format!("failed to install tracing subscriber: {err}"))
        })
}

pub fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_counter!(
            "songbook_cache_hit_total",
            Unit::Count,
            "Verse reads answered from the cache."
        );
        describe_counter!(
            "songbook_cache_miss_total",
            Unit::Count,
            "Verse reads that found no cached lyrics."
        );
        describe_counter!(
            "songbook_store_fallback_total",
            Unit::Count,
            "Verse reads served by the relational store after a cache miss or error."
        );
        describe_counter!(
            "songbook_cache_mirror_failure_total",
            Unit::Count,
            "Store writes whose cache mirror failed, labelled by operation."
        );
        describe_histogram!(
            "songbook_cache_warm_ms",
            Unit::Milliseconds,
            "Startup cache warm latency in milliseconds."
        );
    });
}
