use std::io::Write;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

use text_interceptor::config::KeyStrategy;
use text_interceptor::error::PipelineError;
use text_interceptor::transform::PassthroughReason;
use text_interceptor::{BatchItem, BoundedCache, Dictionary, Pipeline, PipelineConfig, Resolution};

const RECORD: &str = "H1\r\nH2\r\nH3\r\nH4\r\n1     placeholder   extra";

fn skills() -> Dictionary {
    [("1", "Skill 1")].into_iter().collect()
}

#[test]
fn translates_structured_record() {
    let pipeline = Pipeline::new(PipelineConfig::default(), skills()).unwrap();

    assert_eq!(
        pipeline.transform(RECORD),
        "H1\r\nH2\r\nH3\r\nH4\r\n1     Skill 1 extra"
    );
}

#[test]
fn least_recently_accessed_entry_is_evicted() {
    let cache = BoundedCache::new(2).unwrap();
    cache.set("a".into(), "1".into());
    cache.set("b".into(), "2".into());
    assert_eq!(cache.get("a").as_deref(), Some("1"));

    cache.set("c".into(), "3".into());

    assert_eq!(cache.len(), 2);
    assert!(cache.contains("a"));
    assert!(!cache.contains("b"));
    assert!(cache.contains("c"));
    assert_eq!(cache.stats().evictions, 1);
}

#[test]
fn zero_capacity_is_rejected() {
    assert!(BoundedCache::new(0).is_err());
    assert!(Pipeline::new(
        PipelineConfig {
            cache_size: 0,
            ..Default::default()
        },
        skills()
    )
    .is_err());
}

#[test]
fn prefix_keys_collide_and_content_keys_do_not() {
    let prefix = "H\r\n".repeat(4) + &"x".repeat(120);
    let first = format!("{prefix}\r\n1  one");
    let second = format!("{prefix}\r\n1  two  extra");

    let approximate = Pipeline::new(PipelineConfig::default(), skills()).unwrap();
    let cached = approximate.transform(&first);
    assert_eq!(approximate.process(&second).text, cached);

    let exact = Pipeline::new(
        PipelineConfig {
            cache_key: KeyStrategy::Content,
            ..Default::default()
        },
        skills(),
    )
    .unwrap();
    exact.transform(&first);
    let processed = exact.process(&second);
    assert!(processed.text.ends_with("1     Skill 1 extra"));
    assert_ne!(processed.resolution, Resolution::CacheHit);
}

#[test]
fn loads_dictionary_and_config_from_files() {
    let mut dict_file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
    write!(dict_file, r#"{{"1": "Skill 1", "2": "Skill 2"}}"#).unwrap();

    let mut config_file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    write!(config_file, "cache_size = 4\nmax_attempts = 2\n").unwrap();

    let dictionary = Dictionary::load(dict_file.path()).unwrap();
    let config = PipelineConfig::load(config_file.path()).unwrap();
    assert_eq!(dictionary.len(), 2);
    assert_eq!(config.cache_size, 4);
    assert_eq!(config.max_attempts, 2);

    let pipeline = Pipeline::new(config, dictionary).unwrap();
    assert_eq!(pipeline.cache().capacity(), 4);
    assert!(pipeline.transform("a\r\nb\r\nc\r\nd\r\n2  x").ends_with("2     Skill 2"));
}

#[test]
fn concurrent_callers_share_one_bounded_cache() {
    let pipeline = Pipeline::new(
        PipelineConfig {
            cache_size: 16,
            cache_key: KeyStrategy::Content,
            ..Default::default()
        },
        skills(),
    )
    .unwrap();

    thread::scope(|scope| {
        for worker in 0..8 {
            let pipeline = pipeline.clone();
            scope.spawn(move || {
                for i in 0..200 {
                    let raw = format!("W{worker}\r\nH\r\nH\r\nH\r\n1  text {i}");
                    assert!(pipeline.transform(&raw).ends_with("1     Skill 1"));
                    assert!(pipeline.cache().len() <= 16);
                }
            });
        }
    });

    let stats = pipeline.stats();
    assert_eq!(stats.total_processed, 1600);
    assert_eq!(stats.successful_transforms, 1600);
    assert_eq!(stats.failed_transforms, 0);
    assert!(stats.cache.entries <= 16);
}

#[test]
fn oversized_text_passes_through_by_default() {
    let pipeline = Pipeline::new(PipelineConfig::default(), skills()).unwrap();
    let raw = format!("H1\r\nH2\r\nH3\r\nH4\r\n1  {}", "x".repeat(10_000));

    let processed = pipeline.process(&raw);
    assert_eq!(processed.text, raw);
    assert_eq!(
        processed.resolution,
        Resolution::Skipped(PassthroughReason::TooLong)
    );
}

#[test]
fn start_requires_a_runtime() {
    let pipeline = Pipeline::new(PipelineConfig::default(), skills()).unwrap();
    assert!(matches!(pipeline.start(), Err(PipelineError::NoRuntime)));
    assert!(!pipeline.is_running());
}

#[tokio::test]
async fn periodic_flush_runs_until_stop() {
    let pipeline = Pipeline::new(
        PipelineConfig {
            batch_flush_interval_ms: 10,
            monitor_interval_ms: 10,
            ..Default::default()
        },
        skills(),
    )
    .unwrap();

    pipeline.start().unwrap();
    assert!(pipeline.is_running());
    assert!(matches!(pipeline.start(), Err(PipelineError::AlreadyRunning)));

    let runs = Arc::new(AtomicUsize::new(0));
    let counter = runs.clone();
    pipeline.defer(BatchItem::new("count", move || {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }));

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(runs.load(Ordering::SeqCst), 1);

    pipeline.stop().await;
    assert!(!pipeline.is_running());

    let counter = runs.clone();
    pipeline.defer(BatchItem::new("after stop", move || {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }));

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(runs.load(Ordering::SeqCst), 1);
    assert_eq!(pipeline.batch().pending(), 1);
}

#[tokio::test]
async fn stop_drains_deferred_cache_writes() {
    let pipeline = Pipeline::new(
        PipelineConfig {
            deferred_cache_writes: true,
            batch_flush_interval_ms: 60_000,
            ..Default::default()
        },
        skills(),
    )
    .unwrap();

    pipeline.start().unwrap();
    pipeline.transform(RECORD);
    assert!(pipeline.cache().is_empty());

    pipeline.stop().await;
    assert_eq!(pipeline.cache().len(), 1);
    assert_eq!(pipeline.batch().pending(), 0);
}

#[tokio::test]
async fn cleanup_timer_shrinks_cache() {
    let pipeline = Pipeline::new(
        PipelineConfig {
            cache_size: 10,
            cache_key: KeyStrategy::Content,
            cleanup_interval_secs: 1,
            ..Default::default()
        },
        skills(),
    )
    .unwrap();

    for i in 0..9 {
        pipeline.transform(&format!("H{i}\r\nH\r\nH\r\nH\r\n1  x"));
    }
    assert_eq!(pipeline.cache().len(), 9);

    pipeline.start().unwrap();
    tokio::time::sleep(Duration::from_millis(1500)).await;
    pipeline.stop().await;

    assert_eq!(pipeline.cache().len(), 5);
    assert_eq!(pipeline.stats().cache.evictions, 4);
}

#[tokio::test]
async fn restart_after_stop() {
    let pipeline = Pipeline::new(PipelineConfig::default(), skills()).unwrap();

    pipeline.start().unwrap();
    pipeline.stop().await;
    pipeline.start().unwrap();
    assert!(pipeline.is_running());
    pipeline.stop().await;
}
