pub const CACHE_SIZE_LIMIT: usize = 1000;
pub const BATCH_SIZE: usize = 50;

// One initial call plus three retries
pub const MAX_ATTEMPTS: u32 = 4;

pub const CACHE_KEY_PREFIX_LEN: usize = 100;

pub const CLEANUP_INTERVAL_SECS: u64 = 30;
pub const CLEANUP_HIGH_WATERMARK: f64 = 0.8;
pub const CLEANUP_LOW_WATERMARK: f64 = 0.5;

pub const MONITOR_INTERVAL_MS: u64 = 1000;
pub const BATCH_FLUSH_INTERVAL_MS: u64 = 16;

pub const MIN_TEXT_LENGTH: usize = 1;
pub const MAX_TEXT_LENGTH: usize = 10_000;

pub const HEADER_LINES: usize = 4;
pub const LINE_SEPARATOR: &str = "\r\n";
pub const FIELD_SEPARATOR: &str = "     ";

// Health monitor thresholds
pub const HIGH_PROCESSING_RATE: f64 = 100.0;
pub const SUCCESS_RATE_DROP_PCT: f64 = 5.0;
pub const STATUS_LOG_EVERY: u64 = 100;
