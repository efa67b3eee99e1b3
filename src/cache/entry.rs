use std::time::Instant;

/// A cached transform result with its recency metadata.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub value: String,
    pub last_access: Instant,
    pub access_count: u64,
}

impl CacheEntry {
    pub fn new(value: String) -> Self {
        Self {
            value,
            last_access: Instant::now(),
            access_count: 1,
        }
    }

    pub(crate) fn touch(&mut self) {
        self.last_access = Instant::now();
        self.access_count += 1;
    }
}
