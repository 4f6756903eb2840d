use std::sync::atomic::{AtomicU64, Ordering};

/// Statistics collected during an ingestion run.
///
/// Advisory counters for progress reporting and the end-of-run summary; they
/// are not part of the data contract. Lock-free so the reader and workers can
/// bump them without coordination.
#[derive(Debug, Default)]
pub struct IngestStats {
    pub pages_seen: AtomicU64,
    pub pages_skipped: AtomicU64,
    pub pages_without_text: AtomicU64,
    pub dates_found: AtomicU64,
    pub coordinates_found: AtomicU64,
    pub articles_persisted: AtomicU64,
}

impl IngestStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inc_pages(&self) {
        self.pages_seen.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_skipped(&self) {
        self.pages_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_pages_without_text(&self) {
        self.pages_without_text.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_dates(&self) {
        self.dates_found.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_coordinates(&self) {
        self.coordinates_found.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_persisted(&self, count: u64) {
        self.articles_persisted.fetch_add(count, Ordering::Relaxed);
    }

    pub fn pages(&self) -> u64 {
        self.pages_seen.load(Ordering::Relaxed)
    }

    pub fn skipped(&self) -> u64 {
        self.pages_skipped.load(Ordering::Relaxed)
    }

    pub fn without_text(&self) -> u64 {
        self.pages_without_text.load(Ordering::Relaxed)
    }

    pub fn dates(&self) -> u64 {
        self.dates_found.load(Ordering::Relaxed)
    }

    pub fn coordinates(&self) -> u64 {
        self.coordinates_found.load(Ordering::Relaxed)
    }

    pub fn persisted(&self) -> u64 {
        self.articles_persisted.load(Ordering::Relaxed)
    }
}
