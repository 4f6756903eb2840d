/// Maximum article title length persisted to the sink, in characters
pub const TITLE_MAX_CHARS: usize = 200;

/// Default number of records accumulated before a sink flush
pub const DEFAULT_BATCH_SIZE: usize = 1000;

/// Progress update interval (tick every N pages)
pub const PROGRESS_INTERVAL: u64 = 1000;

/// Bounded channel slots per extraction worker
pub const CHANNEL_SLOTS_PER_WORKER: usize = 4;

/// Lower bound on channel capacity regardless of worker count
pub const MIN_CHANNEL_CAPACITY: usize = 8;
