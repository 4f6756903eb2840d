//! Wikimap: streaming Wikipedia dump ingestion
//!
//! This crate extracts two facts per article from a Wikipedia XML dump and
//! persists them in batches to a storage sink:
//!
//! 1. **Oldest citation date** -- the earliest date referenced by any
//!    `{{Cite ...}}` / `{{Citation ...}}` template in the article text
//! 2. **Coordinates** -- the first `{{Coord|...}}` template, decoded from
//!    decimal or degree/minute/second layout into `(lon, lat)`
//!
//! Both extractors are deliberate heuristics: dump markup is too inconsistent
//! for a full wikitext grammar, and recall is traded for simplicity.
//!
//! # Architecture
//!
//! The pipeline is a classic fan-out/fan-in over bounded channels:
//!
//! - **Streaming XML parsing** -- Never loads the full dump into memory; one
//!   page at a time via event-based parsing, with BZ2 decompression
//! - **Parallel extraction** -- A fixed pool of worker threads applies the
//!   heuristics concurrently; result order is not preserved
//! - **Backpressure** -- The reader suspends when the bounded page queue is
//!   full, so a slow sink never inflates memory
//! - **Resumable writes** -- The writer batches records, counts what the sink
//!   already holds, and a restarted run skips that many leading pages
//! - **Truncation tolerance** -- Partial dumps end the run gracefully after a
//!   final flush instead of erroring out
//!
//! # Key Modules
//!
//! - [`parser`] -- Streaming XML dump reader with BZ2 decompression
//! - [`patterns`] -- Compiled regex set and month table shared by all workers
//! - [`dates`] -- Citation date heuristic
//! - [`coords`] -- Coordinate template heuristic
//! - [`extract`] -- Per-page extractor composing both heuristics
//! - [`pipeline`] -- Reader/worker/writer orchestration and cancellation
//! - [`writer`] -- Batched, resumable persistence
//! - [`sink`] -- Storage sink trait, CSV and in-memory implementations
//! - [`models`] -- Core data types (RawPage, CalendarDate, ArticleRecord)
//! - [`stats`] -- Thread-safe atomic counters for ingestion metrics
//! - [`config`] -- Tuning constants
//!
//! # Example Usage
//!
//! ```bash
//! # Ingest a dump into articles.csv with 8 workers
//! wikimap ingest -i enwiki-latest-pages-articles.xml.bz2 -o articles.csv --workers 8
//!
//! # Only persist articles that carry coordinates
//! wikimap ingest -i dump.xml -o articles.csv --require-coordinates
//! ```

pub mod config;
pub mod coords;
pub mod dates;
pub mod extract;
pub mod models;
pub mod parser;
pub mod patterns;
pub mod pipeline;
pub mod sink;
pub mod stats;
pub mod writer;
