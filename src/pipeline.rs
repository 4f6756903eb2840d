use crate::config::{CHANNEL_SLOTS_PER_WORKER, MIN_CHANNEL_CAPACITY, PROGRESS_INTERVAL};
use crate::extract::{extract_page, IngestPolicy};
use crate::models::{ExtractionResult, RawPage};
use crate::parser::{DumpError, DumpReader};
use crate::patterns::PatternLibrary;
use crate::sink::ArticleSink;
use crate::stats::IngestStats;
use crate::writer::BatchWriter;
use anyhow::Result;
use crossbeam_channel::{bounded, Sender};
use indicatif::ProgressBar;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct IngestConfig {
    /// Dump file path, `.xml` or `.xml.bz2`
    pub input: String,
    /// Records per sink flush
    pub batch_size: usize,
    /// Extraction worker count; 0 means the host's available concurrency
    pub workers: usize,
    /// Persist only articles that carry coordinates
    pub require_coordinates: bool,
    /// Skip leading pages already persisted by a previous run
    pub resume: bool,
    /// Stop after this many pages past the resume point
    pub limit: Option<u64>,
}

/// Why the reader stopped producing pages. All of these end the run
/// gracefully; hard errors travel separately.
enum EndReason {
    Exhausted,
    Truncated,
    Cancelled,
    LimitReached,
    /// Downstream hung up first (only happens when the writer failed)
    Drained,
}

/// Runs the full ingestion pipeline: one reader thread, a fixed pool of
/// extraction workers over bounded channels, and the calling thread as the
/// single writer.
///
/// The bounded page queue is the backpressure mechanism: when extraction or
/// the sink lags, the reader suspends instead of buffering the dump.
///
/// A final flush of the writer's partial batch is attempted on every exit
/// path -- input exhaustion, truncation, cancellation, and hard read errors
/// (which are surfaced only after the flush). The single exception is a sink
/// failure itself, which is not retried.
pub fn run_ingest(
    config: &IngestConfig,
    sink: &mut dyn ArticleSink,
    cancel: &AtomicBool,
) -> Result<IngestStats> {
    let workers = if config.workers == 0 {
        thread::available_parallelism().map(|n| n.get()).unwrap_or(4)
    } else {
        config.workers
    };
    let capacity = (workers * CHANNEL_SLOTS_PER_WORKER).max(MIN_CHANNEL_CAPACITY);
    let policy = IngestPolicy {
        require_coordinates: config.require_coordinates,
    };
    let patterns = PatternLibrary::shared();
    let limit = config.limit;

    let mut writer = BatchWriter::new(sink, policy, config.batch_size, config.resume)?;
    let skip = writer.resume_skip();
    if skip > 0 {
        info!(skip, "Resuming: skipping leading pages already persisted");
    }

    // An unreadable input is reported before any thread spawns
    let reader = DumpReader::open(&config.input)?;

    let stats = IngestStats::new();
    let progress = ProgressBar::new_spinner();
    let (page_tx, page_rx) = bounded::<RawPage>(capacity);
    let (result_tx, result_rx) = bounded::<ExtractionResult>(capacity);

    info!(
        input = %config.input,
        workers,
        capacity,
        batch_size = config.batch_size,
        "Starting ingestion"
    );

    let run: Result<Result<EndReason, DumpError>> = thread::scope(|scope| {
        // Owned by this closure so an early sink-failure return drops it and
        // unblocks the workers, which in turn unblock the reader
        let result_rx = result_rx;

        let reader_handle = {
            let stats = &stats;
            let progress = &progress;
            scope.spawn(move || read_pages(reader, page_tx, skip, limit, cancel, stats, progress))
        };

        for _ in 0..workers {
            let rx = page_rx.clone();
            let tx = result_tx.clone();
            scope.spawn(move || {
                for page in rx.iter() {
                    let result = extract_page(patterns, &page, policy);
                    if tx.send(result).is_err() {
                        break;
                    }
                }
            });
        }
        drop(page_rx);
        drop(result_tx);

        for result in result_rx.iter() {
            if result.oldest_date.is_some() {
                stats.inc_dates();
            }
            if result.coordinates.is_some() {
                stats.inc_coordinates();
            }
            if writer.push(result)? {
                info!(
                    pages = stats.pages(),
                    committed = writer.committed(),
                    "Ingestion progress"
                );
            }
        }

        Ok(reader_handle.join().expect("dump reader thread panicked"))
    });

    progress.finish_and_clear();

    let read_result = run?;

    // Commit whatever is still buffered before judging how the run ended
    writer.flush()?;
    stats.add_persisted(writer.committed());

    match read_result {
        Ok(EndReason::Exhausted) | Ok(EndReason::Drained) => {}
        Ok(EndReason::Truncated) => {
            info!("Input was truncated; committed everything that parsed")
        }
        Ok(EndReason::Cancelled) => info!("Cancelled; committed the partial batch"),
        Ok(EndReason::LimitReached) => info!(?limit, "Page limit reached"),
        Err(err) => {
            return Err(anyhow::Error::new(err).context("Dump read failed after partial ingest"))
        }
    }

    info!(
        pages = stats.pages(),
        skipped = stats.skipped(),
        persisted = stats.persisted(),
        "Ingestion finished"
    );
    Ok(stats)
}

fn read_pages(
    reader: DumpReader,
    tx: Sender<RawPage>,
    skip: u64,
    limit: Option<u64>,
    cancel: &AtomicBool,
    stats: &IngestStats,
    progress: &ProgressBar,
) -> Result<EndReason, DumpError> {
    let mut seen: u64 = 0;
    for item in reader {
        if cancel.load(Ordering::Relaxed) {
            return Ok(EndReason::Cancelled);
        }
        match item {
            Ok(page) => {
                seen += 1;
                stats.inc_pages();
                if seen % PROGRESS_INTERVAL == 0 {
                    progress.tick();
                }
                if seen <= skip {
                    stats.inc_skipped();
                    continue;
                }
                if let Some(limit) = limit {
                    if seen - skip > limit {
                        return Ok(EndReason::LimitReached);
                    }
                }
                if page.body.is_none() {
                    stats.inc_pages_without_text();
                }
                // Blocks when the queue is full: that suspension is the
                // backpressure holding memory flat
                if tx.send(page).is_err() {
                    return Ok(EndReason::Drained);
                }
            }
            Err(err) if err.is_truncation() => {
                warn!(error = %err, "Dump truncated; stopping reads");
                return Ok(EndReason::Truncated);
            }
            Err(err) => return Err(err),
        }
    }
    Ok(EndReason::Exhausted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::MemorySink;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn dump_file(xml: &str) -> NamedTempFile {
        let mut tmp = NamedTempFile::with_suffix(".xml").unwrap();
        tmp.write_all(xml.as_bytes()).unwrap();
        tmp.flush().unwrap();
        tmp
    }

    fn config(input: &str) -> IngestConfig {
        IngestConfig {
            input: input.to_string(),
            batch_size: 2,
            workers: 2,
            require_coordinates: false,
            resume: false,
            limit: None,
        }
    }

    const XML: &str = r#"<mediawiki>
        <page><title>A</title><revision><text>{{Coord|1.5|2.5}}</text></revision></page>
        <page><title>B</title><revision><text>{{Cite web|year=1999}}</text></revision></page>
        <page><title>C</title><revision><text>plain</text></revision></page>
    </mediawiki>"#;

    #[test]
    fn ingests_all_pages() {
        let tmp = dump_file(XML);
        let mut sink = MemorySink::new();
        let cancel = AtomicBool::new(false);

        let stats =
            run_ingest(&config(tmp.path().to_str().unwrap()), &mut sink, &cancel).unwrap();

        assert_eq!(stats.pages(), 3);
        assert_eq!(stats.persisted(), 3);
        assert_eq!(stats.coordinates(), 1);
        assert_eq!(stats.dates(), 1);
        assert_eq!(sink.records.len(), 3);
    }

    #[test]
    fn missing_input_fails_before_starting() {
        let mut sink = MemorySink::new();
        let cancel = AtomicBool::new(false);
        let err = run_ingest(&config("/no/such/dump.xml"), &mut sink, &cancel).unwrap_err();
        assert!(format!("{err:#}").contains("Failed to open dump file"));
        assert!(sink.records.is_empty());
    }

    #[test]
    fn limit_stops_early_but_flushes() {
        let tmp = dump_file(XML);
        let mut sink = MemorySink::new();
        let cancel = AtomicBool::new(false);
        let mut cfg = config(tmp.path().to_str().unwrap());
        cfg.limit = Some(1);
        cfg.batch_size = 100;

        let stats = run_ingest(&cfg, &mut sink, &cancel).unwrap();
        assert_eq!(stats.persisted(), 1);
        assert_eq!(sink.records.len(), 1);
        assert_eq!(sink.records[0].title, "A");
    }

    #[test]
    fn pre_cancelled_run_commits_nothing() {
        let tmp = dump_file(XML);
        let mut sink = MemorySink::new();
        let cancel = AtomicBool::new(true);

        let stats =
            run_ingest(&config(tmp.path().to_str().unwrap()), &mut sink, &cancel).unwrap();
        assert_eq!(stats.persisted(), 0);
        assert!(sink.records.is_empty());
    }

    #[test]
    fn cancellation_mid_run_commits_everything_read() {
        use crate::models::ArticleRecord;
        use std::sync::Arc;

        // Trips the shared flag on its first flush, then dawdles so the
        // bounded queues cap how far ahead the reader can get
        struct CancellingSink {
            inner: MemorySink,
            cancel: Arc<AtomicBool>,
        }

        impl ArticleSink for CancellingSink {
            fn persisted_count(&mut self) -> Result<u64> {
                self.inner.persisted_count()
            }
            fn append_batch(&mut self, batch: &[ArticleRecord]) -> Result<()> {
                if !self.cancel.swap(true, Ordering::Relaxed) {
                    std::thread::sleep(std::time::Duration::from_millis(30));
                }
                self.inner.append_batch(batch)
            }
        }

        let mut xml = String::from("<mediawiki>");
        for i in 0..500 {
            xml.push_str(&format!(
                "<page><title>P{i}</title><revision><text>body {i}</text></revision></page>"
            ));
        }
        xml.push_str("</mediawiki>");
        let tmp = dump_file(&xml);

        let cancel = Arc::new(AtomicBool::new(false));
        let mut sink = CancellingSink {
            inner: MemorySink::new(),
            cancel: Arc::clone(&cancel),
        };

        let stats =
            run_ingest(&config(tmp.path().to_str().unwrap()), &mut sink, &cancel).unwrap();

        // The first flush raises the flag, so the reader stops well short of
        // the full dump; every page it did read still reaches the sink via
        // the final flush
        assert!(stats.pages() >= 2);
        assert!(stats.pages() < 500);
        assert_eq!(stats.persisted(), stats.pages());
        assert_eq!(sink.inner.records.len() as u64, stats.persisted());
    }

    #[test]
    fn order_insensitive_results_cover_every_title() {
        let tmp = dump_file(XML);
        let mut sink = MemorySink::new();
        let cancel = AtomicBool::new(false);
        let mut cfg = config(tmp.path().to_str().unwrap());
        cfg.workers = 4;
        cfg.batch_size = 1;

        run_ingest(&cfg, &mut sink, &cancel).unwrap();
        let mut titles: Vec<_> = sink.records.iter().map(|r| r.title.clone()).collect();
        titles.sort();
        assert_eq!(titles, vec!["A", "B", "C"]);
    }
}
