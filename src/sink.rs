use crate::models::{ArticleRecord, CalendarDate};
use anyhow::{Context, Result};
use serde::Serialize;
use std::fs::OpenOptions;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

/// Storage collaborator that accepts finished article records.
///
/// The downstream read side (bounding-box filtering, text search, map
/// clustering) lives behind this boundary and is not part of the ingestion
/// contract. Retries of failed appends are the sink's business; the writer
/// makes exactly one attempt per batch.
pub trait ArticleSink: Send {
    /// Number of records already persisted for the current target, used to
    /// decide how many leading dump pages a resumed run may skip.
    fn persisted_count(&mut self) -> Result<u64>;

    /// Appends a batch of records. Must be atomic enough that a reported
    /// success means the records survive a process restart.
    fn append_batch(&mut self, batch: &[ArticleRecord]) -> Result<()>;
}

/// Flat row shape for CSV output; coordinates are split so each field is
/// scalar.
#[derive(Serialize)]
struct CsvRow<'a> {
    title: &'a str,
    oldest_date: Option<CalendarDate>,
    lon: Option<f64>,
    lat: Option<f64>,
}

/// CSV-file sink. Existing rows are counted at open so a resumed run knows
/// where the previous one stopped; appends go to the end of the file.
pub struct CsvSink {
    path: PathBuf,
    existing: u64,
    appended: u64,
}

impl CsvSink {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let existing = if path.exists() {
            let mut reader = csv::Reader::from_path(&path)
                .with_context(|| format!("Failed to open existing output: {}", path.display()))?;
            let mut count = 0u64;
            for record in reader.records() {
                record.with_context(|| {
                    format!("Corrupt row in existing output: {}", path.display())
                })?;
                count += 1;
            }
            count
        } else {
            0
        };
        Ok(Self {
            path,
            existing,
            appended: 0,
        })
    }
}

impl ArticleSink for CsvSink {
    fn persisted_count(&mut self) -> Result<u64> {
        Ok(self.existing + self.appended)
    }

    fn append_batch(&mut self, batch: &[ArticleRecord]) -> Result<()> {
        let new_file = match std::fs::metadata(&self.path) {
            Ok(meta) => meta.len() == 0,
            Err(_) => true,
        };
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("Failed to open output for append: {}", self.path.display()))?;

        // The serde header only goes out once, on the first batch of a fresh file
        let mut writer = csv::WriterBuilder::new()
            .has_headers(new_file)
            .from_writer(BufWriter::new(file));

        for record in batch {
            let (lon, lat) = match record.coordinates {
                Some((lon, lat)) => (Some(lon), Some(lat)),
                None => (None, None),
            };
            writer
                .serialize(CsvRow {
                    title: &record.title,
                    oldest_date: record.oldest_date,
                    lon,
                    lat,
                })
                .context("Failed to serialize article record")?;
        }
        writer.flush().context("Failed to flush CSV output")?;
        self.appended += batch.len() as u64;
        Ok(())
    }
}

/// In-memory sink for tests and dry runs.
#[derive(Default)]
pub struct MemorySink {
    pub records: Vec<ArticleRecord>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ArticleSink for MemorySink {
    fn persisted_count(&mut self) -> Result<u64> {
        Ok(self.records.len() as u64)
    }

    fn append_batch(&mut self, batch: &[ArticleRecord]) -> Result<()> {
        self.records.extend_from_slice(batch);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn record(title: &str, coords: Option<(f64, f64)>) -> ArticleRecord {
        ArticleRecord {
            title: title.to_string(),
            oldest_date: Some(CalendarDate { year: 1999, month: 1, day: 1 }),
            coordinates: coords,
        }
    }

    #[test]
    fn csv_sink_counts_zero_for_missing_file() {
        let dir = TempDir::new().unwrap();
        let mut sink = CsvSink::open(dir.path().join("articles.csv")).unwrap();
        assert_eq!(sink.persisted_count().unwrap(), 0);
    }

    #[test]
    fn csv_sink_appends_and_counts() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("articles.csv");

        let mut sink = CsvSink::open(&path).unwrap();
        sink.append_batch(&[record("A", Some((1.0, 2.0))), record("B", None)])
            .unwrap();
        assert_eq!(sink.persisted_count().unwrap(), 2);

        // A fresh open sees what the previous process committed
        let mut reopened = CsvSink::open(&path).unwrap();
        assert_eq!(reopened.persisted_count().unwrap(), 2);
        reopened.append_batch(&[record("C", None)]).unwrap();
        assert_eq!(reopened.persisted_count().unwrap(), 3);
    }

    #[test]
    fn csv_sink_writes_one_header() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("articles.csv");

        let mut sink = CsvSink::open(&path).unwrap();
        sink.append_batch(&[record("A", Some((-87.913, 44.112)))]).unwrap();
        sink.append_batch(&[record("B", None)]).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let headers: Vec<_> = content.lines().filter(|l| l.starts_with("title,")).collect();
        assert_eq!(headers.len(), 1);
        assert!(content.contains("A,1999-01-01,-87.913,44.112"));
        assert!(content.contains("B,1999-01-01,,"));
    }

    #[test]
    fn memory_sink_roundtrip() {
        let mut sink = MemorySink::new();
        assert_eq!(sink.persisted_count().unwrap(), 0);
        sink.append_batch(&[record("A", None)]).unwrap();
        sink.append_batch(&[record("B", None)]).unwrap();
        assert_eq!(sink.persisted_count().unwrap(), 2);
        assert_eq!(sink.records[1].title, "B");
    }
}
