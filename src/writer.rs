use crate::extract::IngestPolicy;
use crate::models::{ArticleRecord, ExtractionResult};
use crate::sink::ArticleSink;
use anyhow::{Context, Result};
use tracing::debug;

/// Batched, resumable persistence over an [`ArticleSink`].
///
/// The writer is the sole owner of the batch and of the committed-record
/// count; no other part of the pipeline mutates either. The committed count
/// only advances after the sink reports a successful flush, never
/// speculatively.
///
/// Resume works by asking the sink how many records it already holds and
/// skipping that many leading pages on the next run. That mapping is 1:1 only
/// when every page is persisted, and it presumes the dump is read in the same
/// order both times. Both are documented preconditions; with
/// `require_coordinates` set, a resumed run re-reads from the start instead
/// of trusting the count.
pub struct BatchWriter<'a> {
    sink: &'a mut dyn ArticleSink,
    policy: IngestPolicy,
    batch: Vec<ArticleRecord>,
    batch_size: usize,
    resume_skip: u64,
    committed: u64,
}

impl<'a> BatchWriter<'a> {
    pub fn new(
        sink: &'a mut dyn ArticleSink,
        policy: IngestPolicy,
        batch_size: usize,
        resume: bool,
    ) -> Result<Self> {
        let resume_skip = if resume && !policy.require_coordinates {
            sink.persisted_count()
                .context("Failed to query sink for already-persisted records")?
        } else {
            0
        };
        Ok(Self {
            sink,
            policy,
            batch: Vec::with_capacity(batch_size),
            batch_size,
            resume_skip,
            committed: 0,
        })
    }

    /// Leading pages the dump reader should discard before extraction.
    pub fn resume_skip(&self) -> u64 {
        self.resume_skip
    }

    /// Records committed to the sink by this run.
    pub fn committed(&self) -> u64 {
        self.committed
    }

    /// Records buffered but not yet flushed.
    pub fn pending(&self) -> usize {
        self.batch.len()
    }

    /// Buffers one result, flushing when the batch is full. Returns whether a
    /// flush happened.
    pub fn push(&mut self, result: ExtractionResult) -> Result<bool> {
        if self.policy.require_coordinates && result.coordinates.is_none() {
            return Ok(false);
        }
        self.batch.push(ArticleRecord::from_result(result));
        if self.batch.len() >= self.batch_size {
            self.flush()?;
            return Ok(true);
        }
        Ok(false)
    }

    /// Flushes the current batch, if any. One attempt; a failure is surfaced
    /// with the batch size and committed position so the operator can retry
    /// via a resumed run.
    pub fn flush(&mut self) -> Result<()> {
        if self.batch.is_empty() {
            return Ok(());
        }
        let size = self.batch.len();
        self.sink.append_batch(&self.batch).with_context(|| {
            format!(
                "Failed to flush batch of {} records after {} committed this run (resume offset {})",
                size, self.committed, self.resume_skip
            )
        })?;
        self.committed += size as u64;
        self.batch.clear();
        debug!(flushed = size, committed = self.committed, "Batch flushed");
        Ok(())
    }
}
