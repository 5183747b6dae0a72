use std::io::{BufRead, Write};
use std::ops::AddAssign;

use crossbeam_channel::Receiver;
use indicatif::ProgressBar;
use parking_lot::Mutex;
use serde::Serialize;

use crate::config::Config;
use crate::error::{CustomError, Result};
use crate::genotype::classify;
use crate::model::GenotypeSummary;
use crate::normalize::normalize;
use crate::output::{RowFormatter, tsv_writer};
use crate::reader::framer::Batch;
use crate::reader::{
    ALT_IDX, CHROM_IDX, FILTER_IDX, FieldSplitter, Header, LineFramer, POS_IDX, REF_IDX,
};

/// Batches allowed in flight before the producer blocks.
pub const QUEUE_CAPACITY: usize = 16;
pub const DEFAULT_BATCH_SIZE: usize = 64;
/// Worker buffers are handed to the sink once they reach this many bytes.
pub const FLUSH_THRESHOLD: usize = 512 * 1024;

/// The single shared output. The lock is held only for one `write_all`.
pub struct OutputSink<W: Write> {
    inner: Mutex<W>,
}

impl<W: Write> OutputSink<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner: Mutex::new(inner),
        }
    }

    pub fn write(&self, bytes: &[u8]) -> Result<()> {
        self.inner
            .lock()
            .write_all(bytes)
            .map_err(|e| CustomError::WriteWithoutPath { source: e })
    }

    pub fn flush(&self) -> Result<()> {
        self.inner
            .lock()
            .flush()
            .map_err(|e| CustomError::WriteWithoutPath { source: e })
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.inner.into_inner()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WorkerStats {
    pub lines: u64,
    pub invalid_utf8: u64,
    pub field_count_mismatches: u64,
    pub filtered: u64,
    pub rejected_sites: u64,
    pub malformed_genotypes: u64,
    pub all_missing: u64,
    pub rows_written: u64,
}

impl AddAssign for WorkerStats {
    fn add_assign(&mut self, other: Self) {
        self.lines += other.lines;
        self.invalid_utf8 += other.invalid_utf8;
        self.field_count_mismatches += other.field_count_mismatches;
        self.filtered += other.filtered;
        self.rejected_sites += other.rejected_sites;
        self.malformed_genotypes += other.malformed_genotypes;
        self.all_missing += other.all_missing;
        self.rows_written += other.rows_written;
    }
}

/// Frames `framer` into batches and fans them out to `threads` workers.
///
/// Rows from one batch stay in input order; batches may interleave in any order.
pub fn run<R: BufRead, W: Write + Send>(
    framer: &mut LineFramer<R>,
    config: &Config,
    header: &Header,
    sink: &OutputSink<W>,
    threads: usize,
    batch_size: usize,
    progress: &ProgressBar,
) -> Result<WorkerStats> {
    distribute(
        framer,
        config,
        header,
        sink,
        threads,
        batch_size,
        FLUSH_THRESHOLD,
        progress,
    )
}

#[allow(clippy::too_many_arguments)]
fn distribute<R: BufRead, W: Write + Send>(
    framer: &mut LineFramer<R>,
    config: &Config,
    header: &Header,
    sink: &OutputSink<W>,
    threads: usize,
    batch_size: usize,
    flush_threshold: usize,
    progress: &ProgressBar,
) -> Result<WorkerStats> {
    if threads == 0 {
        return Err(CustomError::ThreadCount);
    }
    if batch_size == 0 {
        return Err(CustomError::BatchSize);
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .thread_name(|i| format!("vcfprep-worker-{i}"))
        .build()?;
    let (batch_tx, batch_rx) = crossbeam_channel::bounded::<Batch>(QUEUE_CAPACITY);
    let (done_tx, done_rx) = crossbeam_channel::unbounded::<Result<WorkerStats>>();

    let produced = pool.in_place_scope(|scope| {
        for worker_id in 0..threads {
            let rx = batch_rx.clone();
            let done = done_tx.clone();
            scope.spawn(move |_| {
                let result = Worker::new(config, header, flush_threshold).drain(&rx, sink);
                if let Err(e) = &result {
                    tracing::error!(worker_id, error = %e, "worker failed");
                }
                // The coordinator holds the receiver until every worker has reported
                let _ = done.send(result);
            });
        }
        drop(batch_rx);
        drop(done_tx);

        let mut n_lines = 0u64;
        let result = loop {
            match framer.next_batch(batch_size) {
                Ok(Some(batch)) => {
                    n_lines += batch.len() as u64;
                    progress.inc(batch.len() as u64);
                    if batch_tx.send(batch).is_err() {
                        break Err(CustomError::WorkerLost);
                    }
                }
                Ok(None) => break Ok(n_lines),
                Err(e) => break Err(e),
            }
        };
        drop(batch_tx);
        result
    });

    let mut total = WorkerStats::default();
    let mut first_error = None;
    for _ in 0..threads {
        match done_rx.recv() {
            Ok(Ok(stats)) => total += stats,
            Ok(Err(e)) => {
                first_error.get_or_insert(e);
            }
            Err(_) => {
                first_error.get_or_insert(CustomError::WorkerLost);
            }
        }
    }

    let n_lines = produced?;
    if let Some(e) = first_error {
        return Err(e);
    }
    debug_assert_eq!(n_lines, total.lines);
    sink.flush()?;
    Ok(total)
}

/// One pool thread: Idle -> Draining (queue) -> Flushing (sink) -> Done.
struct Worker<'a> {
    config: &'a Config,
    header: &'a Header,
    formatter: RowFormatter<'a>,
    splitter: FieldSplitter,
    summaries: Vec<GenotypeSummary>,
    wtr: csv::Writer<Vec<u8>>,
    spare: Vec<u8>,
    flush_threshold: usize,
    stats: WorkerStats,
}

impl<'a> Worker<'a> {
    fn new(config: &'a Config, header: &'a Header, flush_threshold: usize) -> Self {
        let capacity = flush_threshold + flush_threshold / 4;
        Self {
            config,
            header,
            formatter: RowFormatter::new(config, header),
            splitter: FieldSplitter::with_capacity(header.n_columns()),
            summaries: Vec::new(),
            wtr: tsv_writer(Vec::with_capacity(capacity)),
            spare: Vec::with_capacity(capacity),
            flush_threshold,
            stats: WorkerStats::default(),
        }
    }

    fn drain<W: Write>(mut self, rx: &Receiver<Batch>, sink: &OutputSink<W>) -> Result<WorkerStats> {
        let mut failure = None;
        // Keep receiving after a failure so the producer never blocks on a full queue
        for batch in rx.iter() {
            if failure.is_some() {
                continue;
            }
            let result = self
                .process_batch(&batch)
                .and_then(|()| self.flush(sink, false));
            if let Err(e) = result {
                failure = Some(e);
            }
        }
        if let Some(e) = failure {
            return Err(e);
        }
        self.flush(sink, true)?;
        Ok(self.stats)
    }

    fn flush<W: Write>(&mut self, sink: &OutputSink<W>, force: bool) -> Result<()> {
        self.wtr
            .flush()
            .map_err(|e| CustomError::WriteWithoutPath { source: e })?;
        let buffered = self.wtr.get_ref();
        if buffered.is_empty() || (!force && buffered.len() < self.flush_threshold) {
            return Ok(());
        }
        // Swap buffers: the csv writer only gives the bytes back by value
        let spare = std::mem::take(&mut self.spare);
        let mut full = std::mem::replace(&mut self.wtr, tsv_writer(spare))
            .into_inner()
            .map_err(|e| CustomError::WriteWithoutPath {
                source: e.into_error(),
            })?;
        sink.write(&full)?;
        full.clear();
        self.spare = full;
        Ok(())
    }

    fn process_batch(&mut self, batch: &Batch) -> Result<()> {
        for line in batch {
            self.process_line(line)?;
        }
        Ok(())
    }

    fn process_line(&mut self, line: &[u8]) -> Result<()> {
        self.stats.lines += 1;
        let Ok(line) = std::str::from_utf8(line) else {
            self.stats.invalid_utf8 += 1;
            tracing::warn!("skipping line that is not valid UTF-8");
            return Ok(());
        };

        let fields = self.splitter.split(line);
        if fields.len() != self.header.n_columns() {
            self.stats.field_count_mismatches += 1;
            tracing::warn!(
                expected = self.header.n_columns(),
                found = fields.len(),
                chrom = fields.get(CHROM_IDX),
                "skipping line with wrong number of fields"
            );
            return Ok(());
        }

        let filter = fields.get(FILTER_IDX);
        if !self.config.filters.passes(filter) {
            self.stats.filtered += 1;
            return Ok(());
        }

        let chrom = fields.get(CHROM_IDX);
        let pos = fields.get(POS_IDX);
        let site = match normalize(chrom, pos, fields.get(REF_IDX), fields.get(ALT_IDX)) {
            Ok(site) => site,
            Err(reason) => {
                self.stats.rejected_sites += 1;
                tracing::debug!(chrom, pos, %reason, "skipping site");
                return Ok(());
            }
        };

        let n_alleles = site.alleles.len();
        if self.summaries.len() < n_alleles {
            self.summaries.resize_with(n_alleles, GenotypeSummary::default);
        }
        let summaries = &mut self.summaries[..n_alleles];

        if self.header.n_samples() == 0 {
            summaries.iter_mut().for_each(GenotypeSummary::clear);
        } else {
            for idx in 0..n_alleles {
                let allele = &site.alleles[idx];
                // MNP bases share one ALT entry and therefore one classification
                if idx > 0 && site.alleles[idx - 1].source_alt_index == allele.source_alt_index {
                    let (done, rest) = summaries.split_at_mut(idx);
                    rest[0].clone_from(&done[idx - 1]);
                    continue;
                }
                let target = b'0' + allele.genotype_allele() as u8;
                if let Err(err) = classify(fields, target, &mut summaries[idx]) {
                    self.stats.malformed_genotypes += 1;
                    tracing::warn!(chrom, pos, %err, "skipping site");
                    return Ok(());
                }
            }
            if summaries[0].total_count == 0 {
                self.stats.all_missing += 1;
                return Ok(());
            }
        }

        for (allele, summary) in site.alleles.iter().zip(summaries.iter()) {
            if self.header.n_samples() > 0 && summary.alt_count == 0 {
                continue;
            }
            self.formatter
                .write_row(&mut self.wtr, fields, site.kind, allele, summary)?;
            self.stats.rows_written += 1;
        }
        Ok(())
    }
}
