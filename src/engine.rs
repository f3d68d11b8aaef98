//! Chunked transform engine and run orchestration.
//!
//! Each stream's pending range is replayed one calendar day at a time, in
//! ascending date order, as a [`ChunkQuery`] against the store. A failing chunk
//! aborts the run; because watermarks are derived from output maxima, the next
//! run picks up from the last day that reached the written outputs.

use crate::config::{EtlConfig, RunMode};
use crate::error::Result;
use crate::loader;
use crate::query::{ChunkQuery, Stream};
use crate::store::Store;
use crate::watermark::{self, Watermark};
use crate::writer;
use chrono::NaiveDate;
use log::{debug, info};

/// What happened to one stream during a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamReport {
    pub stream: Stream,

    /// `None` if the stream had no data to derive a watermark from.
    pub start_date: Option<NaiveDate>,

    pub pending_days: u32,

    /// Number of insert-selects issued. Zero when the stream was skipped.
    pub chunks_processed: u32,

    pub rows_inserted: usize,
}

impl StreamReport {
    fn skipped(stream: Stream, start_date: Option<NaiveDate>) -> Self {
        StreamReport {
            stream,
            start_date,
            pending_days: 0,
            chunks_processed: 0,
            rows_inserted: 0,
        }
    }
}

/// Per-stream outcome of a run, in processing order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub streams: Vec<StreamReport>,
}

impl RunSummary {
    pub fn stream(&self, stream: Stream) -> Option<&StreamReport> {
        self.streams.iter().find(|r| r.stream == stream)
    }

    pub fn total_rows_inserted(&self) -> usize {
        self.streams.iter().map(|r| r.rows_inserted).sum()
    }
}

/// Issues one chunk insert against the store.
///
/// The engine only ever talks to the store through this trait, which lets
/// tests stand in an executor that fails partway through a run.
pub trait ChunkExecutor {
    fn execute(&mut self, store: &mut Store, query: &ChunkQuery) -> Result<usize>;
}

/// Executes chunk queries directly against the store.
#[derive(Debug, Default, Clone, Copy)]
pub struct StoreExecutor;

impl ChunkExecutor for StoreExecutor {
    fn execute(&mut self, store: &mut Store, query: &ChunkQuery) -> Result<usize> {
        query.execute(store)
    }
}

/// Runs the chunked transforms against a store that already holds the raw
/// inputs and the output tables.
pub struct TransformEngine<'a, E = StoreExecutor> {
    store: &'a mut Store,
    today: NaiveDate,
    executor: E,
}

impl<'a> TransformEngine<'a, StoreExecutor> {
    pub fn new(store: &'a mut Store, today: NaiveDate) -> Self {
        TransformEngine::with_executor(store, today, StoreExecutor)
    }
}

impl<'a, E: ChunkExecutor> TransformEngine<'a, E> {
    pub fn with_executor(store: &'a mut Store, today: NaiveDate, executor: E) -> Self {
        TransformEngine {
            store,
            today,
            executor,
        }
    }

    /// Resolves every stream's watermark and replays its pending days.
    pub fn run(&mut self, mode: RunMode) -> Result<RunSummary> {
        let mut summary = RunSummary::default();

        for (stream, watermark) in watermark::resolve_all(self.store, mode)? {
            let report = match watermark {
                Some(watermark) => self.process_stream(watermark)?,
                None => {
                    info!("No {} data to process.", stream);
                    StreamReport::skipped(stream, None)
                }
            };
            summary.streams.push(report);
        }

        Ok(summary)
    }

    /// Replays `[start_date, today)` of one stream, one day per chunk.
    pub fn process_stream(&mut self, watermark: Watermark) -> Result<StreamReport> {
        let stream = watermark.stream;
        let pending_days = watermark.pending_days(self.today);

        if pending_days == 0 {
            info!("No new {} data to process.", stream);
            return Ok(StreamReport::skipped(stream, Some(watermark.start_date)));
        }

        info!(
            "Processing {} data for {} days starting {}...",
            stream, pending_days, watermark.start_date
        );

        let mut report = StreamReport {
            pending_days,
            ..StreamReport::skipped(stream, Some(watermark.start_date))
        };

        for (i, date_threshold) in watermark.chunk_dates(self.today).enumerate() {
            debug!(
                "[{}] Processing chunk {} / {}",
                stream.label(),
                i + 1,
                pending_days
            );

            let query = ChunkQuery::new(stream, date_threshold);
            debug!("[{}] {}", stream.label(), query);

            let inserted = self.executor.execute(self.store, &query)?;
            debug!(
                "[{}] Inserted {} rows for {}",
                stream.label(),
                inserted,
                date_threshold
            );

            report.chunks_processed += 1;
            report.rows_inserted += inserted;
        }

        info!(
            "Inserted {} {} rows into {}",
            report.rows_inserted,
            stream,
            stream.target_table()
        );
        Ok(report)
    }
}

/// Runs one complete ETL pass: load, resolve, transform, write.
///
/// `today` is exclusive: the newest chunk processed is the day before it.
pub fn run_etl(config: &EtlConfig, today: NaiveDate) -> Result<RunSummary> {
    run_etl_with(config, today, StoreExecutor)
}

/// [`run_etl`] with a caller-supplied chunk executor.
///
/// Output files are only replaced once every chunk has succeeded; an error
/// from `executor` leaves the previous snapshot untouched.
pub fn run_etl_with<E: ChunkExecutor>(
    config: &EtlConfig,
    today: NaiveDate,
    executor: E,
) -> Result<RunSummary> {
    info!("Starting ETL...");
    info!("Process all: {}", config.process_all());

    let mut store = Store::new();
    loader::load_sources(&mut store, &config.input_dir)?;

    match config.mode {
        RunMode::Full => loader::create_empty_outputs(&mut store)?,
        RunMode::Incremental => loader::load_output_state(&mut store, &config.output_dir)?,
    }

    let summary = TransformEngine::with_executor(&mut store, today, executor).run(config.mode)?;

    writer::write_outputs(&store, &config.output_dir)?;

    Ok(summary)
}
