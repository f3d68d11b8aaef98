//! Watermark resolution and pending-day math.
//!
//! A watermark is never persisted. Each run recomputes it from the raw
//! streams (full mode) or from the prior outputs (incremental mode).

use crate::config::RunMode;
use crate::error::{EtlError, Result};
use crate::query::Stream;
use crate::store::Store;
use crate::timestamp::EventTimestamp;
use chrono::{Days, NaiveDate};
use log::warn;

/// The first date of a stream that still has to be processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Watermark {
    pub stream: Stream,
    pub start_date: NaiveDate,
}

impl Watermark {
    /// Number of whole days in `[start_date, today)`.
    pub fn pending_days(&self, today: NaiveDate) -> u32 {
        pending_days(self.start_date, today)
    }

    /// The chunk dates in ascending order, covering `[start_date, today)`.
    pub fn chunk_dates(&self, today: NaiveDate) -> impl Iterator<Item = NaiveDate> {
        let start = self.start_date;
        (0..self.pending_days(today)).filter_map(move |i| chunk_date(start, i))
    }
}

/// `(today - start_date).days`, saturating at zero for start dates after today.
pub fn pending_days(start_date: NaiveDate, today: NaiveDate) -> u32 {
    let days = (today - start_date).num_days();
    if days < 0 {
        warn!(
            "Start date {} is after today ({}); nothing to process",
            start_date, today
        );
        return 0;
    }
    u32::try_from(days).unwrap_or(u32::MAX)
}

/// `start_date + i` days.
pub fn chunk_date(start_date: NaiveDate, i: u32) -> Option<NaiveDate> {
    start_date.checked_add_days(Days::new(u64::from(i)))
}

/// Resolves the start date of `stream`.
///
/// Full mode starts at the stream's earliest raw record and yields `None` if
/// the stream is empty. Incremental mode starts the day after the latest date
/// already present in the stream's output partition, which must not be empty.
pub fn resolve(store: &Store, mode: RunMode, stream: Stream) -> Result<Option<Watermark>> {
    let start_date = match mode {
        RunMode::Full => raw_minimum(store, stream)?.map(|ts| ts.floor_to_date()),
        RunMode::Incremental => {
            let latest = output_maximum(store, stream)?.ok_or(EtlError::AmbiguousWatermark {
                stream: stream.as_str(),
                table: stream.target_table().as_str(),
            })?;
            Some(day_after(latest.floor_to_date(), stream)?)
        }
    };

    Ok(start_date.map(|start_date| Watermark { stream, start_date }))
}

/// Resolves every stream, in processing order.
pub fn resolve_all(store: &Store, mode: RunMode) -> Result<Vec<(Stream, Option<Watermark>)>> {
    Stream::ALL
        .into_iter()
        .map(|stream| Ok((stream, resolve(store, mode, stream)?)))
        .collect()
}

fn raw_minimum(store: &Store, stream: Stream) -> Result<Option<EventTimestamp>> {
    match stream {
        Stream::Deposit | Stream::Withdrawal => {
            Ok(store.transfer(stream.source_table())?.min_timestamp())
        }
        Stream::Event => Ok(store.event()?.min_timestamp()),
    }
}

fn output_maximum(store: &Store, stream: Stream) -> Result<Option<EventTimestamp>> {
    match stream.transaction_type() {
        Some(tx_type) => Ok(store
            .transaction()?
            .max_timestamp_where(|row| row.transaction_type == tx_type)),
        None => Ok(store.user_login()?.max_timestamp_where(|_| true)),
    }
}

fn day_after(date: NaiveDate, stream: Stream) -> Result<NaiveDate> {
    date.succ_opt().ok_or_else(|| EtlError::QueryExecution {
        query: format!("watermark for {}", stream),
        message: format!("no calendar day after {}", date),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{RawTransferRecord, TransactionRecord, TransactionType};
    use crate::store::TableName;
    use rust_decimal_macros::dec;
    use std::str::FromStr;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::from_str(s).unwrap()
    }

    fn deposit(at: &str) -> RawTransferRecord {
        RawTransferRecord {
            user_id: "u1".to_string(),
            transaction_id: 1,
            tx_status: "complete".to_string(),
            amount: dec!(1),
            currency: "USD".to_string(),
            event_timestamp: EventTimestamp::from_str(at).unwrap(),
        }
    }

    fn tx(tx_type: TransactionType, at: &str) -> TransactionRecord {
        TransactionRecord::from_transfer(&deposit(at), tx_type)
    }

    fn raw_store(deposits: Vec<RawTransferRecord>) -> Store {
        let mut store = Store::new();
        store
            .create_transfer_table(TableName::Deposit, deposits)
            .unwrap();
        store
            .create_transfer_table(TableName::Withdrawal, Vec::new())
            .unwrap();
        store.create_event_table(Vec::new()).unwrap();
        store
    }

    #[test]
    fn test_pending_days() {
        assert_eq!(pending_days(date("2024-01-01"), date("2024-01-01")), 0);
        assert_eq!(pending_days(date("2024-01-01"), date("2024-01-02")), 1);
        assert_eq!(pending_days(date("2024-02-27"), date("2024-03-01")), 3);
        assert_eq!(pending_days(date("2024-01-05"), date("2024-01-01")), 0);
    }

    #[test]
    fn test_chunk_dates_cover_half_open_range() {
        let watermark = Watermark {
            stream: Stream::Deposit,
            start_date: date("2023-12-30"),
        };

        let dates: Vec<NaiveDate> = watermark.chunk_dates(date("2024-01-02")).collect();
        assert_eq!(
            dates,
            vec![date("2023-12-30"), date("2023-12-31"), date("2024-01-01")]
        );
    }

    #[test]
    fn test_chunk_i_targets_start_plus_i() {
        let start = date("2024-02-28");
        for i in 0..5u32 {
            let expected = start + chrono::Duration::days(i64::from(i));
            assert_eq!(chunk_date(start, i), Some(expected));
        }
    }

    #[test]
    fn test_full_mode_uses_earliest_raw_date() {
        let store = raw_store(vec![
            deposit("2024-01-03 08:00:00"),
            deposit("2024-01-01 23:59:00"),
        ]);

        let watermark = resolve(&store, RunMode::Full, Stream::Deposit)
            .unwrap()
            .unwrap();
        assert_eq!(watermark.start_date, date("2024-01-01"));
    }

    #[test]
    fn test_full_mode_empty_stream_has_no_watermark() {
        let store = raw_store(Vec::new());
        assert!(resolve(&store, RunMode::Full, Stream::Withdrawal)
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_incremental_starts_the_day_after_latest_output() {
        let mut store = raw_store(Vec::new());
        store
            .create_transaction_table(vec![
                tx(TransactionType::Deposit, "2024-01-05 17:00:00"),
                tx(TransactionType::Deposit, "2024-01-02 00:00:00"),
                tx(TransactionType::Withdrawal, "2024-01-09 00:00:00"),
            ])
            .unwrap();
        store.create_user_login_table(Vec::new()).unwrap();

        let deposit_mark = resolve(&store, RunMode::Incremental, Stream::Deposit)
            .unwrap()
            .unwrap();
        assert_eq!(deposit_mark.start_date, date("2024-01-06"));
        // The latest processed day itself is not replayed.
        assert_eq!(deposit_mark.pending_days(date("2024-01-06")), 0);
        assert_eq!(deposit_mark.pending_days(date("2024-01-08")), 2);

        let withdrawal_mark = resolve(&store, RunMode::Incremental, Stream::Withdrawal)
            .unwrap()
            .unwrap();
        assert_eq!(withdrawal_mark.start_date, date("2024-01-10"));
    }

    #[test]
    fn test_incremental_empty_partition_is_ambiguous() {
        let mut store = raw_store(Vec::new());
        store
            .create_transaction_table(vec![tx(TransactionType::Deposit, "2024-01-05 00:00:00")])
            .unwrap();
        store.create_user_login_table(Vec::new()).unwrap();

        let err = resolve(&store, RunMode::Incremental, Stream::Withdrawal).unwrap_err();
        assert!(matches!(
            err,
            EtlError::AmbiguousWatermark {
                stream: "withdrawal",
                table: "transaction"
            }
        ));

        let err = resolve(&store, RunMode::Incremental, Stream::Event).unwrap_err();
        assert!(matches!(
            err,
            EtlError::AmbiguousWatermark {
                stream: "event",
                ..
            }
        ));
    }

    #[test]
    fn test_resolve_all_keeps_stream_order() {
        let store = raw_store(vec![deposit("2024-01-01 00:00:00")]);

        let marks = resolve_all(&store, RunMode::Full).unwrap();
        let streams: Vec<Stream> = marks.iter().map(|(s, _)| *s).collect();
        assert_eq!(streams, Stream::ALL.to_vec());
        assert!(marks[0].1.is_some());
        assert!(marks[1].1.is_none());
    }
}
