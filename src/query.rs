//! Parameterized chunk inserts.
//!
//! Every write into an output table goes through [`ChunkQuery`]. Table names
//! come from [`TableName`] and the date threshold is a bound parameter, so no
//! statement is ever assembled from caller-provided text.

use crate::error::Result;
use crate::record::{
    RawEventRecord, RawTransferRecord, TransactionRecord, TransactionType, UserLoginRecord,
    COMPLETE_STATUS, LOGIN_EVENT,
};
use crate::store::{Store, TableName};
use chrono::NaiveDate;
use std::fmt;

/// One of the three raw input streams.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stream {
    Deposit,
    Withdrawal,
    Event,
}

impl Stream {
    /// All streams in processing order.
    pub const ALL: [Stream; 3] = [Stream::Deposit, Stream::Withdrawal, Stream::Event];

    pub fn as_str(&self) -> &'static str {
        match self {
            Stream::Deposit => "deposit",
            Stream::Withdrawal => "withdrawal",
            Stream::Event => "event",
        }
    }

    /// Capitalized label used in chunk progress logs.
    pub fn label(&self) -> &'static str {
        match self {
            Stream::Deposit => "Deposit",
            Stream::Withdrawal => "Withdrawal",
            Stream::Event => "Event",
        }
    }

    pub fn source_table(&self) -> TableName {
        match self {
            Stream::Deposit => TableName::Deposit,
            Stream::Withdrawal => TableName::Withdrawal,
            Stream::Event => TableName::Event,
        }
    }

    pub fn target_table(&self) -> TableName {
        match self {
            Stream::Deposit | Stream::Withdrawal => TableName::Transaction,
            Stream::Event => TableName::UserLogin,
        }
    }

    /// Type tag of the stream's rows in the transaction table, if it writes there.
    pub fn transaction_type(&self) -> Option<TransactionType> {
        match self {
            Stream::Deposit => Some(TransactionType::Deposit),
            Stream::Withdrawal => Some(TransactionType::Withdrawal),
            Stream::Event => None,
        }
    }
}

impl fmt::Display for Stream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A bound statement parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Param {
    Text(&'static str),
    Date(NaiveDate),
}

impl fmt::Display for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Param::Text(s) => write!(f, "'{}'", s),
            Param::Date(d) => write!(f, "DATE '{}'", d),
        }
    }
}

/// Insert-select of one calendar day of one stream into its output table.
///
/// Rows are distinct within the chunk only; a row already present in the
/// target from another chunk or an earlier run is inserted again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkQuery {
    pub stream: Stream,
    pub date_threshold: NaiveDate,
}

impl ChunkQuery {
    pub fn new(stream: Stream, date_threshold: NaiveDate) -> Self {
        ChunkQuery {
            stream,
            date_threshold,
        }
    }

    /// The statement text with `$n` placeholders.
    pub fn statement(&self) -> String {
        let source = self.stream.source_table();
        let target = self.stream.target_table();

        match self.stream {
            Stream::Deposit | Stream::Withdrawal => format!(
                "INSERT INTO {} SELECT DISTINCT user_id, id, $1, amount, currency, event_timestamp \
                 FROM {} WHERE tx_status = $2 AND CAST(event_timestamp AS DATE) = $3",
                target, source
            ),
            Stream::Event => format!(
                "INSERT INTO {} SELECT DISTINCT user_id, id, event_timestamp \
                 FROM {} WHERE event_name = $1 AND CAST(event_timestamp AS DATE) = $2",
                target, source
            ),
        }
    }

    /// Values bound to the statement's placeholders, in order.
    pub fn params(&self) -> Vec<Param> {
        match self.stream.transaction_type() {
            Some(tx_type) => vec![
                Param::Text(tx_type.as_str()),
                Param::Text(COMPLETE_STATUS),
                Param::Date(self.date_threshold),
            ],
            None => vec![Param::Text(LOGIN_EVENT), Param::Date(self.date_threshold)],
        }
    }

    /// Runs the insert-select, returning the number of rows inserted.
    pub fn execute(&self, store: &mut Store) -> Result<usize> {
        let day = self.date_threshold;

        match self.stream.transaction_type() {
            Some(tx_type) => {
                let rows = store.transfer(self.stream.source_table())?.select_distinct_on(
                    day,
                    RawTransferRecord::is_complete,
                    |raw| TransactionRecord::from_transfer(raw, tx_type),
                );
                Ok(store.transaction_mut()?.insert(rows))
            }
            None => {
                let rows = store.event()?.select_distinct_on(
                    day,
                    RawEventRecord::is_login,
                    UserLoginRecord::from_event,
                );
                Ok(store.user_login_mut()?.insert(rows))
            }
        }
    }
}

impl fmt::Display for ChunkQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let params: Vec<String> = self.params().iter().map(|p| p.to_string()).collect();
        write!(f, "{} [{}]", self.statement(), params.join(", "))
    }
}
