//! In-process tabular store.
//!
//! Holds every table of one run. Tables are created exactly once per run and
//! are only ever appended to; no row is updated or removed.

use crate::error::{EtlError, Result};
use crate::record::{
    RawEventRecord, RawTransferRecord, Timestamped, TransactionRecord, UserLoginRecord,
};
use crate::timestamp::EventTimestamp;
use chrono::NaiveDate;
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::hash::Hash;

/// The closed set of table names the store knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableName {
    Deposit,
    Withdrawal,
    Event,
    Transaction,
    UserLogin,
}

impl TableName {
    pub fn as_str(&self) -> &'static str {
        match self {
            TableName::Deposit => "deposit",
            TableName::Withdrawal => "withdrawal",
            TableName::Event => "event",
            TableName::Transaction => "transaction",
            TableName::UserLogin => "user_login",
        }
    }

    /// File the table is read from or written to.
    ///
    /// The withdrawal input keeps its historical `withdrawl.csv` name.
    pub fn file_name(&self) -> &'static str {
        match self {
            TableName::Deposit => "deposit.csv",
            TableName::Withdrawal => "withdrawl.csv",
            TableName::Event => "event.csv",
            TableName::Transaction => "transaction.csv",
            TableName::UserLogin => "user_login.csv",
        }
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named, append-only table of typed rows.
///
/// Row positions are indexed by the calendar day of their event timestamp, so
/// a day chunk only visits that day's rows.
#[derive(Debug, Clone)]
pub struct Table<R> {
    name: TableName,
    rows: Vec<R>,
    by_date: BTreeMap<NaiveDate, Vec<usize>>,
}

impl<R> Table<R> {
    pub fn name(&self) -> TableName {
        self.name
    }

    pub fn rows(&self) -> &[R] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows whose event timestamp falls on `day`, in insertion order.
    pub fn rows_on(&self, day: NaiveDate) -> impl Iterator<Item = &R> + '_ {
        self.by_date
            .get(&day)
            .into_iter()
            .flatten()
            .map(move |&idx| &self.rows[idx])
    }

    /// `SELECT DISTINCT project(row) FROM table
    ///  WHERE CAST(event_timestamp AS DATE) = day AND filter(row)`.
    ///
    /// Rows keep the order in which they were first seen.
    pub fn select_distinct_on<T, F, P>(&self, day: NaiveDate, filter: F, project: P) -> Vec<T>
    where
        T: Eq + Hash + Clone,
        F: Fn(&R) -> bool,
        P: Fn(&R) -> T,
    {
        let mut seen = HashSet::new();
        let mut selected = Vec::new();

        for row in self.rows_on(day).filter(|row| filter(row)) {
            let projected = project(row);
            if seen.insert(projected.clone()) {
                selected.push(projected);
            }
        }

        selected
    }
}

impl<R: Timestamped> Table<R> {
    pub fn new(name: TableName, rows: Vec<R>) -> Self {
        let mut table = Table {
            name,
            rows: Vec::new(),
            by_date: BTreeMap::new(),
        };
        table.insert(rows);
        table
    }

    /// Appends rows, returning how many were added.
    pub fn insert(&mut self, rows: Vec<R>) -> usize {
        let count = rows.len();
        for row in rows {
            let day = row.event_timestamp().floor_to_date();
            self.by_date.entry(day).or_default().push(self.rows.len());
            self.rows.push(row);
        }
        count
    }

    /// `SELECT MIN(event_timestamp) FROM table`.
    pub fn min_timestamp(&self) -> Option<EventTimestamp> {
        self.rows.iter().map(Timestamped::event_timestamp).min()
    }

    /// `SELECT MAX(event_timestamp) FROM table WHERE predicate(row)`.
    pub fn max_timestamp_where<F>(&self, predicate: F) -> Option<EventTimestamp>
    where
        F: Fn(&R) -> bool,
    {
        self.rows
            .iter()
            .filter(|row| predicate(row))
            .map(Timestamped::event_timestamp)
            .max()
    }
}

/// The tables of one run, owned exclusively by that run.
#[derive(Debug, Default)]
pub struct Store {
    deposit: Option<Table<RawTransferRecord>>,
    withdrawal: Option<Table<RawTransferRecord>>,
    event: Option<Table<RawEventRecord>>,
    transaction: Option<Table<TransactionRecord>>,
    user_login: Option<Table<UserLoginRecord>>,
}

fn create<R: Timestamped>(slot: &mut Option<Table<R>>, name: TableName, rows: Vec<R>) -> Result<()> {
    if slot.is_some() {
        return Err(EtlError::QueryExecution {
            query: format!("CREATE TABLE {}", name),
            message: format!("table {} already exists", name),
        });
    }
    *slot = Some(Table::new(name, rows));
    Ok(())
}

fn missing(name: TableName) -> EtlError {
    EtlError::QueryExecution {
        query: format!("SELECT * FROM {}", name),
        message: format!("table {} does not exist", name),
    }
}

impl Store {
    /// Creates an empty store.
    pub fn new() -> Self {
        Store::default()
    }

    /// Returns `true` if the table has been created.
    pub fn has_table(&self, name: TableName) -> bool {
        match name {
            TableName::Deposit => self.deposit.is_some(),
            TableName::Withdrawal => self.withdrawal.is_some(),
            TableName::Event => self.event.is_some(),
            TableName::Transaction => self.transaction.is_some(),
            TableName::UserLogin => self.user_login.is_some(),
        }
    }

    /// Creates a raw transfer table; `name` must be `Deposit` or `Withdrawal`.
    pub fn create_transfer_table(
        &mut self,
        name: TableName,
        rows: Vec<RawTransferRecord>,
    ) -> Result<()> {
        match name {
            TableName::Deposit => create(&mut self.deposit, name, rows),
            TableName::Withdrawal => create(&mut self.withdrawal, name, rows),
            other => Err(EtlError::QueryExecution {
                query: format!("CREATE TABLE {}", other),
                message: format!("{} does not hold transfer rows", other),
            }),
        }
    }

    pub fn create_event_table(&mut self, rows: Vec<RawEventRecord>) -> Result<()> {
        create(&mut self.event, TableName::Event, rows)
    }

    pub fn create_transaction_table(&mut self, rows: Vec<TransactionRecord>) -> Result<()> {
        create(&mut self.transaction, TableName::Transaction, rows)
    }

    pub fn create_user_login_table(&mut self, rows: Vec<UserLoginRecord>) -> Result<()> {
        create(&mut self.user_login, TableName::UserLogin, rows)
    }

    /// Looks up a raw transfer table; `name` must be `Deposit` or `Withdrawal`.
    pub fn transfer(&self, name: TableName) -> Result<&Table<RawTransferRecord>> {
        let table = match name {
            TableName::Deposit => self.deposit.as_ref(),
            TableName::Withdrawal => self.withdrawal.as_ref(),
            _ => None,
        };
        table.ok_or_else(|| missing(name))
    }

    pub fn event(&self) -> Result<&Table<RawEventRecord>> {
        self.event.as_ref().ok_or_else(|| missing(TableName::Event))
    }

    pub fn transaction(&self) -> Result<&Table<TransactionRecord>> {
        self.transaction
            .as_ref()
            .ok_or_else(|| missing(TableName::Transaction))
    }

    pub fn transaction_mut(&mut self) -> Result<&mut Table<TransactionRecord>> {
        self.transaction
            .as_mut()
            .ok_or_else(|| missing(TableName::Transaction))
    }

    pub fn user_login(&self) -> Result<&Table<UserLoginRecord>> {
        self.user_login
            .as_ref()
            .ok_or_else(|| missing(TableName::UserLogin))
    }

    pub fn user_login_mut(&mut self) -> Result<&mut Table<UserLoginRecord>> {
        self.user_login
            .as_mut()
            .ok_or_else(|| missing(TableName::UserLogin))
    }
}
