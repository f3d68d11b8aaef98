//! Materializes CSV files into the store.
//!
//! Raw inputs are loaded on every run. Prior outputs are loaded only when
//! resuming, since the store keeps nothing between invocations.

use crate::error::{EtlError, Result};
use crate::query::Stream;
use crate::store::{Store, TableName};
use csv::{ReaderBuilder, Trim};
use log::{error, info};
use serde::de::DeserializeOwned;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

/// Reads every row of a CSV source. Any malformed row is fatal.
pub fn read_rows<T, R>(reader: R, path: &Path) -> Result<Vec<T>>
where
    T: DeserializeOwned,
    R: Read,
{
    let mut csv_reader = ReaderBuilder::new().trim(Trim::All).from_reader(reader);
    let mut rows = Vec::new();

    for (row_idx, result) in csv_reader.deserialize::<T>().enumerate() {
        let row_num = row_idx + 2; // 1-indexed, accounting for header row
        let row = result.map_err(|e| EtlError::InvalidRecord {
            path: path.to_path_buf(),
            row: row_num,
            message: e.to_string(),
        })?;
        rows.push(row);
    }

    Ok(rows)
}

fn open_required(path: &Path, missing: fn(PathBuf) -> EtlError) -> Result<BufReader<File>> {
    if !path.is_file() {
        error!(
            "Couldn't find {} in {}. Please check if the file exists.",
            path.file_name()
                .map(|n| n.to_string_lossy())
                .unwrap_or_default(),
            path.parent().unwrap_or(Path::new("")).display()
        );
        return Err(missing(path.to_path_buf()));
    }
    Ok(BufReader::new(File::open(path)?))
}

fn load<T: DeserializeOwned>(
    dir: &Path,
    table: TableName,
    missing: fn(PathBuf) -> EtlError,
) -> Result<Vec<T>> {
    let path = dir.join(table.file_name());
    let reader = open_required(&path, missing)?;
    info!("Reading {} from {}", table.file_name(), path.display());

    let rows = read_rows(reader, &path)?;
    info!("Loaded {} rows into {}", rows.len(), table);
    Ok(rows)
}

fn missing_input(path: PathBuf) -> EtlError {
    EtlError::MissingInput { path }
}

fn missing_output(path: PathBuf) -> EtlError {
    EtlError::MissingOutput { path }
}

/// Loads the deposit, withdrawal and event inputs from `input_dir`.
///
/// Each call creates fresh tables, so calling it twice on one store fails.
pub fn load_sources(store: &mut Store, input_dir: &Path) -> Result<()> {
    info!("Reading input csv files...");

    for stream in Stream::ALL {
        let table = stream.source_table();
        match stream {
            Stream::Deposit | Stream::Withdrawal => {
                let rows = load(input_dir, table, missing_input)?;
                store.create_transfer_table(table, rows)?;
            }
            Stream::Event => {
                let rows = load(input_dir, table, missing_input)?;
                store.create_event_table(rows)?;
            }
        }
    }

    Ok(())
}

/// Loads the previously written transaction and user_login tables from `output_dir`.
pub fn load_output_state(store: &mut Store, output_dir: &Path) -> Result<()> {
    info!("Reading output table csv files...");

    let transactions = load(output_dir, TableName::Transaction, missing_output)?;
    let logins = load(output_dir, TableName::UserLogin, missing_output)?;

    store.create_transaction_table(transactions)?;
    store.create_user_login_table(logins)?;
    Ok(())
}

/// Creates empty output tables for a full rebuild.
pub fn create_empty_outputs(store: &mut Store) -> Result<()> {
    store.create_transaction_table(Vec::new())?;
    store.create_user_login_table(Vec::new())?;
    Ok(())
}
