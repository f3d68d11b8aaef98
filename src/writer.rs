//! Writes the output tables back to CSV.
//!
//! Every write is a full snapshot of the accumulated table; it becomes the
//! state the next incremental run starts from.

use crate::error::Result;
use crate::store::{Store, Table};
use log::info;
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

/// Serializes rows as CSV with a header row.
pub fn write_rows<T, W>(writer: W, header: &[&str], rows: &[T]) -> Result<()>
where
    T: Serialize,
    W: Write,
{
    let mut csv_writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);

    // Written explicitly so an empty table still carries its header.
    csv_writer.write_record(header)?;
    for row in rows {
        csv_writer.serialize(row)?;
    }

    csv_writer.flush()?;
    Ok(())
}

pub const TRANSACTION_HEADER: [&str; 6] = [
    "user_id",
    "transaction_id",
    "transaction_type",
    "amount",
    "currency",
    "event_timestamp",
];

pub const USER_LOGIN_HEADER: [&str; 3] = ["user_id", "login_id", "event_timestamp"];

fn replace_file<T: Serialize>(output_dir: &Path, table: &Table<T>, header: &[&str]) -> Result<()> {
    let file_name = table.name().file_name();
    let path = output_dir.join(file_name);
    let tmp_path = output_dir.join(format!("{}.tmp", file_name));

    {
        let mut writer = BufWriter::new(File::create(&tmp_path)?);
        write_rows(&mut writer, header, table.rows())?;
        writer.flush()?;
    }
    fs::rename(&tmp_path, &path)?;

    info!("Wrote {} rows to {}", table.len(), path.display());
    Ok(())
}

/// Replaces `transaction.csv` and `user_login.csv` in `output_dir`.
pub fn write_outputs(store: &Store, output_dir: &Path) -> Result<()> {
    info!("Writing transaction and user_login tables to csv files...");
    fs::create_dir_all(output_dir)?;

    replace_file(output_dir, store.transaction()?, &TRANSACTION_HEADER)?;
    replace_file(output_dir, store.user_login()?, &USER_LOGIN_HEADER)?;

    Ok(())
}
