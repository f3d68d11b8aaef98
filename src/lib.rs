//! # Watermark ETL
//!
//! An incremental batch ETL that turns raw deposit, withdrawal and event CSVs
//! into two append-only tables, `transaction` and `user_login`.
//!
//! ## Design Principles
//!
//! - **Derived watermarks**: nothing but the output CSVs survives a run; each
//!   stream's start date is recomputed from them (or from the raw minima in
//!   full mode)
//! - **Day-sized chunks**: pending history is replayed one calendar day at a
//!   time, oldest first, which makes an aborted run resumable
//! - **Per-chunk distinctness**: duplicates are collapsed within a day chunk
//!   only; replaying a day that already reached the output duplicates it
//! - **Parameterized inserts**: chunk statements are built from closed enums
//!   and bound dates, never from interpolated text
//!
//! ## Example
//!
//! ```no_run
//! use chrono::NaiveDate;
//! use watermark_etl::{run_etl, EtlConfig, RunMode};
//!
//! let config = EtlConfig {
//!     mode: RunMode::Full,
//!     ..EtlConfig::default()
//! };
//! let today = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
//! let summary = run_etl(&config, today).unwrap();
//! println!("{} rows inserted", summary.total_rows_inserted());
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod loader;
pub mod query;
pub mod record;
pub mod store;
pub mod timestamp;
pub mod watermark;
pub mod writer;

pub use config::{EtlConfig, RunMode};
pub use engine::{
    run_etl, run_etl_with, ChunkExecutor, RunSummary, StoreExecutor, StreamReport,
    TransformEngine,
};
pub use error::{EtlError, Result};
pub use query::{ChunkQuery, Stream};
pub use record::{
    RawDepositRecord, RawEventRecord, RawTransferRecord, RawWithdrawalRecord, TransactionRecord,
    TransactionType, UserLoginRecord,
};
pub use store::{Store, Table, TableName};
pub use timestamp::EventTimestamp;
pub use watermark::Watermark;
