//! Watermark ETL CLI
//!
//! Reads `deposit.csv`, `withdrawl.csv` and `event.csv` from the input
//! directory and writes `transaction.csv` and `user_login.csv` to the output
//! directory.
//!
//! # Usage
//!
//! ```bash
//! PROCESS_ALL=1 INPUT_DATA_PATH=data/input OUTPUT_DATA_PATH=data/output cargo run
//! ```
//!
//! # Environment Variables
//!
//! - `PROCESS_ALL`: `1` rebuilds outputs from scratch, `0` (default) resumes
//! - `LOGS_LEVEL`: `CRITICAL`, `ERROR`, `WARNING`, `INFO` (default), `DEBUG`,
//!   `TRACE` or `NOTSET`; `RUST_LOG` takes precedence
//! - `INPUT_DATA_PATH` / `OUTPUT_DATA_PATH`: input and output directories
//! - `RUN_DATE`: `YYYY-MM-DD` to use instead of today's date

use chrono::Local;
use env_logger::Env;
use log::{error, info, LevelFilter};
use std::io::Write;
use std::process;
use std::time::Instant;
use watermark_etl::config::DEFAULT_LOGS_LEVEL;
use watermark_etl::{run_etl, EtlConfig, EtlError, Result};

fn main() {
    let started = Instant::now();

    let config = match EtlConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            // The configured level is unknown, so report at the default one.
            init_logging(DEFAULT_LOGS_LEVEL);
            fail(e);
        }
    };
    init_logging(config.logs_level);

    if let Err(e) = run(&config, started) {
        fail(e);
    }
}

fn fail(e: EtlError) -> ! {
    error!("{}", e);
    eprintln!("Error: {}", e);
    process::exit(1);
}

fn init_logging(level: LevelFilter) {
    env_logger::Builder::from_env(Env::default().default_filter_or(level.to_string()))
        .format(|buf, record| {
            writeln!(
                buf,
                "{} | {} | {}",
                buf.timestamp(),
                record.level(),
                record.args()
            )
        })
        .init();
}

fn run(config: &EtlConfig, started: Instant) -> Result<()> {
    let today = config.run_date.unwrap_or_else(|| Local::now().date_naive());

    run_etl(config, today)?;

    let elapsed = started.elapsed().as_secs();
    info!(
        "ETL process completed in {} minutes and {} seconds.",
        elapsed / 60,
        elapsed % 60
    );
    Ok(())
}
