//! Row types for the raw input streams and the normalized output tables.

use crate::timestamp::EventTimestamp;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Status a deposit or withdrawal must carry to reach the transaction table.
pub const COMPLETE_STATUS: &str = "complete";

/// Event name that marks a user login.
pub const LOGIN_EVENT: &str = "login";

/// Access to the timestamp every table is windowed by.
pub trait Timestamped {
    fn event_timestamp(&self) -> EventTimestamp;
}

/// A raw deposit or withdrawal row.
///
/// Both input files share this layout, so one type serves both streams.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RawTransferRecord {
    pub user_id: String,

    #[serde(rename = "id", alias = "transaction_id")]
    pub transaction_id: i64,

    /// e.g. `complete`, `pending`, `failed`
    pub tx_status: String,

    #[serde(with = "rust_decimal::serde::str")]
    pub amount: Decimal,

    pub currency: String,

    pub event_timestamp: EventTimestamp,
}

impl RawTransferRecord {
    pub fn is_complete(&self) -> bool {
        self.tx_status == COMPLETE_STATUS
    }
}

/// Alias kept for readability at the deposit call sites.
pub type RawDepositRecord = RawTransferRecord;

/// Alias kept for readability at the withdrawal call sites.
pub type RawWithdrawalRecord = RawTransferRecord;

/// A raw product event row. Only `login` events are carried forward.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RawEventRecord {
    pub user_id: String,

    pub id: i64,

    pub event_name: String,

    pub event_timestamp: EventTimestamp,
}

impl RawEventRecord {
    pub fn is_login(&self) -> bool {
        self.event_name == LOGIN_EVENT
    }
}

/// Direction of a money movement in the unified transaction table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Deposit,

    // Older outputs were written with the misspelled tag.
    #[serde(alias = "withdrawl")]
    Withdrawal,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Deposit => "deposit",
            TransactionType::Withdrawal => "withdrawal",
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A row of the unified `transaction` output table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub user_id: String,

    pub transaction_id: i64,

    pub transaction_type: TransactionType,

    #[serde(with = "rust_decimal::serde::str")]
    pub amount: Decimal,

    pub currency: String,

    pub event_timestamp: EventTimestamp,
}

impl TransactionRecord {
    /// Projects a raw transfer row into the unified table under the given type tag.
    pub fn from_transfer(raw: &RawTransferRecord, transaction_type: TransactionType) -> Self {
        TransactionRecord {
            user_id: raw.user_id.clone(),
            transaction_id: raw.transaction_id,
            transaction_type,
            amount: raw.amount,
            currency: raw.currency.clone(),
            event_timestamp: raw.event_timestamp,
        }
    }
}

/// A row of the `user_login` output table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserLoginRecord {
    pub user_id: String,

    pub login_id: i64,

    pub event_timestamp: EventTimestamp,
}

impl UserLoginRecord {
    pub fn from_event(raw: &RawEventRecord) -> Self {
        UserLoginRecord {
            user_id: raw.user_id.clone(),
            login_id: raw.id,
            event_timestamp: raw.event_timestamp,
        }
    }
}

impl Timestamped for RawTransferRecord {
    fn event_timestamp(&self) -> EventTimestamp {
        self.event_timestamp
    }
}

impl Timestamped for RawEventRecord {
    fn event_timestamp(&self) -> EventTimestamp {
        self.event_timestamp
    }
}

impl Timestamped for TransactionRecord {
    fn event_timestamp(&self) -> EventTimestamp {
        self.event_timestamp
    }
}

impl Timestamped for UserLoginRecord {
    fn event_timestamp(&self) -> EventTimestamp {
        self.event_timestamp
    }
}
