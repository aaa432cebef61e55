// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::models::TransactionId;

/// Rejected form input. Raised before the store is touched.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("Amount is required")]
    MissingAmount,
    #[error("Date is required")]
    MissingDate,
    #[error("Amount must not be negative (got {0})")]
    NegativeAmount(Decimal),
    #[error("Cutoff day must be between 1 and 31 (got {0})")]
    InvalidCutoffDay(u32),
    #[error("No transactions selected")]
    NothingSelected,
}

#[derive(Debug, Error, PartialEq)]
pub enum RecurrenceConfigError {
    #[error("Recurrence frequency must be at least 1")]
    ZeroFrequency,
    #[error("Recurrence end date {end} is before the first occurrence {start}")]
    EndBeforeStart { start: NaiveDate, end: NaiveDate },
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Transaction {0} not found")]
    NotFound(TransactionId),
    #[error("Write rejected: {0}")]
    Rejected(String),
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("Corrupt record {id}: {reason}")]
    Corrupt { id: TransactionId, reason: String },
    #[error("Snapshot feed closed")]
    Closed,
}

#[derive(Debug, Error)]
pub enum TrackerError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Recurrence(#[from] RecurrenceConfigError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("Not signed in")]
    NotSignedIn,
}
