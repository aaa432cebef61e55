// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::recurrence::RecurrenceRule;

pub type TransactionId = i64;

/// Placeholder stored when a transaction is submitted without a description.
pub const DEFAULT_DESCRIPTION: &str = "No description";

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Income,
    #[default]
    Expense,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Income => "income",
            TransactionType::Expense => "expense",
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "income" => Ok(TransactionType::Income),
            "expense" => Ok(TransactionType::Expense),
            other => Err(format!(
                "Invalid transaction type '{}', expected income or expense",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    pub description: String,
    /// Always a non-negative magnitude; the sign comes from `r#type`.
    pub amount: Decimal,
    #[serde(rename = "type")]
    pub r#type: TransactionType,
    pub date: NaiveDate,
    pub created_at: Option<NaiveDateTime>,
    pub updated_at: Option<NaiveDateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recurring: Option<RecurrenceRule>,
}

impl Transaction {
    /// `+amount` for income, `-amount` for expenses.
    pub fn signed_amount(&self) -> Decimal {
        signed(self.r#type, self.amount)
    }
}

pub fn signed(r#type: TransactionType, amount: Decimal) -> Decimal {
    match r#type {
        TransactionType::Income => amount,
        TransactionType::Expense => -amount,
    }
}

/// A transaction that has not been assigned an id by the store yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTransaction {
    pub description: String,
    pub amount: Decimal,
    #[serde(rename = "type")]
    pub r#type: TransactionType,
    pub date: NaiveDate,
    pub recurring: Option<RecurrenceRule>,
}

/// Fields to overwrite on an existing transaction. `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionPatch {
    pub description: Option<String>,
    pub amount: Option<Decimal>,
    pub r#type: Option<TransactionType>,
    pub date: Option<NaiveDate>,
}

impl From<&NewTransaction> for TransactionPatch {
    fn from(t: &NewTransaction) -> Self {
        Self {
            description: Some(t.description.clone()),
            amount: Some(t.amount),
            r#type: Some(t.r#type),
            date: Some(t.date),
        }
    }
}
