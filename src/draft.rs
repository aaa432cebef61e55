// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::error::{RecurrenceConfigError, ValidationError};
use crate::models::{
    DEFAULT_DESCRIPTION, NewTransaction, Transaction, TransactionId, TransactionType,
};
use crate::recurrence::{Interval, RecurrenceRule};

/// Recurrence part of the form. Turned into a [`RecurrenceRule`] on submit.
#[derive(Debug, Clone, PartialEq)]
pub struct RecurrenceDraft {
    pub interval: Interval,
    pub frequency: u32,
    pub end_date: Option<NaiveDate>,
    pub use_last_day_of_month: bool,
}

impl Default for RecurrenceDraft {
    fn default() -> Self {
        Self {
            interval: Interval::Month,
            frequency: 1,
            end_date: None,
            use_last_day_of_month: false,
        }
    }
}

/// Transaction form fields. Cleared only after the store confirms the write.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionDraft {
    /// Set when the draft edits an existing transaction instead of creating one.
    pub editing: Option<TransactionId>,
    pub description: String,
    pub amount: Option<Decimal>,
    pub r#type: TransactionType,
    pub date: Option<NaiveDate>,
    pub recurrence: Option<RecurrenceDraft>,
}

impl TransactionDraft {
    /// Pre-fill from an existing transaction for editing.
    pub fn from_transaction(t: &Transaction) -> Self {
        Self {
            editing: Some(t.id),
            description: t.description.clone(),
            amount: Some(t.amount),
            r#type: t.r#type,
            date: Some(t.date),
            recurrence: None,
        }
    }

    pub fn validate(&self) -> Result<NewTransaction, ValidationError> {
        let amount = self.amount.ok_or(ValidationError::MissingAmount)?;
        let date = self.date.ok_or(ValidationError::MissingDate)?;
        if amount < Decimal::ZERO {
            return Err(ValidationError::NegativeAmount(amount));
        }
        let description = match self.description.trim() {
            "" => DEFAULT_DESCRIPTION.to_string(),
            d => d.to_string(),
        };
        Ok(NewTransaction {
            description,
            amount,
            r#type: self.r#type,
            date,
            recurring: None,
        })
    }

    /// Rule for a recurring draft, anchored on the draft date.
    pub fn rule(&self, initial_date: NaiveDate) -> Option<Result<RecurrenceRule, RecurrenceConfigError>> {
        self.recurrence.as_ref().map(|r| {
            RecurrenceRule::new(
                r.interval,
                r.frequency,
                initial_date,
                r.end_date,
                r.use_last_day_of_month,
            )
        })
    }
}
