// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::{Transaction, TransactionType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeFilter {
    #[default]
    All,
    Income,
    Expense,
}

impl TypeFilter {
    pub fn accepts(&self, t: TransactionType) -> bool {
        match self {
            TypeFilter::All => true,
            TypeFilter::Income => t == TransactionType::Income,
            TypeFilter::Expense => t == TransactionType::Expense,
        }
    }
}

impl FromStr for TypeFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(TypeFilter::All),
            other => other.parse::<TransactionType>().map(|t| match t {
                TransactionType::Income => TypeFilter::Income,
                TransactionType::Expense => TypeFilter::Expense,
            }),
        }
    }
}

/// Optional predicates, combined with AND. The default matches everything.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterCriteria {
    /// Inclusive, compared at day granularity.
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub r#type: TypeFilter,
    pub min_amount: Option<Decimal>,
    pub max_amount: Option<Decimal>,
    /// Case-insensitive substring of the description.
    pub query: Option<String>,
}

impl FilterCriteria {
    pub fn is_empty(&self) -> bool {
        *self == FilterCriteria::default()
    }

    pub fn matches(&self, t: &Transaction) -> bool {
        if let Some(start) = self.start_date {
            if t.date < start {
                return false;
            }
        }
        if let Some(end) = self.end_date {
            if t.date > end {
                return false;
            }
        }
        if !self.r#type.accepts(t.r#type) {
            return false;
        }

        // Expenses compare by magnitude so "expenses >= 50" reads naturally.
        let effective = t.signed_amount();
        let is_expense = t.r#type == TransactionType::Expense;
        if let Some(min) = self.min_amount {
            let below = if is_expense {
                effective.abs() < min.abs()
            } else {
                effective < min
            };
            if below {
                return false;
            }
        }
        if let Some(max) = self.max_amount {
            let above = if is_expense {
                effective.abs() > max.abs()
            } else {
                effective > max
            };
            if above {
                return false;
            }
        }

        if let Some(q) = self.query.as_deref().filter(|q| !q.is_empty()) {
            if !t.description.to_lowercase().contains(&q.to_lowercase()) {
                return false;
            }
        }
        true
    }
}

/// Order-preserving subsequence of `transactions` matching `criteria`.
pub fn filter(transactions: &[Transaction], criteria: &FilterCriteria) -> Vec<Transaction> {
    transactions
        .iter()
        .filter(|t| criteria.matches(t))
        .cloned()
        .collect()
}
