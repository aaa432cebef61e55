// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Accounting months: calendar months shifted forward once a configurable
//! cutoff day-of-month is reached.

use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Day-of-month (1..=31) from which dates count toward the next accounting month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct CutoffDay(u32);

impl CutoffDay {
    pub const DEFAULT: CutoffDay = CutoffDay(26);

    pub fn new(day: u32) -> Result<Self, ValidationError> {
        if (1..=31).contains(&day) {
            Ok(Self(day))
        } else {
            Err(ValidationError::InvalidCutoffDay(day))
        }
    }

    pub fn get(&self) -> u32 {
        self.0
    }
}

impl Default for CutoffDay {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl TryFrom<u32> for CutoffDay {
    type Error = ValidationError;

    fn try_from(day: u32) -> Result<Self, Self::Error> {
        Self::new(day)
    }
}

impl From<CutoffDay> for u32 {
    fn from(c: CutoffDay) -> Self {
        c.0
    }
}

impl fmt::Display for CutoffDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A (year, month) bucket. Ordering is chronological.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AccountingMonth {
    year: i32,
    month: u32,
}

impl AccountingMonth {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        (1..=12).contains(&month).then_some(Self { year, month })
    }

    /// The accounting month `date` belongs to under `cutoff`.
    pub fn of(date: NaiveDate, cutoff: CutoffDay) -> Self {
        let calendar = Self {
            year: date.year(),
            month: date.month(),
        };
        if date.day() >= cutoff.get() {
            calendar.add_months(1)
        } else {
            calendar
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    /// Shift by `n` months (negative moves backwards), rolling the year over.
    pub fn add_months(self, n: i32) -> Self {
        let index = self.year * 12 + (self.month as i32 - 1) + n;
        Self {
            year: index.div_euclid(12),
            month: index.rem_euclid(12) as u32 + 1,
        }
    }

    pub fn next(self) -> Self {
        self.add_months(1)
    }

    pub fn previous(self) -> Self {
        self.add_months(-1)
    }
}

impl fmt::Display for AccountingMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

pub fn accounting_month_of(date: NaiveDate, cutoff: CutoffDay) -> AccountingMonth {
    AccountingMonth::of(date, cutoff)
}

pub fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 => {
            if NaiveDate::from_ymd_opt(year, 2, 29).is_some() {
                29
            } else {
                28
            }
        }
        _ => 0,
    }
}

pub fn is_last_day_of_month(date: NaiveDate) -> bool {
    date.day() == days_in_month(date.year(), date.month())
}
