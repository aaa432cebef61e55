// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Expansion of recurring transactions into concrete dated instances.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::calendar::{days_in_month, is_last_day_of_month};
use crate::error::RecurrenceConfigError;
use crate::models::NewTransaction;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Interval {
    Day,
    Week,
    #[default]
    Month,
    Year,
}

impl Interval {
    pub fn as_str(&self) -> &'static str {
        match self {
            Interval::Day => "day",
            Interval::Week => "week",
            Interval::Month => "month",
            Interval::Year => "year",
        }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Interval {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "day" | "daily" => Ok(Interval::Day),
            "week" | "weekly" => Ok(Interval::Week),
            "month" | "monthly" => Ok(Interval::Month),
            "year" | "yearly" => Ok(Interval::Year),
            other => Err(format!(
                "Invalid interval '{}', expected day, week, month or year",
                other
            )),
        }
    }
}

/// How a recurring transaction repeats. Each generated instance keeps a copy.
///
/// Construct through [`RecurrenceRule::new`], which rejects a zero frequency and
/// an end date before the initial date, so that expansion always terminates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecurrenceRule {
    pub interval: Interval,
    pub frequency: u32,
    pub initial_date: NaiveDate,
    /// Inclusive. `None` means one year after `initial_date`.
    pub end_date: Option<NaiveDate>,
    pub use_last_day_of_month: bool,
}

impl RecurrenceRule {
    pub fn new(
        interval: Interval,
        frequency: u32,
        initial_date: NaiveDate,
        end_date: Option<NaiveDate>,
        use_last_day_of_month: bool,
    ) -> Result<Self, RecurrenceConfigError> {
        if frequency < 1 {
            return Err(RecurrenceConfigError::ZeroFrequency);
        }
        if let Some(end) = end_date {
            if end < initial_date {
                return Err(RecurrenceConfigError::EndBeforeStart {
                    start: initial_date,
                    end,
                });
            }
        }
        Ok(Self {
            interval,
            frequency,
            initial_date,
            end_date,
            use_last_day_of_month,
        })
    }

    /// Last date an occurrence may fall on.
    pub fn horizon(&self) -> NaiveDate {
        self.end_date.unwrap_or_else(|| {
            self.initial_date
                .checked_add_months(Months::new(12))
                .unwrap_or(NaiveDate::MAX)
        })
    }

    /// The occurrence following `current`, or `None` past the representable range.
    pub fn step(&self, current: NaiveDate) -> Option<NaiveDate> {
        let n = self.frequency.max(1);
        match self.interval {
            Interval::Day => current.checked_add_days(Days::new(n as u64)),
            Interval::Week => current.checked_add_days(Days::new(7 * n as u64)),
            Interval::Year => current.checked_add_months(Months::new(12 * n)),
            Interval::Month => self.step_month(current, n),
        }
    }

    fn step_month(&self, current: NaiveDate, n: u32) -> Option<NaiveDate> {
        let index = current.year() as i64 * 12 + current.month0() as i64 + n as i64;
        let year = i32::try_from(index.div_euclid(12)).ok()?;
        let month = index.rem_euclid(12) as u32 + 1;
        let last = days_in_month(year, month);

        let original_day = self.initial_date.day();
        let anchored_to_end = original_day == 30 || is_last_day_of_month(self.initial_date);
        let day = if anchored_to_end && self.use_last_day_of_month {
            last
        } else {
            original_day.min(last)
        };
        NaiveDate::from_ymd_opt(year, month, day)
    }

    /// Lazy sequence of occurrence dates, starting at `initial_date` and ending
    /// at the last date not after the horizon. Calling again restarts it.
    pub fn occurrences(&self) -> Occurrences {
        Occurrences {
            rule: *self,
            next: Some(self.initial_date),
            horizon: self.horizon(),
        }
    }

    /// One `NewTransaction` per occurrence, each tagged with this rule.
    pub fn materialize(&self, template: &NewTransaction) -> Vec<NewTransaction> {
        self.occurrences()
            .map(|date| NewTransaction {
                date,
                recurring: Some(*self),
                ..template.clone()
            })
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct Occurrences {
    rule: RecurrenceRule,
    next: Option<NaiveDate>,
    horizon: NaiveDate,
}

impl Iterator for Occurrences {
    type Item = NaiveDate;

    fn next(&mut self) -> Option<NaiveDate> {
        let current = self.next.take()?;
        if current > self.horizon {
            return None;
        }
        self.next = self.rule.step(current).filter(|d| *d > current);
        Some(current)
    }
}

/// Validate the rule parameters and collect every occurrence date.
pub fn expand(
    initial_date: NaiveDate,
    interval: Interval,
    frequency: u32,
    end_date: Option<NaiveDate>,
    use_last_day_of_month: bool,
) -> Result<Vec<NaiveDate>, RecurrenceConfigError> {
    let rule = RecurrenceRule::new(
        interval,
        frequency,
        initial_date,
        end_date,
        use_last_day_of_month,
    )?;
    Ok(rule.occurrences().collect())
}
