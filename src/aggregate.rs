// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Balances, month-over-month statistics and the month/day grouping used for
//! display. Everything here is recomputed from a full snapshot.

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::calendar::{AccountingMonth, CutoffDay};
use crate::models::{Transaction, TransactionType};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Balances {
    /// Everything up to and including the current accounting month.
    pub current: Decimal,
    /// `current` plus every transaction in later accounting months.
    pub future: Decimal,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MonthTotals {
    pub income: Decimal,
    pub expenses: Decimal,
}

impl MonthTotals {
    fn add(&mut self, t: &Transaction) {
        match t.r#type {
            TransactionType::Income => self.income += t.amount,
            TransactionType::Expense => self.expenses += t.amount,
        }
    }

    pub fn net(&self) -> Decimal {
        self.income - self.expenses
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MonthlyStats {
    pub current_month: AccountingMonth,
    pub current: MonthTotals,
    pub previous_month: AccountingMonth,
    pub previous: MonthTotals,
}

/// Which accounting months besides the current one are displayed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Visibility {
    pub show_past: bool,
    pub show_future: bool,
}

impl Visibility {
    pub fn shows(&self, month: AccountingMonth, current: AccountingMonth) -> bool {
        if month < current {
            self.show_past
        } else if month > current {
            self.show_future
        } else {
            true
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayGroup {
    pub date: NaiveDate,
    pub total: Decimal,
    pub transactions: Vec<Transaction>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthGroup {
    /// Calendar month name and year, e.g. "March 2024".
    pub label: String,
    pub year: i32,
    pub month: u32,
    pub total: Decimal,
    pub days: Vec<DayGroup>,
}

pub type GroupedView = Vec<MonthGroup>;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Aggregate {
    pub balances: Balances,
    pub stats: MonthlyStats,
    pub grouped: GroupedView,
    /// Default filter bounds: oldest and newest visible date.
    pub date_range: Option<(NaiveDate, NaiveDate)>,
}

pub fn balances(transactions: &[Transaction], cutoff: CutoffDay, today: NaiveDate) -> Balances {
    let now = AccountingMonth::of(today, cutoff);
    let mut sorted: Vec<&Transaction> = transactions.iter().collect();
    sorted.sort_by_key(|t| t.date);

    let mut current = Decimal::ZERO;
    let mut future_only = Decimal::ZERO;
    for t in sorted {
        if AccountingMonth::of(t.date, cutoff) > now {
            future_only += t.signed_amount();
        } else {
            current += t.signed_amount();
        }
    }
    Balances {
        current,
        future: current + future_only,
    }
}

pub fn monthly_stats(
    transactions: &[Transaction],
    cutoff: CutoffDay,
    today: NaiveDate,
) -> MonthlyStats {
    let current_month = AccountingMonth::of(today, cutoff);
    let previous_month = current_month.previous();
    let mut stats = MonthlyStats {
        current_month,
        current: MonthTotals::default(),
        previous_month,
        previous: MonthTotals::default(),
    };
    for t in transactions {
        let month = AccountingMonth::of(t.date, cutoff);
        if month == current_month {
            stats.current.add(t);
        } else if month == previous_month {
            stats.previous.add(t);
        }
    }
    stats
}

/// Transactions whose accounting month is shown under `visibility`, order preserved.
pub fn visible(
    transactions: &[Transaction],
    cutoff: CutoffDay,
    today: NaiveDate,
    visibility: Visibility,
) -> Vec<Transaction> {
    let now = AccountingMonth::of(today, cutoff);
    transactions
        .iter()
        .filter(|t| visibility.shows(AccountingMonth::of(t.date, cutoff), now))
        .cloned()
        .collect()
}

/// Bucket by calendar month, then by day. Buckets appear in first-seen order,
/// so a date-descending input yields a date-descending view.
pub fn group_by_month_and_day(transactions: &[Transaction]) -> GroupedView {
    let mut months: GroupedView = Vec::new();

    for t in transactions {
        let (year, month) = (t.date.year(), t.date.month());
        let idx = match months.iter().position(|g| g.year == year && g.month == month) {
            Some(i) => i,
            None => {
                months.push(MonthGroup {
                    label: t.date.format("%B %Y").to_string(),
                    year,
                    month,
                    total: Decimal::ZERO,
                    days: Vec::new(),
                });
                months.len() - 1
            }
        };
        let group = &mut months[idx];
        group.total += t.signed_amount();

        let day_idx = match group.days.iter().position(|d| d.date == t.date) {
            Some(i) => i,
            None => {
                group.days.push(DayGroup {
                    date: t.date,
                    total: Decimal::ZERO,
                    transactions: Vec::new(),
                });
                group.days.len() - 1
            }
        };
        let day = &mut group.days[day_idx];
        day.total += t.signed_amount();
        day.transactions.push(t.clone());
    }

    months
}

pub fn default_date_range(transactions: &[Transaction]) -> Option<(NaiveDate, NaiveDate)> {
    let min = transactions.iter().map(|t| t.date).min()?;
    let max = transactions.iter().map(|t| t.date).max()?;
    Some((min, max))
}

pub fn aggregate(
    transactions: &[Transaction],
    cutoff: CutoffDay,
    today: NaiveDate,
    visibility: Visibility,
) -> Aggregate {
    let shown = visible(transactions, cutoff, today, visibility);
    Aggregate {
        balances: balances(transactions, cutoff, today),
        stats: monthly_stats(transactions, cutoff, today),
        grouped: group_by_month_and_day(&shown),
        date_range: default_date_range(&shown),
    }
}
