// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use cashmonth::aggregate::{Visibility, aggregate, balances, default_date_range, group_by_month_and_day, monthly_stats, visible};
use cashmonth::calendar::{AccountingMonth, CutoffDay};
use cashmonth::models::{Transaction, TransactionType};
use chrono::NaiveDate;
use rust_decimal::Decimal;

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn tx(id: i64, amount: i64, r#type: TransactionType, date: NaiveDate) -> Transaction {
    Transaction {
        id,
        description: format!("t{}", id),
        amount: Decimal::new(amount, 0),
        r#type,
        date,
        created_at: None,
        updated_at: None,
        recurring: None,
    }
}

fn sample() -> Vec<Transaction> {
    // Newest first, as the store delivers them.
    vec![
        tx(3, 50, TransactionType::Expense, d(2024, 3, 1)),
        tx(2, 200, TransactionType::Expense, d(2024, 1, 10)),
        tx(1, 1000, TransactionType::Income, d(2024, 1, 5)),
    ]
}

#[test]
fn balances_split_current_and_future() {
    let b = balances(&sample(), CutoffDay::new(26).unwrap(), d(2024, 1, 15));
    assert_eq!(b.current, Decimal::new(800, 0));
    assert_eq!(b.future, Decimal::new(750, 0));
}

#[test]
fn cutoff_moves_late_transactions_forward() {
    let txs = vec![
        tx(2, 100, TransactionType::Expense, d(2024, 1, 27)),
        tx(1, 500, TransactionType::Income, d(2024, 1, 2)),
    ];
    let b = balances(&txs, CutoffDay::new(26).unwrap(), d(2024, 1, 15));
    assert_eq!(b.current, Decimal::new(500, 0));
    assert_eq!(b.future, Decimal::new(400, 0));
}

#[test]
fn stats_cover_current_and_previous_months_only() {
    let txs = vec![
        tx(5, 70, TransactionType::Expense, d(2024, 2, 10)),
        tx(4, 300, TransactionType::Income, d(2024, 1, 26)),
        tx(3, 40, TransactionType::Expense, d(2024, 1, 3)),
        tx(2, 25, TransactionType::Expense, d(2023, 12, 27)),
        tx(1, 999, TransactionType::Income, d(2023, 11, 1)),
    ];
    let s = monthly_stats(&txs, CutoffDay::new(26).unwrap(), d(2024, 2, 1));
    assert_eq!(s.current_month, AccountingMonth::new(2024, 2).unwrap());
    assert_eq!(s.current.income, Decimal::new(300, 0));
    assert_eq!(s.current.expenses, Decimal::new(70, 0));
    assert_eq!(s.previous_month, AccountingMonth::new(2024, 1).unwrap());
    assert_eq!(s.previous.income, Decimal::ZERO);
    assert_eq!(s.previous.expenses, Decimal::new(65, 0));
    assert_eq!(s.previous.net(), Decimal::new(-65, 0));
}

#[test]
fn visibility_flags_select_months() {
    let cutoff = CutoffDay::new(26).unwrap();
    let today = d(2024, 1, 15);
    let ids = |v: Visibility| -> Vec<i64> {
        visible(&sample(), cutoff, today, v)
            .iter()
            .map(|t| t.id)
            .collect()
    };
    assert_eq!(ids(Visibility::default()), vec![2, 1]);
    assert_eq!(
        ids(Visibility {
            show_past: false,
            show_future: true
        }),
        vec![3, 2, 1]
    );
}

#[test]
fn grouping_nests_month_then_day() {
    let txs = vec![
        tx(4, 10, TransactionType::Expense, d(2024, 2, 3)),
        tx(3, 5, TransactionType::Expense, d(2024, 1, 20)),
        tx(2, 100, TransactionType::Income, d(2024, 1, 20)),
        tx(1, 30, TransactionType::Expense, d(2024, 1, 2)),
    ];
    let g = group_by_month_and_day(&txs);
    assert_eq!(g.len(), 2);
    assert_eq!(g[0].label, "February 2024");
    assert_eq!(g[1].label, "January 2024");
    assert_eq!(g[1].total, Decimal::new(65, 0));
    assert_eq!(g[1].days.len(), 2);
    assert_eq!(g[1].days[0].date, d(2024, 1, 20));
    assert_eq!(g[1].days[0].total, Decimal::new(95, 0));
    assert_eq!(g[1].days[0].transactions.len(), 2);
}

#[test]
fn date_range_spans_visible_set() {
    let agg = aggregate(
        &sample(),
        CutoffDay::new(26).unwrap(),
        d(2024, 1, 15),
        Visibility::default(),
    );
    assert_eq!(agg.date_range, Some((d(2024, 1, 5), d(2024, 1, 10))));
    assert_eq!(agg.balances.future, Decimal::new(750, 0));
}

#[test]
fn empty_collection() {
    let agg = aggregate(&[], CutoffDay::default(), d(2024, 1, 15), Visibility::default());
    assert_eq!(agg.balances.current, Decimal::ZERO);
    assert_eq!(agg.balances.future, Decimal::ZERO);
    assert!(agg.grouped.is_empty());
    assert_eq!(agg.date_range, None);
    assert_eq!(default_date_range(&[]), None);
}
