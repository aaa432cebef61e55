// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use clap::ArgMatches;
use serde::Serialize;

use crate::aggregate::{Balances, MonthlyStats};
use crate::calendar::CutoffDay;
use crate::commands::{App, visibility_from};
use crate::models::UserId;
use crate::session::Dashboard;
use crate::utils::{fmt_money, maybe_print_json, pretty_table};

#[derive(Debug, Serialize)]
pub struct SummaryView<'a> {
    pub user: &'a UserId,
    pub cutoff_day: CutoffDay,
    pub balances: Balances,
    pub stats: MonthlyStats,
    pub displayed: usize,
}

impl<'a> SummaryView<'a> {
    pub fn new(user: &'a UserId, dashboard: &Dashboard) -> Self {
        Self {
            user,
            cutoff_day: dashboard.view.cutoff_day,
            balances: dashboard.balances,
            stats: dashboard.stats,
            displayed: dashboard.displayed.len(),
        }
    }
}

pub async fn handle(app: &App, sub: &ArgMatches) -> Result<()> {
    let session = app.open_session(visibility_from(sub)).await?;
    let dashboard = session.dashboard();
    let user = session.user().clone();
    session.close().await;

    let view = SummaryView::new(&user, &dashboard);
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &view)? {
        print_summary(&view);
    }
    Ok(())
}

pub fn print_summary(view: &SummaryView<'_>) {
    let stats = &view.stats;
    let rows = vec![
        vec!["Current balance".into(), fmt_money(&view.balances.current)],
        vec!["Future balance".into(), fmt_money(&view.balances.future)],
        vec![
            format!("Income {}", stats.current_month),
            fmt_money(&stats.current.income),
        ],
        vec![
            format!("Expenses {}", stats.current_month),
            fmt_money(&stats.current.expenses),
        ],
        vec![
            format!("Income {}", stats.previous_month),
            fmt_money(&stats.previous.income),
        ],
        vec![
            format!("Expenses {}", stats.previous_month),
            fmt_money(&stats.previous.expenses),
        ],
    ];
    println!(
        "{} (accounting months start on day {}, {} transactions shown)",
        view.user, view.cutoff_day, view.displayed
    );
    println!("{}", pretty_table(&["", "Amount"], rows));
}
