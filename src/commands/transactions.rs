// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::sync::Arc;

use anyhow::{Result, anyhow, bail};
use chrono::NaiveDate;
use clap::ArgMatches;

use crate::aggregate::{GroupedView, Visibility};
use crate::commands::{App, failure, visibility_from};
use crate::draft::{RecurrenceDraft, TransactionDraft};
use crate::filter::{FilterCriteria, TypeFilter};
use crate::models::TransactionType;
use crate::recurrence::Interval;
use crate::session::{Dashboard, Session, Submitted};
use crate::utils::{fmt_money, fmt_signed, maybe_print_json, parse_date, parse_decimal, pretty_table};

pub async fn handle(app: &App, m: &ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(app, sub).await?,
        Some(("edit", sub)) => edit(app, sub).await?,
        Some(("rm", sub)) => remove(app, sub).await?,
        Some(("clear", sub)) => clear(app, sub).await?,
        Some(("rm-filtered", sub)) => remove_filtered(app, sub).await?,
        Some(("list", sub)) => list(app, sub).await?,
        _ => {}
    }
    Ok(())
}

/// Overwrite the draft fields given on the command line; leave the rest.
pub fn apply_entry_args(draft: &mut TransactionDraft, sub: &ArgMatches) -> Result<()> {
    if let Some(a) = sub.get_one::<String>("amount") {
        draft.amount = Some(parse_decimal(a)?);
    }
    if let Some(t) = sub.get_one::<String>("type") {
        draft.r#type = t.parse::<TransactionType>().map_err(|e| anyhow!(e))?;
    }
    if let Some(d) = sub.get_one::<String>("date") {
        draft.date = Some(parse_date(d)?);
    }
    if let Some(desc) = sub.get_one::<String>("description") {
        draft.description = desc.clone();
    }
    Ok(())
}

/// Recurrence settings of `tx add`; `None` unless `--recurring` is set.
pub fn recurrence_from_args(sub: &ArgMatches) -> Result<Option<RecurrenceDraft>> {
    if !sub.get_flag("recurring") {
        return Ok(None);
    }
    let interval = match sub.get_one::<String>("interval") {
        Some(s) => s.parse::<Interval>().map_err(|e| anyhow!(e))?,
        None => Interval::default(),
    };
    let end_date = sub
        .get_one::<String>("until")
        .map(|s| parse_date(s))
        .transpose()?;
    Ok(Some(RecurrenceDraft {
        interval,
        frequency: sub.get_one::<u32>("every").copied().unwrap_or(1),
        end_date,
        use_last_day_of_month: sub.get_flag("last-day"),
    }))
}

/// Draft for `tx add`. The date defaults to `today`.
pub fn draft_from_args(sub: &ArgMatches, today: NaiveDate) -> Result<TransactionDraft> {
    let mut draft = TransactionDraft {
        date: Some(today),
        ..TransactionDraft::default()
    };
    apply_entry_args(&mut draft, sub)?;
    draft.recurrence = recurrence_from_args(sub)?;
    Ok(draft)
}

/// Criteria from filter flags, starting from `base` (the automatic date bounds).
pub fn criteria_from_args(sub: &ArgMatches, base: &FilterCriteria) -> Result<FilterCriteria> {
    let mut c = base.clone();
    if let Some(s) = sub.get_one::<String>("from") {
        c.start_date = Some(parse_date(s)?);
    }
    if let Some(s) = sub.get_one::<String>("to") {
        c.end_date = Some(parse_date(s)?);
    }
    if let Some(s) = sub.get_one::<String>("type") {
        c.r#type = s.parse::<TypeFilter>().map_err(|e| anyhow!(e))?;
    }
    if let Some(s) = sub.get_one::<String>("min") {
        c.min_amount = Some(parse_decimal(s)?);
    }
    if let Some(s) = sub.get_one::<String>("max") {
        c.max_amount = Some(parse_decimal(s)?);
    }
    if let Some(s) = sub.get_one::<String>("search") {
        c.query = Some(s.clone()).filter(|q| !q.trim().is_empty());
    }
    Ok(c)
}

async fn add(app: &App, sub: &ArgMatches) -> Result<()> {
    let draft = draft_from_args(sub, app.clock.today())?;
    let mut session = app.open_session(Visibility::default()).await?;
    *session.draft_mut() = draft;
    let result = session.submit().await;
    session.close().await;
    match result.map_err(|e| failure(e, "Could not add transaction"))? {
        Submitted::Created(ids) if ids.len() == 1 => println!("Added transaction {}", ids[0]),
        Submitted::Created(ids) => println!("Added {} recurring transactions", ids.len()),
        Submitted::Updated(id) => println!("Updated transaction {}", id),
    }
    Ok(())
}

async fn edit(app: &App, sub: &ArgMatches) -> Result<()> {
    let id = *sub
        .get_one::<i64>("id")
        .ok_or_else(|| anyhow!("--id is required"))?;
    let mut session = app.open_session(Visibility::default()).await?;
    let result = async {
        session
            .edit(id)
            .map_err(|e| failure(e, "Could not edit transaction"))?;
        apply_entry_args(session.draft_mut(), sub)?;
        session
            .submit()
            .await
            .map_err(|e| failure(e, "Could not update transaction"))?;
        Ok::<_, anyhow::Error>(())
    }
    .await;
    session.close().await;
    result?;
    println!("Updated transaction {}", id);
    Ok(())
}

async fn remove(app: &App, sub: &ArgMatches) -> Result<()> {
    let id = *sub
        .get_one::<i64>("id")
        .ok_or_else(|| anyhow!("--id is required"))?;
    let mut session = app.open_session(Visibility::default()).await?;
    let result = session.delete(id).await;
    session.close().await;
    result.map_err(|e| failure(e, "Could not delete transaction"))?;
    println!("Deleted transaction {}", id);
    Ok(())
}

async fn clear(app: &App, sub: &ArgMatches) -> Result<()> {
    if !sub.get_flag("yes") {
        bail!("Refusing to delete every transaction without --yes");
    }
    let mut session = app.open_session(Visibility::default()).await?;
    let result = session.delete_all().await;
    session.close().await;
    let n = result.map_err(|e| failure(e, "Could not delete transactions"))?;
    println!("Deleted {} transactions", n);
    Ok(())
}

async fn remove_filtered(app: &App, sub: &ArgMatches) -> Result<()> {
    if !sub.get_flag("yes") {
        bail!("Refusing to delete without --yes; run `tx list` with the same filters to preview");
    }
    let (mut session, _) = filtered_session(app, sub).await?;
    let result = session.delete_filtered().await;
    session.close().await;
    let n = result.map_err(|e| failure(e, "Could not delete transactions"))?;
    println!("Deleted {} transactions", n);
    Ok(())
}

async fn list(app: &App, sub: &ArgMatches) -> Result<()> {
    let (session, dashboard) = filtered_session(app, sub).await?;
    session.close().await;

    let printed = if sub.get_flag("jsonl") {
        maybe_print_json(false, true, &dashboard.displayed)?
    } else {
        maybe_print_json(sub.get_flag("json"), false, &dashboard.grouped)?
    };
    if !printed {
        print_grouped(&dashboard.grouped);
    }
    Ok(())
}

/// Session whose dashboard reflects the filter flags of `sub`.
async fn filtered_session(app: &App, sub: &ArgMatches) -> Result<(Session, Arc<Dashboard>)> {
    let mut session = app.open_session(visibility_from(sub)).await?;
    let wanted = criteria_from_args(sub, &session.dashboard().filters)?;
    session.update_filters(|f| *f = wanted.clone());
    let dashboard = session
        .wait_for(|d| d.filters == wanted)
        .await
        .map_err(|e| failure(e, "Could not apply filters"))?;
    Ok((session, dashboard))
}

pub fn print_grouped(grouped: &GroupedView) {
    if grouped.is_empty() {
        println!("No transactions");
        return;
    }
    for month in grouped {
        println!("{}  (net {})", month.label, fmt_money(&month.total));
        let mut rows = Vec::new();
        for day in &month.days {
            for (i, t) in day.transactions.iter().enumerate() {
                rows.push(vec![
                    t.date.to_string(),
                    t.id.to_string(),
                    t.description.clone(),
                    t.r#type.to_string(),
                    fmt_signed(t),
                    if i == 0 { fmt_money(&day.total) } else { String::new() },
                ]);
            }
        }
        println!(
            "{}",
            pretty_table(&["Date", "ID", "Description", "Type", "Amount", "Day total"], rows)
        );
    }
}
