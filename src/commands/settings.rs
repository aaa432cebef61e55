// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use clap::ArgMatches;

use crate::calendar::CutoffDay;
use crate::commands::App;
use crate::config;

pub fn handle(app: &App, m: &ArgMatches) -> Result<()> {
    if let Some(("cutoff-day", sub)) = m.subcommand() {
        cutoff_day(app, sub)?;
    }
    Ok(())
}

fn cutoff_day(app: &App, sub: &ArgMatches) -> Result<()> {
    match sub.get_one::<u32>("day") {
        Some(&day) => {
            let day = CutoffDay::new(day)?;
            app.store
                .with_connection(|conn| config::set_cutoff_day(conn, day))?;
            tracing::info!(cutoff_day = day.get(), "cutoff day changed");
            println!("Accounting months now start on day {}", day);
        }
        None => println!("{}", app.settings.cutoff_day),
    }
    Ok(())
}
