// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::time::Duration;

use anyhow::Result;
use clap::ArgMatches;
use tokio::sync::watch;
use tokio::time::{Interval, MissedTickBehavior};

use crate::auth::AuthProvider;
use crate::commands::summary::{SummaryView, print_summary};
use crate::aggregate::Visibility;
use crate::commands::{App, failure, visibility_from};
use crate::models::UserId;

/// How often other processes' writes and logins are picked up.
pub const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Print the summary on every change until Ctrl-C or sign-out. A sign-in as
/// someone else reopens the session for the new user.
pub async fn run(app: &App, sub: &ArgMatches) -> Result<()> {
    let mut auth_rx = app.auth.on_auth_change();
    let mut tick = tokio::time::interval(POLL_INTERVAL);
    tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let poller = app.store.spawn_change_poller(POLL_INTERVAL);
    let result = watch_loop(app, visibility_from(sub), &mut auth_rx, &mut tick).await;
    poller.abort();
    result
}

async fn watch_loop(
    app: &App,
    visibility: Visibility,
    auth_rx: &mut watch::Receiver<Option<UserId>>,
    tick: &mut Interval,
) -> Result<()> {
    loop {
        let mut session = app.open_session(visibility).await?;
        print_summary(&SummaryView::new(session.user(), &session.dashboard()));

        let reopen = loop {
            tokio::select! {
                changed = session.changed() => match changed {
                    Ok(dashboard) => {
                        println!();
                        print_summary(&SummaryView::new(session.user(), &dashboard));
                    }
                    Err(err) => {
                        session.close().await;
                        return Err(failure(err, "Transaction feed stopped"));
                    }
                },
                _ = tokio::signal::ctrl_c() => break false,
                _ = tick.tick() => {
                    if let Err(err) = app.refresh_auth() {
                        tracing::warn!(error = %err, "could not re-read the logged-in user");
                    }
                }
                changed = auth_rx.changed() => {
                    if changed.is_err() {
                        break false;
                    }
                    let next = auth_rx.borrow_and_update().clone();
                    match next {
                        Some(user) if &user != session.user() => break true,
                        Some(_) => {}
                        None => break false,
                    }
                }
            }
        };

        tracing::debug!(user = %session.user(), reopen, "watch session ending");
        session.close().await;
        if !reopen {
            return Ok(());
        }
    }
}
