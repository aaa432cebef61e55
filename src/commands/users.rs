// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Result, bail};
use clap::ArgMatches;

use crate::auth::AuthProvider;
use crate::commands::App;
use crate::config;
use crate::models::UserId;

pub fn login(app: &App, m: &ArgMatches) -> Result<()> {
    let id = m
        .get_one::<String>("id")
        .map(|s| s.trim())
        .unwrap_or_default();
    if id.is_empty() {
        bail!("User id must not be empty");
    }
    let user = UserId::new(id);
    app.store
        .with_connection(|conn| config::set_current_user(conn, Some(&user)))?;
    app.auth.sign_in(user.clone());
    println!("Logged in as {}", user);
    Ok(())
}

pub fn logout(app: &App) -> Result<()> {
    app.store
        .with_connection(|conn| config::set_current_user(conn, None))?;
    app.auth.sign_out();
    println!("Logged out");
    Ok(())
}

pub fn whoami(app: &App) -> Result<()> {
    match app.auth.current_user_id() {
        Some(user) => println!("{}", user),
        None => println!("Not logged in"),
    }
    Ok(())
}
