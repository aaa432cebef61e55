// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::env;

use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension, params};

use crate::calendar::CutoffDay;
use crate::models::UserId;

pub const USER_ENV: &str = "CASHMONTH_USER";

const CUTOFF_DAY_KEY: &str = "cutoff_day";
const CURRENT_USER_KEY: &str = "current_user";

/// Settings persisted next to the transactions.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub cutoff_day: CutoffDay,
    pub current_user: Option<UserId>,
}

impl Settings {
    pub fn load(conn: &Connection) -> Result<Self> {
        let cutoff_day = match get_setting(conn, CUTOFF_DAY_KEY)? {
            Some(v) => {
                let day = v
                    .trim()
                    .parse::<u32>()
                    .with_context(|| format!("Invalid stored cutoff day '{}'", v))?;
                CutoffDay::new(day)?
            }
            None => CutoffDay::default(),
        };
        let current_user = get_setting(conn, CURRENT_USER_KEY)?
            .filter(|u| !u.trim().is_empty())
            .map(UserId::new);
        Ok(Self {
            cutoff_day,
            current_user,
        })
    }

    /// `--user` flag, then `CASHMONTH_USER`, then the persisted login.
    pub fn resolve_user(&self, flag: Option<&str>) -> Option<UserId> {
        flag.map(str::to_string)
            .or_else(|| env::var(USER_ENV).ok())
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty())
            .map(UserId::new)
            .or_else(|| self.current_user.clone())
    }
}

pub fn get_setting(conn: &Connection, key: &str) -> Result<Option<String>> {
    let v: Option<String> = conn
        .query_row(
            "SELECT value FROM settings WHERE key=?1",
            params![key],
            |r| r.get(0),
        )
        .optional()?;
    Ok(v)
}

pub fn set_setting(conn: &Connection, key: &str, value: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO settings(key, value) VALUES(?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
        params![key, value],
    )?;
    Ok(())
}

pub fn clear_setting(conn: &Connection, key: &str) -> Result<()> {
    conn.execute("DELETE FROM settings WHERE key=?1", params![key])?;
    Ok(())
}

pub fn set_cutoff_day(conn: &Connection, day: CutoffDay) -> Result<()> {
    set_setting(conn, CUTOFF_DAY_KEY, &day.to_string())
}

pub fn set_current_user(conn: &Connection, user: Option<&UserId>) -> Result<()> {
    match user {
        Some(u) => set_setting(conn, CURRENT_USER_KEY, u.as_str()),
        None => clear_setting(conn, CURRENT_USER_KEY),
    }
}
