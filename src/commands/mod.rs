// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod settings;
pub mod summary;
pub mod transactions;
pub mod users;
pub mod watch;

use std::sync::Arc;

use anyhow::Result;
use rusqlite::Connection;

use crate::aggregate::Visibility;
use crate::auth::{AuthProvider, LocalAuth};
use crate::config::Settings;
use crate::error::TrackerError;
use crate::session::{Clock, Session, SessionState, SystemClock, ViewSettings};
use crate::store::{SqliteStore, TransactionStore};

/// Everything a command handler needs.
pub struct App {
    pub store: Arc<SqliteStore>,
    pub settings: Settings,
    pub auth: LocalAuth,
    pub clock: Arc<dyn Clock>,
    user_flag: Option<String>,
}

impl App {
    pub fn new(conn: Connection, user_flag: Option<&str>) -> Result<Self> {
        let store = SqliteStore::new(conn)?;
        let settings = store.with_connection(Settings::load)?;
        let auth = LocalAuth::new(settings.resolve_user(user_flag));
        Ok(Self {
            store: Arc::new(store),
            settings,
            auth,
            clock: Arc::new(SystemClock),
            user_flag: user_flag.map(str::to_string),
        })
    }

    /// Re-read the remembered user and follow logins and logouts made by other
    /// processes. `--user` and `CASHMONTH_USER` still take precedence.
    pub fn refresh_auth(&self) -> Result<()> {
        let settings = self.store.with_connection(Settings::load)?;
        let user = settings.resolve_user(self.user_flag.as_deref());
        if user == self.auth.current_user_id() {
            return Ok(());
        }
        match user {
            Some(user) => self.auth.sign_in(user),
            None => self.auth.sign_out(),
        }
        Ok(())
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Open a session for the signed-in user and wait for its first snapshot.
    pub async fn open_session(&self, visibility: Visibility) -> Result<Session> {
        let state = SessionState {
            view: ViewSettings {
                cutoff_day: self.settings.cutoff_day,
                visibility,
            },
            ..SessionState::default()
        };
        let store: Arc<dyn TransactionStore> = self.store.clone();
        let mut session =
            Session::open_for_current_user(&self.auth, store, state, self.clock.clone())
                .await
                .map_err(|e| failure(e, "Could not load transactions"))?;
        session
            .ready()
            .await
            .map_err(|e| failure(e, "Could not load transactions"))?;
        Ok(session)
    }
}

pub fn visibility_from(sub: &clap::ArgMatches) -> Visibility {
    Visibility {
        show_past: sub.get_flag("past"),
        show_future: sub.get_flag("future"),
    }
}

/// Turn a tracker failure into the message shown to the user.
pub fn failure(err: TrackerError, what: &str) -> anyhow::Error {
    tracing::error!(error = %err, "{}", what);
    match err {
        TrackerError::NotSignedIn => {
            anyhow::anyhow!("{}: not logged in (run `cashmonth login <ID>` or pass --user)", what)
        }
        other => anyhow::Error::new(other).context(what.to_string()),
    }
}
