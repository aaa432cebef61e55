// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use tokio::sync::watch;

use crate::models::UserId;

/// Who is signed in. Sessions are only ever opened for `current_user_id()`.
pub trait AuthProvider: Send + Sync {
    fn current_user_id(&self) -> Option<UserId>;

    /// Fires on every sign-in and sign-out.
    fn on_auth_change(&self) -> watch::Receiver<Option<UserId>>;
}

/// In-process identity holder; the CLI fills it from configuration.
pub struct LocalAuth {
    tx: watch::Sender<Option<UserId>>,
}

impl LocalAuth {
    pub fn new(user: Option<UserId>) -> Self {
        let (tx, _) = watch::channel(user);
        Self { tx }
    }

    pub fn sign_in(&self, user: UserId) {
        tracing::info!(user = %user, "signed in");
        self.tx.send_replace(Some(user));
    }

    pub fn sign_out(&self) {
        if let Some(user) = self.tx.send_replace(None) {
            tracing::info!(user = %user, "signed out");
        }
    }
}

impl AuthProvider for LocalAuth {
    fn current_user_id(&self) -> Option<UserId> {
        self.tx.borrow().clone()
    }

    fn on_auth_change(&self) -> watch::Receiver<Option<UserId>> {
        self.tx.subscribe()
    }
}
