// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Per-user transaction storage.
//!
//! The store is the single source of truth. Readers never see a write in
//! progress: every successful write publishes a complete new snapshot to the
//! user's subscribers, and a failed batch publishes nothing.

pub mod sqlite;

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::watch;

use crate::error::StoreError;
use crate::models::{NewTransaction, Transaction, TransactionId, TransactionPatch, UserId};

pub use sqlite::SqliteStore;

/// Full collection of one user's transactions, newest first.
pub type Snapshot = Arc<Vec<Transaction>>;

#[derive(Debug, Clone, PartialEq)]
pub enum BatchOp {
    Create(NewTransaction),
    Delete(TransactionId),
}

#[async_trait]
pub trait TransactionStore: Send + Sync {
    /// Live feed of snapshots. The current snapshot is delivered first.
    async fn subscribe(&self, user: &UserId) -> Result<Subscription, StoreError>;

    async fn create(&self, user: &UserId, tx: &NewTransaction)
    -> Result<TransactionId, StoreError>;

    async fn update(
        &self,
        user: &UserId,
        id: TransactionId,
        patch: &TransactionPatch,
    ) -> Result<(), StoreError>;

    async fn delete(&self, user: &UserId, id: TransactionId) -> Result<(), StoreError>;

    /// All-or-nothing. Returns the ids assigned to the `Create` operations, in order.
    async fn batch_write(
        &self,
        user: &UserId,
        ops: Vec<BatchOp>,
    ) -> Result<Vec<TransactionId>, StoreError>;

    async fn list_all(&self, user: &UserId) -> Result<Snapshot, StoreError>;
}

/// Receiving end of a user's snapshot feed. Dropping it unsubscribes.
pub struct Subscription {
    user: UserId,
    rx: watch::Receiver<Snapshot>,
    primed: bool,
}

impl Subscription {
    pub fn new(user: UserId, rx: watch::Receiver<Snapshot>) -> Self {
        tracing::debug!(user = %user, "subscription acquired");
        Self {
            user,
            rx,
            primed: false,
        }
    }

    pub fn user(&self) -> &UserId {
        &self.user
    }

    /// Next snapshot, or `None` once the store side of the feed is gone.
    /// Cancel safe.
    pub async fn next(&mut self) -> Option<Snapshot> {
        if !self.primed {
            self.primed = true;
            return Some(self.rx.borrow_and_update().clone());
        }
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().clone())
    }

    /// Whether a snapshot newer than the last one returned is waiting.
    pub fn has_update(&self) -> bool {
        !self.primed || self.rx.has_changed().unwrap_or(false)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        tracing::debug!(user = %self.user, "subscription released");
    }
}
