// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::{Connection, params};
use rust_decimal::Decimal;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use super::{BatchOp, Snapshot, Subscription, TransactionStore};
use crate::db::init_schema;
use crate::error::StoreError;
use crate::models::{
    NewTransaction, Transaction, TransactionId, TransactionPatch, TransactionType, UserId,
};
use crate::recurrence::RecurrenceRule;

/// SQLite-backed store. Rows are partitioned by `user_id`; batches run in one
/// SQLite transaction.
pub struct SqliteStore {
    conn: Mutex<Connection>,
    // Lock order: `feeds` before `conn`.
    feeds: Mutex<HashMap<UserId, watch::Sender<Snapshot>>>,
    /// Last seen `PRAGMA data_version`; moves when another connection commits.
    data_version: AtomicI64,
}

impl SqliteStore {
    pub fn new(conn: Connection) -> Result<Self, StoreError> {
        init_schema(&conn)?;
        let version = data_version(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            feeds: Mutex::new(HashMap::new()),
            data_version: AtomicI64::new(version),
        })
    }

    pub fn open(path: &Path) -> Result<Self, StoreError> {
        Self::new(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::new(Connection::open_in_memory()?)
    }

    /// Run `f` against the underlying connection (settings live in the same file).
    pub fn with_connection<R>(&self, f: impl FnOnce(&Connection) -> R) -> R {
        f(&self.conn())
    }

    /// Live subscriptions for `user`.
    pub fn subscriber_count(&self, user: &UserId) -> usize {
        self.feeds()
            .get(user)
            .map(|tx| tx.receiver_count())
            .unwrap_or(0)
    }

    /// Republish every live feed if another connection wrote to the database
    /// since the last check. Returns whether anything was published.
    pub fn refresh_if_changed(&self) -> Result<bool, StoreError> {
        let version = data_version(&self.conn())?;
        if self.data_version.swap(version, Ordering::SeqCst) == version {
            return Ok(false);
        }
        let users: Vec<UserId> = self.feeds().keys().cloned().collect();
        tracing::debug!(feeds = users.len(), "database changed by another connection");
        for user in &users {
            self.publish(user);
        }
        Ok(!users.is_empty())
    }

    /// Check for writes from other connections every `period` while any feed
    /// has subscribers. Stops once the store is dropped.
    pub fn spawn_change_poller(self: &Arc<Self>, period: Duration) -> JoinHandle<()> {
        let weak: Weak<Self> = Arc::downgrade(self);
        tokio::spawn(async move {
            let mut tick = tokio::time::interval(period);
            tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                tick.tick().await;
                let Some(store) = weak.upgrade() else {
                    break;
                };
                let listening = store.feeds().values().any(|tx| tx.receiver_count() > 0);
                if !listening {
                    continue;
                }
                if let Err(err) = store.refresh_if_changed() {
                    tracing::warn!(error = %err, "could not check for external changes");
                }
            }
        })
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn feeds(&self) -> MutexGuard<'_, HashMap<UserId, watch::Sender<Snapshot>>> {
        self.feeds.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn subscribe_sync(&self, user: &UserId) -> Result<Subscription, StoreError> {
        let mut feeds = self.feeds();
        if let Some(tx) = feeds.get(user) {
            return Ok(Subscription::new(user.clone(), tx.subscribe()));
        }
        let snapshot = load_snapshot(&self.conn(), user)?;
        let (tx, rx) = watch::channel(snapshot);
        feeds.insert(user.clone(), tx);
        Ok(Subscription::new(user.clone(), rx))
    }

    /// Push a fresh snapshot to `user`'s subscribers, dropping the feed if nobody listens.
    fn publish(&self, user: &UserId) {
        let mut feeds = self.feeds();
        let Some(tx) = feeds.get(user) else {
            return;
        };
        if tx.receiver_count() == 0 {
            feeds.remove(user);
            return;
        }
        match load_snapshot(&self.conn(), user) {
            Ok(snapshot) => {
                tracing::trace!(user = %user, len = snapshot.len(), "publishing snapshot");
                tx.send_replace(snapshot);
            }
            Err(err) => tracing::warn!(user = %user, error = %err, "could not publish snapshot"),
        }
    }

    fn batch_sync(&self, user: &UserId, ops: &[BatchOp]) -> Result<Vec<TransactionId>, StoreError> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        let mut ids = Vec::new();
        for op in ops {
            match op {
                BatchOp::Create(t) => ids.push(insert_row(&tx, user, t)?),
                BatchOp::Delete(id) => delete_row(&tx, user, *id)?,
            }
        }
        tx.commit()?;
        Ok(ids)
    }
}

#[async_trait]
impl TransactionStore for SqliteStore {
    async fn subscribe(&self, user: &UserId) -> Result<Subscription, StoreError> {
        self.subscribe_sync(user)
    }

    async fn create(
        &self,
        user: &UserId,
        tx: &NewTransaction,
    ) -> Result<TransactionId, StoreError> {
        let id = insert_row(&self.conn(), user, tx)?;
        tracing::debug!(user = %user, id, "transaction created");
        self.publish(user);
        Ok(id)
    }

    async fn update(
        &self,
        user: &UserId,
        id: TransactionId,
        patch: &TransactionPatch,
    ) -> Result<(), StoreError> {
        update_row(&self.conn(), user, id, patch)?;
        tracing::debug!(user = %user, id, "transaction updated");
        self.publish(user);
        Ok(())
    }

    async fn delete(&self, user: &UserId, id: TransactionId) -> Result<(), StoreError> {
        delete_row(&self.conn(), user, id)?;
        tracing::debug!(user = %user, id, "transaction deleted");
        self.publish(user);
        Ok(())
    }

    async fn batch_write(
        &self,
        user: &UserId,
        ops: Vec<BatchOp>,
    ) -> Result<Vec<TransactionId>, StoreError> {
        match self.batch_sync(user, &ops) {
            Ok(ids) => {
                tracing::info!(user = %user, ops = ops.len(), "batch committed");
                self.publish(user);
                Ok(ids)
            }
            Err(err) => {
                tracing::warn!(user = %user, ops = ops.len(), error = %err, "batch rolled back");
                Err(err)
            }
        }
    }

    async fn list_all(&self, user: &UserId) -> Result<Snapshot, StoreError> {
        load_snapshot(&self.conn(), user)
    }
}

fn check_amount(amount: Decimal) -> Result<(), StoreError> {
    if amount < Decimal::ZERO {
        return Err(StoreError::Rejected(format!("amount {} is negative", amount)));
    }
    Ok(())
}

fn insert_row(
    conn: &Connection,
    user: &UserId,
    t: &NewTransaction,
) -> Result<TransactionId, StoreError> {
    check_amount(t.amount)?;
    let recurring = t
        .recurring
        .as_ref()
        .map(serde_json::to_string)
        .transpose()
        .map_err(|e| StoreError::Rejected(format!("unserializable recurrence: {}", e)))?;
    conn.execute(
        "INSERT INTO transactions(user_id, description, amount, type, date, recurring)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            user.as_str(),
            t.description,
            t.amount.to_string(),
            t.r#type.as_str(),
            t.date,
            recurring
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

fn update_row(
    conn: &Connection,
    user: &UserId,
    id: TransactionId,
    patch: &TransactionPatch,
) -> Result<(), StoreError> {
    if let Some(a) = patch.amount {
        check_amount(a)?;
    }
    let changed = conn.execute(
        "UPDATE transactions SET
            description = COALESCE(?1, description),
            amount = COALESCE(?2, amount),
            type = COALESCE(?3, type),
            date = COALESCE(?4, date),
            updated_at = datetime('now')
         WHERE id = ?5 AND user_id = ?6",
        params![
            patch.description,
            patch.amount.map(|a| a.to_string()),
            patch.r#type.map(|t| t.as_str()),
            patch.date,
            id,
            user.as_str()
        ],
    )?;
    if changed == 0 {
        return Err(StoreError::NotFound(id));
    }
    Ok(())
}

fn delete_row(conn: &Connection, user: &UserId, id: TransactionId) -> Result<(), StoreError> {
    let changed = conn.execute(
        "DELETE FROM transactions WHERE id = ?1 AND user_id = ?2",
        params![id, user.as_str()],
    )?;
    if changed == 0 {
        return Err(StoreError::NotFound(id));
    }
    Ok(())
}

struct RawRow {
    id: TransactionId,
    description: String,
    amount: String,
    r#type: String,
    date: NaiveDate,
    recurring: Option<String>,
    created_at: Option<NaiveDateTime>,
    updated_at: Option<NaiveDateTime>,
}

impl RawRow {
    fn into_transaction(self) -> Result<Transaction, StoreError> {
        let id = self.id;
        let corrupt = move |reason: String| StoreError::Corrupt { id, reason };
        let amount = self
            .amount
            .parse::<Decimal>()
            .map_err(|e| corrupt(format!("amount '{}': {}", self.amount, e)))?;
        let r#type = self.r#type.parse::<TransactionType>().map_err(corrupt)?;
        let recurring = self
            .recurring
            .as_deref()
            .map(serde_json::from_str::<RecurrenceRule>)
            .transpose()
            .map_err(|e| corrupt(format!("recurrence: {}", e)))?;
        Ok(Transaction {
            id: self.id,
            description: self.description,
            amount,
            r#type,
            date: self.date,
            created_at: self.created_at,
            updated_at: self.updated_at,
            recurring,
        })
    }
}

fn data_version(conn: &Connection) -> Result<i64, StoreError> {
    Ok(conn.query_row("PRAGMA data_version", [], |r| r.get(0))?)
}

fn load_snapshot(conn: &Connection, user: &UserId) -> Result<Snapshot, StoreError> {
    let mut stmt = conn.prepare(
        "SELECT id, description, amount, type, date, recurring, created_at, updated_at
         FROM transactions WHERE user_id = ?1
         ORDER BY date DESC, id DESC",
    )?;
    let rows = stmt.query_map(params![user.as_str()], |r| {
        Ok(RawRow {
            id: r.get(0)?,
            description: r.get(1)?,
            amount: r.get(2)?,
            r#type: r.get(3)?,
            date: r.get(4)?,
            recurring: r.get(5)?,
            created_at: r.get(6)?,
            updated_at: r.get(7)?,
        })
    })?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?.into_transaction()?);
    }
    Ok(Arc::new(out))
}
