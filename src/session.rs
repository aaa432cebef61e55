// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! A signed-in user's view of their transactions.
//!
//! A [`Session`] owns the user-facing state (cutoff day, visibility toggles,
//! filters, the transaction form) and a single worker task. The worker pulls
//! snapshots from the store subscription, recomputes balances, statistics and
//! grouping in full, and publishes an immutable [`Dashboard`]. Closing or
//! dropping the session stops the worker, which releases the subscription.

use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::aggregate::{
    Balances, GroupedView, MonthlyStats, Visibility, balances, default_date_range,
    group_by_month_and_day, monthly_stats, visible,
};
use crate::auth::AuthProvider;
use crate::calendar::CutoffDay;
use crate::draft::TransactionDraft;
use crate::error::{StoreError, TrackerError, ValidationError};
use crate::filter::{FilterCriteria, filter};
use crate::models::{Transaction, TransactionId, TransactionPatch, UserId};
use crate::store::{BatchOp, Snapshot, Subscription, TransactionStore};

pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

/// Local calendar date of the machine.
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        chrono::Local::now().date_naive()
    }
}

pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ViewSettings {
    pub cutoff_day: CutoffDay,
    pub visibility: Visibility,
}

#[derive(Debug, Clone, Default)]
pub struct SessionState {
    pub view: ViewSettings,
    pub filters: FilterCriteria,
    pub draft: TransactionDraft,
}

/// What the worker needs besides snapshots.
#[derive(Debug, Clone, PartialEq)]
struct Controls {
    view: ViewSettings,
    filters: FilterCriteria,
    /// Bumped to force the date bounds back to the visible range.
    range_epoch: u64,
    /// Bumped on every push; echoed back in `Dashboard::controls_seq`.
    seq: u64,
}

/// Derived state for one snapshot under one set of controls.
#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    /// 0 until the first snapshot has arrived.
    pub revision: u64,
    /// Controls push this dashboard was computed under.
    #[serde(skip)]
    pub controls_seq: u64,
    pub view: ViewSettings,
    #[serde(skip)]
    pub transactions: Snapshot,
    pub balances: Balances,
    pub stats: MonthlyStats,
    /// Effective criteria, including the automatic date bounds.
    pub filters: FilterCriteria,
    /// Matches for `filters` across every accounting month.
    #[serde(skip)]
    pub filtered: Vec<Transaction>,
    /// `filtered` restricted to the visible accounting months.
    pub displayed: Vec<Transaction>,
    pub grouped: GroupedView,
}

impl Dashboard {
    fn compute(snapshot: Snapshot, controls: &Controls, today: NaiveDate, revision: u64) -> Self {
        let cutoff = controls.view.cutoff_day;
        let filtered = filter(&snapshot, &controls.filters);
        let displayed = visible(&filtered, cutoff, today, controls.view.visibility);
        Self {
            revision,
            controls_seq: controls.seq,
            view: controls.view,
            balances: balances(&snapshot, cutoff, today),
            stats: monthly_stats(&snapshot, cutoff, today),
            filters: controls.filters.clone(),
            grouped: group_by_month_and_day(&displayed),
            displayed,
            filtered,
            transactions: snapshot,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submitted {
    Created(Vec<TransactionId>),
    Updated(TransactionId),
}

pub struct Session {
    store: Arc<dyn TransactionStore>,
    user: UserId,
    state: SessionState,
    range_epoch: u64,
    controls_seq: u64,
    controls: watch::Sender<Controls>,
    dashboard: watch::Receiver<Arc<Dashboard>>,
    worker: Option<JoinHandle<()>>,
}

impl Session {
    pub async fn open(
        store: Arc<dyn TransactionStore>,
        user: UserId,
        state: SessionState,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, TrackerError> {
        let feed = store.subscribe(&user).await?;
        let controls = Controls {
            view: state.view,
            filters: state.filters.clone(),
            range_epoch: 0,
            seq: 0,
        };
        let loading = Dashboard::compute(Arc::default(), &controls, clock.today(), 0);
        let (controls_tx, controls_rx) = watch::channel(controls);
        let (out_tx, out_rx) = watch::channel(Arc::new(loading));
        let worker = tokio::spawn(run_pipeline(feed, controls_rx, out_tx, clock));
        tracing::debug!(user = %user, "session opened");
        Ok(Self {
            store,
            user,
            state,
            range_epoch: 0,
            controls_seq: 0,
            controls: controls_tx,
            dashboard: out_rx,
            worker: Some(worker),
        })
    }

    pub async fn open_for_current_user(
        auth: &dyn AuthProvider,
        store: Arc<dyn TransactionStore>,
        state: SessionState,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, TrackerError> {
        let user = auth.current_user_id().ok_or(TrackerError::NotSignedIn)?;
        Self::open(store, user, state, clock).await
    }

    pub fn user(&self) -> &UserId {
        &self.user
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn draft_mut(&mut self) -> &mut TransactionDraft {
        &mut self.state.draft
    }

    /// Latest published dashboard; may still be the loading placeholder.
    pub fn dashboard(&self) -> Arc<Dashboard> {
        self.dashboard.borrow().clone()
    }

    /// Wait for the first snapshot to be processed.
    pub async fn ready(&mut self) -> Result<Arc<Dashboard>, TrackerError> {
        self.wait_for(|d| d.revision > 0).await
    }

    pub async fn wait_for(
        &mut self,
        mut pred: impl FnMut(&Dashboard) -> bool,
    ) -> Result<Arc<Dashboard>, TrackerError> {
        let found = self
            .dashboard
            .wait_for(|d| pred(d))
            .await
            .map_err(|_| StoreError::Closed)?;
        Ok(Arc::clone(&found))
    }

    /// Wait until the dashboard reflects every control change made so far.
    pub async fn settled(&mut self) -> Result<Arc<Dashboard>, TrackerError> {
        let seq = self.controls_seq;
        self.wait_for(|d| d.revision > 0 && d.controls_seq == seq)
            .await
    }

    /// Wait for the next published dashboard.
    pub async fn changed(&mut self) -> Result<Arc<Dashboard>, TrackerError> {
        self.dashboard
            .changed()
            .await
            .map_err(|_| StoreError::Closed)?;
        Ok(self.dashboard.borrow_and_update().clone())
    }

    /// Write the draft: update when editing, one batch when recurring, one
    /// create otherwise. The draft survives a failed write untouched.
    pub async fn submit(&mut self) -> Result<Submitted, TrackerError> {
        let draft = &self.state.draft;
        let new = draft.validate()?;
        let recurring = draft.editing.is_none() && draft.recurrence.is_some();

        let outcome = if let Some(id) = draft.editing {
            self.store
                .update(&self.user, id, &TransactionPatch::from(&new))
                .await?;
            Submitted::Updated(id)
        } else if let Some(rule) = draft.rule(new.date) {
            let rule = rule?;
            let ops: Vec<BatchOp> = rule
                .materialize(&new)
                .into_iter()
                .map(BatchOp::Create)
                .collect();
            tracing::debug!(user = %self.user, count = ops.len(), "expanding recurring transaction");
            Submitted::Created(self.store.batch_write(&self.user, ops).await?)
        } else {
            Submitted::Created(vec![self.store.create(&self.user, &new).await?])
        };

        self.state.draft = TransactionDraft::default();
        if recurring {
            self.state.filters = FilterCriteria::default();
            self.range_epoch += 1;
            self.push_controls();
        }
        Ok(outcome)
    }

    /// Load an existing transaction into the draft.
    pub fn edit(&mut self, id: TransactionId) -> Result<(), TrackerError> {
        let dashboard = self.dashboard();
        let t = dashboard
            .transactions
            .iter()
            .find(|t| t.id == id)
            .ok_or(StoreError::NotFound(id))?;
        self.state.draft = TransactionDraft::from_transaction(t);
        Ok(())
    }

    pub async fn delete(&mut self, id: TransactionId) -> Result<(), TrackerError> {
        self.store.delete(&self.user, id).await?;
        Ok(())
    }

    /// Delete every transaction of the user in one batch. Returns the count.
    pub async fn delete_all(&mut self) -> Result<usize, TrackerError> {
        let all = self.store.list_all(&self.user).await?;
        if all.is_empty() {
            return Ok(0);
        }
        let ops: Vec<BatchOp> = all.iter().map(|t| BatchOp::Delete(t.id)).collect();
        self.store.batch_write(&self.user, ops).await?;
        Ok(all.len())
    }

    /// Delete exactly the displayed transactions in one batch. Pending
    /// filter and view changes are applied first.
    pub async fn delete_filtered(&mut self) -> Result<usize, TrackerError> {
        let dashboard = self.settled().await?;
        if dashboard.displayed.is_empty() {
            return Err(ValidationError::NothingSelected.into());
        }
        let ops: Vec<BatchOp> = dashboard
            .displayed
            .iter()
            .map(|t| BatchOp::Delete(t.id))
            .collect();
        self.store.batch_write(&self.user, ops).await?;
        Ok(dashboard.displayed.len())
    }

    pub fn set_cutoff_day(&mut self, day: u32) -> Result<(), ValidationError> {
        self.state.view.cutoff_day = CutoffDay::new(day)?;
        self.push_controls();
        Ok(())
    }

    pub fn set_show_past(&mut self, show: bool) {
        self.state.view.visibility.show_past = show;
        self.push_controls();
    }

    pub fn set_show_future(&mut self, show: bool) {
        self.state.view.visibility.show_future = show;
        self.push_controls();
    }

    /// Edit the effective criteria (including the automatic date bounds).
    pub fn update_filters(&mut self, f: impl FnOnce(&mut FilterCriteria)) {
        let dashboard = self.dashboard();
        let mut filters = if dashboard.controls_seq == self.controls_seq {
            dashboard.filters.clone()
        } else {
            self.state.filters.clone()
        };
        f(&mut filters);
        self.state.filters = filters;
        self.push_controls();
    }

    /// Clear every criterion; date bounds span the whole collection.
    pub fn reset_filters(&mut self) {
        let dashboard = self.dashboard();
        let range = default_date_range(&dashboard.transactions);
        self.state.filters = FilterCriteria {
            start_date: range.map(|r| r.0),
            end_date: range.map(|r| r.1),
            ..FilterCriteria::default()
        };
        self.push_controls();
    }

    fn push_controls(&mut self) {
        self.controls_seq += 1;
        self.controls.send_replace(Controls {
            view: self.state.view,
            filters: self.state.filters.clone(),
            range_epoch: self.range_epoch,
            seq: self.controls_seq,
        });
    }

    /// Stop the worker and release the subscription before returning.
    pub async fn close(mut self) {
        if let Some(worker) = self.worker.take() {
            worker.abort();
            if let Err(err) = worker.await {
                if err.is_panic() {
                    tracing::error!(user = %self.user, "session worker panicked");
                }
            }
        }
        tracing::debug!(user = %self.user, "session closed");
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if let Some(worker) = self.worker.take() {
            worker.abort();
        }
    }
}

async fn run_pipeline(
    mut feed: Subscription,
    mut controls_rx: watch::Receiver<Controls>,
    out: watch::Sender<Arc<Dashboard>>,
    clock: Arc<dyn Clock>,
) {
    let mut controls = controls_rx.borrow_and_update().clone();
    let mut snapshot: Option<Snapshot> = None;
    let mut revision = 0u64;

    loop {
        let reset_range = tokio::select! {
            next = feed.next() => match next {
                Some(s) => {
                    snapshot = Some(s);
                    true
                }
                None => {
                    tracing::debug!(user = %feed.user(), "snapshot feed closed");
                    break;
                }
            },
            changed = controls_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let next = controls_rx.borrow_and_update().clone();
                let reset = next.view != controls.view || next.range_epoch != controls.range_epoch;
                controls = next;
                reset
            }
        };

        let Some(current) = snapshot.clone() else {
            continue;
        };
        let today = clock.today();
        if reset_range {
            let shown = visible(
                &current,
                controls.view.cutoff_day,
                today,
                controls.view.visibility,
            );
            let range = default_date_range(&shown);
            controls.filters.start_date = range.map(|r| r.0);
            controls.filters.end_date = range.map(|r| r.1);
        }
        revision += 1;
        let dashboard = Dashboard::compute(current, &controls, today, revision);
        tracing::trace!(
            user = %feed.user(),
            revision,
            displayed = dashboard.displayed.len(),
            "dashboard recomputed"
        );
        out.send_replace(Arc::new(dashboard));
    }
}
