// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::sync::Arc;

use async_trait::async_trait;
use cashmonth::aggregate::Visibility;
use cashmonth::auth::LocalAuth;
use cashmonth::draft::{RecurrenceDraft, TransactionDraft};
use cashmonth::error::{StoreError, TrackerError, ValidationError};
use cashmonth::models::{
    DEFAULT_DESCRIPTION, NewTransaction, TransactionId, TransactionPatch, TransactionType, UserId,
};
use cashmonth::recurrence::Interval;
use cashmonth::session::{FixedClock, Session, SessionState, Submitted, ViewSettings};
use cashmonth::store::{BatchOp, Snapshot, SqliteStore, Subscription, TransactionStore};
use chrono::NaiveDate;
use rust_decimal::Decimal;

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn dec(n: i64) -> Decimal {
    Decimal::new(n, 0)
}

fn alice() -> UserId {
    UserId::new("alice")
}

fn today() -> NaiveDate {
    d(2024, 1, 15)
}

async fn seed(store: &SqliteStore, desc: &str, amount: i64, r#type: TransactionType, date: NaiveDate) -> TransactionId {
    store
        .create(
            &alice(),
            &NewTransaction {
                description: desc.to_string(),
                amount: dec(amount),
                r#type,
                date,
                recurring: None,
            },
        )
        .await
        .unwrap()
}

async fn open_with(store: Arc<dyn TransactionStore>, visibility: Visibility) -> Session {
    let state = SessionState {
        view: ViewSettings {
            visibility,
            ..ViewSettings::default()
        },
        ..SessionState::default()
    };
    let mut session = Session::open(store, alice(), state, Arc::new(FixedClock(today())))
        .await
        .unwrap();
    session.ready().await.unwrap();
    session
}

async fn open(store: &Arc<SqliteStore>) -> Session {
    open_with(store.clone(), Visibility::default()).await
}

/// Reads work, every write is refused.
struct ReadOnly(SqliteStore);

#[async_trait]
impl TransactionStore for ReadOnly {
    async fn subscribe(&self, user: &UserId) -> Result<Subscription, StoreError> {
        self.0.subscribe(user).await
    }

    async fn create(&self, _: &UserId, _: &NewTransaction) -> Result<TransactionId, StoreError> {
        Err(StoreError::Rejected("read only".into()))
    }

    async fn update(&self, _: &UserId, _: TransactionId, _: &TransactionPatch) -> Result<(), StoreError> {
        Err(StoreError::Rejected("read only".into()))
    }

    async fn delete(&self, _: &UserId, _: TransactionId) -> Result<(), StoreError> {
        Err(StoreError::Rejected("read only".into()))
    }

    async fn batch_write(&self, _: &UserId, _: Vec<BatchOp>) -> Result<Vec<TransactionId>, StoreError> {
        Err(StoreError::Rejected("read only".into()))
    }

    async fn list_all(&self, user: &UserId) -> Result<Snapshot, StoreError> {
        self.0.list_all(user).await
    }
}

#[tokio::test]
async fn submit_creates_and_clears_draft() {
    let store = Arc::new(SqliteStore::open_in_memory().unwrap());
    let mut session = open(&store).await;

    let draft = session.draft_mut();
    draft.amount = Some(dec(100));
    draft.r#type = TransactionType::Income;
    draft.date = Some(d(2024, 1, 10));
    let out = session.submit().await.unwrap();
    assert!(matches!(out, Submitted::Created(ref ids) if ids.len() == 1));
    assert_eq!(session.state().draft, TransactionDraft::default());

    let dash = session.wait_for(|d| d.transactions.len() == 1).await.unwrap();
    assert_eq!(dash.balances.current, dec(100));
    assert_eq!(dash.stats.current.income, dec(100));
    assert_eq!(dash.displayed[0].description, DEFAULT_DESCRIPTION);
    assert_eq!(dash.filters.start_date, Some(d(2024, 1, 10)));
    assert_eq!(dash.filters.end_date, Some(d(2024, 1, 10)));
    session.close().await;
}

#[tokio::test]
async fn invalid_draft_never_reaches_store() {
    let store = Arc::new(SqliteStore::open_in_memory().unwrap());
    let mut session = open(&store).await;

    session.draft_mut().date = Some(d(2024, 1, 10));
    let err = session.submit().await.unwrap_err();
    assert!(matches!(err, TrackerError::Validation(ValidationError::MissingAmount)));

    session.draft_mut().amount = Some(dec(5));
    session.draft_mut().date = None;
    let err = session.submit().await.unwrap_err();
    assert!(matches!(err, TrackerError::Validation(ValidationError::MissingDate)));

    session.draft_mut().date = Some(d(2024, 1, 10));
    session.draft_mut().recurrence = Some(RecurrenceDraft {
        frequency: 0,
        ..RecurrenceDraft::default()
    });
    let err = session.submit().await.unwrap_err();
    assert!(matches!(err, TrackerError::Recurrence(_)));
    assert_eq!(session.state().draft.amount, Some(dec(5)));

    assert!(store.list_all(&alice()).await.unwrap().is_empty());
    session.close().await;
}

#[tokio::test]
async fn failed_write_keeps_draft() {
    let store = Arc::new(ReadOnly(SqliteStore::open_in_memory().unwrap()));
    let mut session = open_with(store, Visibility::default()).await;

    session.draft_mut().amount = Some(dec(12));
    session.draft_mut().date = Some(d(2024, 1, 3));
    session.draft_mut().description = "Lunch".into();
    let err = session.submit().await.unwrap_err();
    assert!(matches!(err, TrackerError::Store(StoreError::Rejected(_))));
    assert_eq!(session.state().draft.description, "Lunch");
    assert_eq!(session.state().draft.amount, Some(dec(12)));
    assert!(session.dashboard().transactions.is_empty());
    session.close().await;
}

#[tokio::test]
async fn recurring_submit_writes_one_batch() {
    let store = Arc::new(SqliteStore::open_in_memory().unwrap());
    let visibility = Visibility {
        show_past: false,
        show_future: true,
    };
    let mut session = open_with(store.clone(), visibility).await;
    session.update_filters(|f| f.query = Some("rent".into()));

    let draft = session.draft_mut();
    draft.description = "Rent".into();
    draft.amount = Some(dec(50));
    draft.date = Some(d(2024, 1, 31));
    draft.recurrence = Some(RecurrenceDraft {
        interval: Interval::Month,
        frequency: 1,
        end_date: None,
        use_last_day_of_month: true,
    });
    let out = session.submit().await.unwrap();
    let Submitted::Created(ids) = out else {
        panic!("expected created ids");
    };
    assert_eq!(ids.len(), 13);

    let dash = session
        .wait_for(|d| d.transactions.len() == 13 && d.filters.query.is_none())
        .await
        .unwrap();
    assert!(dash.transactions.iter().any(|t| t.date == d(2024, 2, 29)));
    assert_eq!(dash.balances.current, Decimal::ZERO);
    assert_eq!(dash.balances.future, dec(-650));
    assert_eq!(dash.displayed.len(), 13);
    assert_eq!(dash.filters.start_date, Some(d(2024, 1, 31)));
    assert_eq!(dash.filters.end_date, Some(d(2025, 1, 31)));
    session.close().await;
}

#[tokio::test]
async fn edit_updates_in_place() {
    let store = Arc::new(SqliteStore::open_in_memory().unwrap());
    let id = seed(&store, "Coffee", 4, TransactionType::Expense, d(2024, 1, 2)).await;
    let mut session = open(&store).await;

    session.edit(id).unwrap();
    assert_eq!(session.state().draft.editing, Some(id));
    session.draft_mut().amount = Some(dec(6));
    assert_eq!(session.submit().await.unwrap(), Submitted::Updated(id));

    let dash = session
        .wait_for(|d| d.transactions.first().is_some_and(|t| t.amount == dec(6)))
        .await
        .unwrap();
    assert_eq!(dash.transactions.len(), 1);
    assert_eq!(dash.transactions[0].description, "Coffee");

    assert!(matches!(
        session.edit(id + 100),
        Err(TrackerError::Store(StoreError::NotFound(_)))
    ));
    session.close().await;
}

#[tokio::test]
async fn delete_all_empties_everything() {
    let store = Arc::new(SqliteStore::open_in_memory().unwrap());
    seed(&store, "a", 10, TransactionType::Income, d(2023, 11, 1)).await;
    seed(&store, "b", 20, TransactionType::Expense, d(2024, 1, 5)).await;
    seed(&store, "c", 30, TransactionType::Expense, d(2024, 6, 1)).await;
    let mut session = open(&store).await;
    assert_eq!(session.dashboard().transactions.len(), 3);

    assert_eq!(session.delete_all().await.unwrap(), 3);
    let dash = session.wait_for(|d| d.transactions.is_empty()).await.unwrap();
    assert_eq!(dash.balances.current, Decimal::ZERO);
    assert_eq!(dash.balances.future, Decimal::ZERO);
    assert_eq!(dash.filters.start_date, None);
    assert_eq!(dash.filters.end_date, None);
    assert!(dash.grouped.is_empty());

    assert_eq!(session.delete_all().await.unwrap(), 0);
    session.close().await;
}

#[tokio::test]
async fn delete_filtered_removes_only_displayed() {
    let store = Arc::new(SqliteStore::open_in_memory().unwrap());
    seed(&store, "Salary", 2000, TransactionType::Income, d(2024, 1, 5)).await;
    seed(&store, "Coffee", 4, TransactionType::Expense, d(2024, 1, 12)).await;
    seed(&store, "Coffee beans", 15, TransactionType::Expense, d(2023, 12, 2)).await;
    let mut session = open(&store).await;

    session.update_filters(|f| {
        f.query = Some("coffee".into());
        f.start_date = None;
        f.end_date = None;
    });
    let dash = session
        .wait_for(|d| d.filters.query.is_some())
        .await
        .unwrap();
    // The December purchase matches but its accounting month is hidden.
    assert_eq!(dash.filtered.len(), 2);
    assert_eq!(dash.displayed.len(), 1);

    assert_eq!(session.delete_filtered().await.unwrap(), 1);
    let dash = session.wait_for(|d| d.transactions.len() == 2).await.unwrap();
    assert!(dash.displayed.is_empty());
    assert!(dash.transactions.iter().any(|t| t.description == "Coffee beans"));

    assert!(matches!(
        session.delete_filtered().await,
        Err(TrackerError::Validation(ValidationError::NothingSelected))
    ));
    session.close().await;
}

#[tokio::test]
async fn delete_filtered_applies_pending_changes_first() {
    let store = Arc::new(SqliteStore::open_in_memory().unwrap());
    seed(&store, "Salary", 2000, TransactionType::Income, d(2024, 1, 5)).await;
    seed(&store, "Coffee", 4, TransactionType::Expense, d(2024, 1, 12)).await;
    seed(&store, "Coffee beans", 15, TransactionType::Expense, d(2023, 12, 2)).await;
    let mut session = open(&store).await;

    // No wait between the filter change and the delete.
    session.update_filters(|f| f.query = Some("coffee".into()));
    assert_eq!(session.delete_filtered().await.unwrap(), 1);
    let left: Vec<String> = store
        .list_all(&alice())
        .await
        .unwrap()
        .iter()
        .map(|t| t.description.clone())
        .collect();
    assert_eq!(left, vec!["Salary", "Coffee beans"]);

    session.set_show_past(true);
    session.update_filters(|f| {
        f.query = Some("beans".into());
        f.start_date = None;
    });
    assert_eq!(session.delete_filtered().await.unwrap(), 1);
    let left = store.list_all(&alice()).await.unwrap();
    assert_eq!(left.len(), 1);
    assert_eq!(left[0].description, "Salary");
    session.close().await;
}

#[tokio::test]
async fn view_changes_reset_date_range() {
    let store = Arc::new(SqliteStore::open_in_memory().unwrap());
    seed(&store, "Old", 10, TransactionType::Expense, d(2023, 12, 1)).await;
    seed(&store, "Now", 50, TransactionType::Income, d(2024, 1, 10)).await;
    seed(&store, "Late", 5, TransactionType::Expense, d(2024, 1, 27)).await;
    let mut session = open(&store).await;

    let dash = session.dashboard();
    assert_eq!(dash.displayed.len(), 1);
    assert_eq!(dash.filters.start_date, Some(d(2024, 1, 10)));

    session.set_show_past(true);
    let dash = session.wait_for(|d| d.view.visibility.show_past).await.unwrap();
    assert_eq!(dash.displayed.len(), 2);
    assert_eq!(dash.filters.start_date, Some(d(2023, 12, 1)));
    assert_eq!(dash.filters.end_date, Some(d(2024, 1, 10)));

    // Moving the cutoff past the 27th pulls the late expense into January.
    session.set_cutoff_day(28).unwrap();
    let dash = session
        .wait_for(|d| d.view.cutoff_day.get() == 28)
        .await
        .unwrap();
    assert_eq!(dash.displayed.len(), 3);
    assert_eq!(dash.filters.end_date, Some(d(2024, 1, 27)));
    assert_eq!(dash.balances.current, dec(35));

    assert_eq!(
        session.set_cutoff_day(0),
        Err(ValidationError::InvalidCutoffDay(0))
    );
    session.close().await;
}

#[tokio::test]
async fn reset_filters_spans_all_transactions() {
    let store = Arc::new(SqliteStore::open_in_memory().unwrap());
    seed(&store, "Old", 10, TransactionType::Expense, d(2023, 10, 1)).await;
    seed(&store, "Now", 50, TransactionType::Income, d(2024, 1, 10)).await;
    let mut session = open(&store).await;

    session.update_filters(|f| f.min_amount = Some(dec(1000)));
    session.wait_for(|d| d.filters.min_amount.is_some()).await.unwrap();
    session.reset_filters();
    let dash = session
        .wait_for(|d| d.filters.min_amount.is_none())
        .await
        .unwrap();
    assert_eq!(dash.filters.start_date, Some(d(2023, 10, 1)));
    assert_eq!(dash.filters.end_date, Some(d(2024, 1, 10)));
    assert_eq!(dash.displayed.len(), 1);
    session.close().await;
}

#[tokio::test]
async fn close_releases_subscription() {
    let store = Arc::new(SqliteStore::open_in_memory().unwrap());
    let session = open(&store).await;
    assert_eq!(store.subscriber_count(&alice()), 1);
    session.close().await;
    assert_eq!(store.subscriber_count(&alice()), 0);
}

#[tokio::test]
async fn sessions_need_a_signed_in_user() {
    let store = Arc::new(SqliteStore::open_in_memory().unwrap());
    let auth = LocalAuth::new(None);
    let res = Session::open_for_current_user(
        &auth,
        store.clone(),
        SessionState::default(),
        Arc::new(FixedClock(today())),
    )
    .await;
    assert!(matches!(res, Err(TrackerError::NotSignedIn)));

    auth.sign_in(alice());
    let session = Session::open_for_current_user(
        &auth,
        store.clone(),
        SessionState::default(),
        Arc::new(FixedClock(today())),
    )
    .await
    .unwrap();
    assert_eq!(session.user(), &alice());
    session.close().await;
}
