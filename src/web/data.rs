use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::error;
use uuid::Uuid;

use crate::store::{Filter, RecordStore, SelectQuery, StoreResult};

use super::models::{Book, CalendarEvent, Category, PROFILES_TABLE, Profile, TrainingModule};

/// A table-backed record listed in ascending order of its key.
pub trait DomainRecord: DeserializeOwned {
    const TABLE: &'static str;
    const ORDER_KEY: &'static str;
    type Key: Ord;

    fn sort_key(&self) -> Self::Key;
}

impl DomainRecord for Category {
    const TABLE: &'static str = "categories";
    const ORDER_KEY: &'static str = "order";
    type Key = i32;

    fn sort_key(&self) -> i32 {
        self.order
    }
}

impl DomainRecord for Book {
    const TABLE: &'static str = "books";
    const ORDER_KEY: &'static str = "id";
    type Key = i64;

    fn sort_key(&self) -> i64 {
        self.id
    }
}

impl DomainRecord for TrainingModule {
    const TABLE: &'static str = "training_modules";
    const ORDER_KEY: &'static str = "order";
    type Key = i32;

    fn sort_key(&self) -> i32 {
        self.order
    }
}

impl DomainRecord for CalendarEvent {
    const TABLE: &'static str = "calendar_events";
    const ORDER_KEY: &'static str = "date";
    type Key = NaiveDate;

    fn sort_key(&self) -> NaiveDate {
        self.date
    }
}

/// Reads every row of `T`'s table in ascending key order.
///
/// Read and decode failures are logged and produce an empty list so the
/// page still renders its empty state.
pub async fn fetch_ordered<T: DomainRecord>(store: &dyn RecordStore) -> Vec<T> {
    let query = SelectQuery::from(T::TABLE).order_by(T::ORDER_KEY);

    let rows = match store.select(&query).await {
        Ok(rows) => rows,
        Err(err) => {
            error!(?err, table = T::TABLE, "failed to fetch records");
            return Vec::new();
        }
    };

    let mut records = match decode_rows::<T>(rows) {
        Ok(records) => records,
        Err(err) => {
            error!(?err, table = T::TABLE, "failed to decode records");
            return Vec::new();
        }
    };

    records.sort_by_key(|record| record.sort_key());
    records
}

fn decode_rows<T: DeserializeOwned>(rows: Vec<Value>) -> serde_json::Result<Vec<T>> {
    rows.into_iter().map(serde_json::from_value).collect()
}

pub async fn fetch_categories(store: &dyn RecordStore) -> Vec<Category> {
    fetch_ordered(store).await
}

pub async fn fetch_books(store: &dyn RecordStore) -> Vec<Book> {
    fetch_ordered(store).await
}

pub async fn fetch_training_modules(store: &dyn RecordStore) -> Vec<TrainingModule> {
    fetch_ordered(store).await
}

pub async fn fetch_calendar_events(store: &dyn RecordStore) -> Vec<CalendarEvent> {
    fetch_ordered(store).await
}

/// Looks up the profile row for `user_id`. A row that does not decode is
/// treated like a missing one.
pub async fn fetch_profile(store: &dyn RecordStore, user_id: Uuid) -> StoreResult<Option<Profile>> {
    let query =
        SelectQuery::from(PROFILES_TABLE).filter(Filter::eq("user_id", user_id.to_string()));
    let rows = store.select(&query).await?;

    Ok(rows
        .into_iter()
        .next()
        .and_then(|row| match serde_json::from_value::<Profile>(row) {
            Ok(profile) => Some(profile),
            Err(err) => {
                error!(?err, %user_id, "profile row did not decode");
                None
            }
        }))
}
