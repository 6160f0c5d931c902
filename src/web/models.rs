use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

pub const PROFILES_TABLE: &str = "profiles";
pub const ADMIN_ROLE: &str = "admin";

/// The authenticated principal behind a session cookie.
#[derive(Clone, Debug, PartialEq, FromRow)]
pub struct Identity {
    pub id: Uuid,
    pub username: String,
}

/// Role record keyed by identity. A missing `role` never grants admin.
#[derive(Clone, Debug, Deserialize)]
pub struct Profile {
    pub user_id: Uuid,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
}

impl Profile {
    pub fn is_admin(&self) -> bool {
        self.role.as_deref() == Some(ADMIN_ROLE)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Category {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub order: i32,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Book {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category_id: Option<i64>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct TrainingModule {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Completion percentage, 0 to 100.
    #[serde(default)]
    pub progress: i32,
    pub order: i32,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct CalendarEvent {
    pub id: i64,
    pub title: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default, rename = "event_type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}
