use std::sync::Arc;

use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

/// A row of the hosted `time_logs` table. One entry marks the start of a
/// 30-minute slot; `activity` is `None` exactly when the slot was skipped.
/// The backend assigns `id` on insert.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct TimeLogEntry {
    pub id: i64,
    pub user_id: Arc<str>,
    pub timestamp: DateTime<Utc>,
    pub activity: Option<Arc<str>>,
    pub is_skipped: bool,
}

impl TimeLogEntry {
    pub fn label(&self) -> Option<&str> {
        self.activity.as_deref()
    }
}

/// Insert payload. The backend fills in `id`.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct NewLogEntry {
    pub user_id: Arc<str>,
    pub timestamp: DateTime<Utc>,
    pub activity: Option<Arc<str>>,
    pub is_skipped: bool,
}

impl NewLogEntry {
    pub fn logged(user_id: Arc<str>, timestamp: DateTime<Utc>, activity: impl Into<Arc<str>>) -> Self {
        Self {
            user_id,
            timestamp,
            activity: Some(activity.into()),
            is_skipped: false,
        }
    }

    pub fn skipped(user_id: Arc<str>, timestamp: DateTime<Utc>) -> Self {
        Self {
            user_id,
            timestamp,
            activity: None,
            is_skipped: true,
        }
    }
}

/// In-place update of an existing entry. `activity: None` serializes as an
/// explicit null so a label can be cleared.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct LogPatch {
    pub activity: Option<Arc<str>>,
    pub is_skipped: bool,
}

impl LogPatch {
    pub fn labeled(activity: impl Into<Arc<str>>) -> Self {
        Self {
            activity: Some(activity.into()),
            is_skipped: false,
        }
    }

    pub fn skipped() -> Self {
        Self {
            activity: None,
            is_skipped: true,
        }
    }
}
