use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::debug;

use super::{
    entities::{LogPatch, NewLogEntry, TimeLogEntry},
    session::SessionConfig,
};

/// Half-open-ended timestamp filter for fetches. Empty bounds mean all-time.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TimeRange {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl TimeRange {
    pub fn between(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
        }
    }

    pub fn all() -> Self {
        Self::default()
    }
}

/// Interface for abstracting access to the hosted entry collection. All
/// operations are scoped to the configured user; ordering of fetches is
/// newest-first.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LogStore: Send + Sync {
    async fn fetch_range(&self, range: TimeRange) -> Result<Vec<TimeLogEntry>>;

    async fn insert(&self, entry: NewLogEntry) -> Result<TimeLogEntry>;

    async fn insert_many(&self, entries: Vec<NewLogEntry>) -> Result<Vec<TimeLogEntry>>;

    async fn update(&self, id: i64, patch: LogPatch) -> Result<TimeLogEntry>;
}

/// REST implementation over the hosted table's PostgREST-style endpoints.
/// Failures surface status and body to the caller; there is no retry and no
/// offline queue.
pub struct RestLogStore {
    client: reqwest::Client,
    session: SessionConfig,
}

impl RestLogStore {
    pub fn new(session: SessionConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            session,
        }
    }

    fn request(&self, method: reqwest::Method, query: &[(String, String)]) -> reqwest::RequestBuilder {
        self.client
            .request(method, self.session.table_url())
            .header("apikey", &self.session.api_key)
            .bearer_auth(&self.session.access_token)
            .query(query)
    }

    async fn expect_rows(response: reqwest::Response) -> Result<Vec<TimeLogEntry>> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("backend returned {status}: {body}"));
        }
        Ok(response.json().await?)
    }
}

#[async_trait]
impl LogStore for RestLogStore {
    async fn fetch_range(&self, range: TimeRange) -> Result<Vec<TimeLogEntry>> {
        let mut query = vec![
            ("select".to_string(), "*".to_string()),
            ("user_id".to_string(), format!("eq.{}", self.session.user_id)),
            ("order".to_string(), "timestamp.desc".to_string()),
        ];
        if let Some(start) = range.start {
            query.push(("timestamp".to_string(), format!("gte.{}", start.to_rfc3339())));
        }
        if let Some(end) = range.end {
            query.push(("timestamp".to_string(), format!("lte.{}", end.to_rfc3339())));
        }

        debug!("Fetching entries for {range:?}");
        let response = self.request(reqwest::Method::GET, &query).send().await?;
        Self::expect_rows(response).await
    }

    async fn insert(&self, entry: NewLogEntry) -> Result<TimeLogEntry> {
        let mut rows = self.insert_many(vec![entry]).await?;
        rows.pop().context("backend returned no row for insert")
    }

    async fn insert_many(&self, entries: Vec<NewLogEntry>) -> Result<Vec<TimeLogEntry>> {
        debug!("Inserting {} entries", entries.len());
        let response = self
            .request(reqwest::Method::POST, &[])
            .header("Prefer", "return=representation")
            .json(&entries)
            .send()
            .await?;
        Self::expect_rows(response).await
    }

    async fn update(&self, id: i64, patch: LogPatch) -> Result<TimeLogEntry> {
        let query = vec![("id".to_string(), format!("eq.{id}"))];
        debug!("Updating entry {id}");
        let response = self
            .request(reqwest::Method::PATCH, &query)
            .header("Prefer", "return=representation")
            .json(&patch)
            .send()
            .await?;
        Self::expect_rows(response)
            .await?
            .pop()
            .with_context(|| format!("no entry with id {id}"))
    }
}
