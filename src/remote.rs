//! Cloud API client.
//!
//! The drainer treats the cloud store opaquely: create/update/delete a row
//! by table and id. Transient trouble (transport errors, 5xx, throttling)
//! is retried by the caller with backoff; any other 4xx is a permanent
//! validation rejection and surfaces as a conflict. The backend upserts by
//! id on both create and update, so re-queued rows are safe either way.

use chrono::{DateTime, Utc};
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use std::env;
use url::Url;

use crate::drainer::RemoteStore;
use crate::models::{SyncOp, SyncQueueEntry};

/// ---------------------------------------------------------------------------
/// Configuration
/// ---------------------------------------------------------------------------

const API_BASE_ENV: &str = "IRONLOG_API_BASE_URL";
const API_KEY_ENV: &str = "IRONLOG_API_KEY";
const ERROR_BODY_PREVIEW_CHARS: usize = 500;

#[derive(Debug, Clone)]
pub struct RemoteConfig {
  pub base_url: Url,
  pub api_key: String,
}

impl RemoteConfig {
  pub fn from_env() -> Result<Self, RemoteError> {
    let mut base =
      env::var(API_BASE_ENV).map_err(|_| RemoteError::MissingConfig(API_BASE_ENV.into()))?;

    // Url::join treats a base without a trailing slash as a file.
    if !base.ends_with('/') {
      base.push('/');
    }
    let base_url = Url::parse(&base)
      .map_err(|e| RemoteError::MissingConfig(format!("{}: {}", API_BASE_ENV, e)))?;

    let api_key =
      env::var(API_KEY_ENV).map_err(|_| RemoteError::MissingConfig(API_KEY_ENV.into()))?;

    Ok(Self { base_url, api_key })
  }
}

/// ---------------------------------------------------------------------------
/// Error Handling
/// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
  #[error("Missing configuration: {0}")]
  MissingConfig(String),

  #[error("Network error: {0}")]
  Network(String),

  #[error("Cloud API rejected {0}: {1}")]
  Rejected(String, String),

  #[error("Database error: {0}")]
  Database(String),
}

impl RemoteError {
  /// Permanent failures are never retried; the affected row becomes a
  /// conflict instead.
  pub fn is_permanent(&self) -> bool {
    matches!(self, Self::Rejected(_, _))
  }
}

impl From<reqwest::Error> for RemoteError {
  fn from(e: reqwest::Error) -> Self {
    Self::Network(e.to_string())
  }
}

impl serde::Serialize for RemoteError {
  fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
  where
    S: serde::Serializer,
  {
    serializer.serialize_str(&self.to_string())
  }
}

/// ---------------------------------------------------------------------------
/// Cloud Remote
/// ---------------------------------------------------------------------------

pub struct CloudRemote {
  config: RemoteConfig,
  client: Client,
}

impl CloudRemote {
  pub fn new(config: RemoteConfig) -> Self {
    Self {
      config,
      client: Client::new(),
    }
  }

  fn rows_url(&self, table: &str, id: Option<&str>) -> Result<Url, RemoteError> {
    let mut path = format!("tables/{}/rows", table);
    if let Some(id) = id {
      path.push('/');
      path.push_str(id);
    }
    self
      .config
      .base_url
      .join(&path)
      .map_err(|e| RemoteError::Network(e.to_string()))
  }

  /// Fetch announcements published after the given high-water mark.
  pub async fn fetch_announcements(
    &self,
    after: Option<DateTime<Utc>>,
  ) -> Result<Vec<RemoteAnnouncement>, RemoteError> {
    let mut url = self
      .config
      .base_url
      .join("announcements")
      .map_err(|e| RemoteError::Network(e.to_string()))?;

    if let Some(after) = after {
      url.query_pairs_mut().append_pair("after", &after.to_rfc3339());
    }

    let response = self
      .client
      .get(url)
      .bearer_auth(&self.config.api_key)
      .send()
      .await?;

    if !response.status().is_success() {
      return Err(classify_failure("announcements".to_string(), response).await);
    }

    let announcements = response.json::<Vec<RemoteAnnouncement>>().await?;
    Ok(announcements)
  }
}

impl RemoteStore for CloudRemote {
  async fn apply(&self, entry: &SyncQueueEntry) -> Result<(), RemoteError> {
    let response = match entry.op {
      SyncOp::Insert => {
        self
          .client
          .post(self.rows_url(&entry.table_name, None)?)
          .bearer_auth(&self.config.api_key)
          .json(&entry.payload)
          .send()
          .await?
      }
      SyncOp::Update => {
        self
          .client
          .put(self.rows_url(&entry.table_name, Some(&entry.row_id))?)
          .bearer_auth(&self.config.api_key)
          .json(&entry.payload)
          .send()
          .await?
      }
      SyncOp::Delete => {
        self
          .client
          .delete(self.rows_url(&entry.table_name, Some(&entry.row_id))?)
          .bearer_auth(&self.config.api_key)
          .send()
          .await?
      }
    };

    let status = response.status();
    if status.is_success() {
      return Ok(());
    }

    // Deleting a row the cloud never saw is already done.
    if status == StatusCode::NOT_FOUND && entry.op == SyncOp::Delete {
      return Ok(());
    }

    let target = format!("{}/{}", entry.table_name, entry.row_id);
    Err(classify_failure(target, response).await)
  }
}

async fn classify_failure(target: String, response: Response) -> RemoteError {
  let status = response.status();
  let body = response.text().await.unwrap_or_default();
  let preview: String = body.chars().take(ERROR_BODY_PREVIEW_CHARS).collect();

  if status == StatusCode::REQUEST_TIMEOUT
    || status == StatusCode::TOO_MANY_REQUESTS
    || status.is_server_error()
  {
    RemoteError::Network(format!("{} returned {}: {}", target, status, preview))
  } else {
    RemoteError::Rejected(target, format!("{}: {}", status, preview))
  }
}

/// Announcement row as served by the cloud API.
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteAnnouncement {
  pub id: String,
  pub title: String,
  pub body: String,
  pub published_at: DateTime<Utc>,
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
