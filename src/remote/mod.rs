//! HTTP client for the remote notes service.
//!
//! Stateless: every operation builds one request, sends it, and maps the
//! outcome. Non-2xx responses become [`RemoteError::RequestFailed`] without
//! inspecting the body; failures before a response arrives (DNS, connect,
//! timeout) become [`RemoteError::Transport`]. No retries, no caching.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::RemoteOptions;

/// A note as the remote service represents it. The id and timestamps are
/// assigned remotely; timestamps are opaque strings and only ever compared
/// lexicographically.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub id: i64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl Note {
    /// Sort key: `updated_at` when present, else `created_at`, else the
    /// empty string. Absent timestamps therefore sort last in descending
    /// order; malformed values are not normalized.
    pub fn effective_timestamp(&self) -> &str {
        self.updated_at
            .as_deref()
            .or(self.created_at.as_deref())
            .unwrap_or("")
    }
}

/// The complete editable field set. Updates always send all of it; the
/// remote never sees a partial patch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteFields {
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
}

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("remote responded with status {status}")]
    RequestFailed { status: u16 },
    #[error("could not reach the notes service: {0}")]
    Transport(#[from] reqwest::Error),
}

pub type RemoteResult<T> = Result<T, RemoteError>;

/// The five logical operations the view layer needs from the collection.
/// Implemented over HTTP by [`RemoteNotesClient`]; tests drive the
/// controller with an in-memory implementation instead.
#[async_trait]
pub trait NotesBackend: Send + Sync {
    async fn list(&self, query: Option<&str>) -> RemoteResult<Vec<Note>>;
    async fn get(&self, id: i64) -> RemoteResult<Note>;
    async fn create(&self, fields: &NoteFields) -> RemoteResult<Note>;
    async fn update(&self, id: i64, fields: &NoteFields) -> RemoteResult<Note>;
    async fn delete(&self, id: i64) -> RemoteResult<()>;
}

#[derive(Clone)]
pub struct RemoteNotesClient {
    options: Arc<RemoteOptions>,
    client: Client,
}

impl RemoteNotesClient {
    pub fn new(options: Arc<RemoteOptions>) -> RemoteResult<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = options.request_timeout() {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
            options,
        })
    }

    // The base is re-resolved on every call so a config edit picked up by a
    // later reload takes effect without rebuilding the client.
    fn collection_url(&self) -> String {
        format!("{}/notes", self.options.endpoint())
    }

    fn note_url(&self, id: i64) -> String {
        format!("{}/notes/{id}", self.options.endpoint())
    }
}

fn expect_success(response: Response) -> RemoteResult<Response> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(RemoteError::RequestFailed {
            status: status.as_u16(),
        })
    }
}

#[async_trait]
impl NotesBackend for RemoteNotesClient {
    async fn list(&self, query: Option<&str>) -> RemoteResult<Vec<Note>> {
        let mut request = self.client.get(self.collection_url());
        if let Some(q) = query.filter(|q| !q.is_empty()) {
            request = request.query(&[("q", q)]);
        }
        let response = expect_success(request.send().await?)?;
        Ok(response.json().await?)
    }

    async fn get(&self, id: i64) -> RemoteResult<Note> {
        let response = expect_success(self.client.get(self.note_url(id)).send().await?)?;
        Ok(response.json().await?)
    }

    async fn create(&self, fields: &NoteFields) -> RemoteResult<Note> {
        let response = expect_success(
            self.client
                .post(self.collection_url())
                .json(fields)
                .send()
                .await?,
        )?;
        Ok(response.json().await?)
    }

    async fn update(&self, id: i64, fields: &NoteFields) -> RemoteResult<Note> {
        let response = expect_success(
            self.client
                .put(self.note_url(id))
                .json(fields)
                .send()
                .await?,
        )?;
        Ok(response.json().await?)
    }

    async fn delete(&self, id: i64) -> RemoteResult<()> {
        expect_success(self.client.delete(self.note_url(id)).send().await?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RemoteOptions;

    #[test]
    fn note_deserializes_with_absent_optional_fields() {
        let note: Note = serde_json::from_str(r#"{"id": 7}"#).expect("minimal note");
        assert_eq!(note.id, 7);
        assert_eq!(note.title, "");
        assert_eq!(note.content, "");
        assert!(note.tags.is_empty());
        assert_eq!(note.created_at, None);
        assert_eq!(note.updated_at, None);
    }

    #[test]
    fn effective_timestamp_prefers_updated_at() {
        let mut note: Note = serde_json::from_str(r#"{"id": 1}"#).expect("note");
        assert_eq!(note.effective_timestamp(), "");
        note.created_at = Some("2024-05-01T10:00:00Z".into());
        assert_eq!(note.effective_timestamp(), "2024-05-01T10:00:00Z");
        note.updated_at = Some("2024-05-02T09:00:00Z".into());
        assert_eq!(note.effective_timestamp(), "2024-05-02T09:00:00Z");
    }

    #[test]
    fn urls_join_against_normalized_endpoint() {
        let options = RemoteOptions {
            base_url: "https://notes.example.com/api/".into(),
            ..RemoteOptions::default()
        };
        let client = RemoteNotesClient::new(Arc::new(options)).expect("client");
        assert_eq!(client.collection_url(), "https://notes.example.com/api/notes");
        assert_eq!(client.note_url(42), "https://notes.example.com/api/notes/42");
    }

    #[test]
    fn request_failed_reports_status() {
        let err = RemoteError::RequestFailed { status: 503 };
        assert_eq!(err.to_string(), "remote responded with status 503");
    }
}
