//! Shared code document store with push-based fan-out.
//!
//! Wraps the document repository behind an async facade and keeps one
//! broadcast channel per meeting. Every committed write is published to the
//! live subscribers of that meeting; this is the propagation path the
//! synchronization sessions rely on. There are no version tokens: last
//! write wins at field granularity, in connection commit order.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};

use crate::db::documents::DocumentRepository;
use crate::db::Database;

const CHANNEL_CAPACITY: usize = 64;

/// Field of a code document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentField {
    Code,
    Language,
    Output,
}

impl DocumentField {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Code => "code",
            Self::Language => "language",
            Self::Output => "output",
        }
    }
}

/// A committed field write, fanned out to subscribers of the meeting.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentEvent {
    pub meeting_id: String,
    pub field: DocumentField,
    pub value: String,
}

/// Full document view with defaults applied.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentView {
    pub meeting_id: String,
    pub code: String,
    pub language: String,
    pub output: String,
}

type ChannelMap = Arc<RwLock<HashMap<String, broadcast::Sender<DocumentEvent>>>>;

#[derive(Clone)]
pub struct DocumentStore {
    db: Database,
    channels: ChannelMap,
}

impl DocumentStore {
    pub fn new(db: Database) -> Self {
        Self {
            db,
            channels: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Subscribe to committed writes for a meeting.
    pub async fn subscribe(&self, meeting_id: &str) -> broadcast::Receiver<DocumentEvent> {
        let mut channels = self.channels.write().await;
        channels
            .entry(meeting_id.to_string())
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .subscribe()
    }

    pub async fn get_code(&self, meeting_id: &str) -> Result<String> {
        self.db
            .with_conn(|conn| DocumentRepository::get_code(conn, meeting_id))
            .await
    }

    pub async fn get_output(&self, meeting_id: &str) -> Result<String> {
        self.db
            .with_conn(|conn| DocumentRepository::get_output(conn, meeting_id))
            .await
    }

    pub async fn get_language(&self, meeting_id: &str) -> Result<String> {
        self.db
            .with_conn(|conn| DocumentRepository::get_language(conn, meeting_id))
            .await
    }

    /// Full document view, with field defaults for an absent document.
    pub async fn document(&self, meeting_id: &str) -> Result<DocumentView> {
        self.db
            .with_conn(|conn| {
                Ok(DocumentView {
                    meeting_id: meeting_id.to_string(),
                    code: DocumentRepository::get_code(conn, meeting_id)?,
                    language: DocumentRepository::get_language(conn, meeting_id)?,
                    output: DocumentRepository::get_output(conn, meeting_id)?,
                })
            })
            .await
    }

    /// Write the code buffer, stamping the language alongside it. Publishes
    /// both field events since both columns changed.
    pub async fn update_code(&self, meeting_id: &str, code: &str, language: &str) -> Result<()> {
        self.db
            .with_conn(|conn| DocumentRepository::update_code(conn, meeting_id, code, language))
            .await?;
        self.publish(meeting_id, DocumentField::Code, code).await;
        self.publish(meeting_id, DocumentField::Language, language)
            .await;
        Ok(())
    }

    pub async fn update_output(&self, meeting_id: &str, output: &str) -> Result<()> {
        self.db
            .with_conn(|conn| DocumentRepository::update_output(conn, meeting_id, output))
            .await?;
        self.publish(meeting_id, DocumentField::Output, output).await;
        Ok(())
    }

    pub async fn update_language(&self, meeting_id: &str, language: &str) -> Result<()> {
        self.db
            .with_conn(|conn| DocumentRepository::update_language(conn, meeting_id, language))
            .await?;
        self.publish(meeting_id, DocumentField::Language, language)
            .await;
        Ok(())
    }

    async fn publish(&self, meeting_id: &str, field: DocumentField, value: &str) {
        let channels = self.channels.read().await;
        if let Some(tx) = channels.get(meeting_id) {
            // Send fails only when no subscriber is listening.
            let _ = tx.send(DocumentEvent {
                meeting_id: meeting_id.to_string(),
                field,
                value: value.to_string(),
            });
        }
    }
}
