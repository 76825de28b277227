//! Per-client synchronization sessions.
//!
//! A `SyncSession` reconciles one client's edit buffer with the shared
//! document for a meeting: remote values are adopted on arrival, local code
//! edits are written back after a quiescence window, and language changes
//! write through immediately. There is no operational transform and no
//! CRDT merge; conflicting concurrent writes resolve to whichever commit
//! the store applied last, at whole-field granularity.

pub mod debounce;

use anyhow::Result;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::debug;

use crate::languages;
use crate::store::{DocumentEvent, DocumentField, DocumentStore};

pub use debounce::Debouncer;

/// Local and last-observed-remote field values.
#[derive(Debug, Clone, Default)]
struct FieldState {
    code: String,
    language: String,
    output: String,
}

/// A remote change that was adopted into the local buffer and should be
/// surfaced to the connected client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteChange {
    pub field: DocumentField,
    pub value: String,
}

/// Outcome of waiting on session-internal triggers.
#[derive(Debug)]
pub enum SessionTurn {
    /// Another participant's change was adopted into the local buffer.
    Remote(RemoteChange),
    /// A debounced local edit survived quiescence; call
    /// [`SyncSession::flush_code`] with the value.
    FlushReady(String),
    /// An echo of our own write, or a lagged notification. Nothing to show.
    Idle,
    /// The store side shut down.
    Closed,
}

/// Snapshot handed to the execution bridge when a run starts.
#[derive(Debug, Clone)]
pub struct RunRequest {
    pub language: String,
    pub version: String,
    pub code: String,
}

pub struct SyncSession {
    meeting_id: String,
    store: DocumentStore,
    events: broadcast::Receiver<DocumentEvent>,
    debounce: Debouncer,
    local: FieldState,
    remote: FieldState,
    executing: bool,
}

impl SyncSession {
    /// Open a session: subscribe first, then seed local state from the
    /// store so no write is missed in between.
    pub async fn open(
        store: DocumentStore,
        meeting_id: impl Into<String>,
        quiescence: Duration,
    ) -> Result<Self> {
        let meeting_id = meeting_id.into();
        let events = store.subscribe(&meeting_id).await;

        let seed = FieldState {
            code: store.get_code(&meeting_id).await?,
            language: store.get_language(&meeting_id).await?,
            output: store.get_output(&meeting_id).await?,
        };

        Ok(Self {
            meeting_id,
            store,
            events,
            debounce: Debouncer::new(quiescence),
            local: seed.clone(),
            remote: seed,
            executing: false,
        })
    }

    pub fn meeting_id(&self) -> &str {
        &self.meeting_id
    }

    pub fn code(&self) -> &str {
        &self.local.code
    }

    pub fn language(&self) -> &str {
        &self.local.language
    }

    pub fn output(&self) -> &str {
        &self.local.output
    }

    /// Record a local keystroke and re-arm the debounced write-back.
    pub fn edit_code(&mut self, code: impl Into<String>) {
        let code = code.into();
        self.local.code = code.clone();
        self.debounce.schedule(code);
    }

    /// Switch the language: local state updates and the write goes out
    /// immediately, no quiescence window.
    pub async fn select_language(&mut self, language: impl Into<String>) -> Result<()> {
        let language = language.into();
        self.local.language = language.clone();
        self.store
            .update_language(&self.meeting_id, &language)
            .await
    }

    /// Wait for the next remote notification or debounce fire.
    /// Cancel-safe: all side effects happen in `apply_remote`/`flush_code`,
    /// outside the await points.
    pub async fn next_turn(&mut self) -> SessionTurn {
        tokio::select! {
            event = self.events.recv() => match event {
                Ok(event) => self
                    .apply_remote(event)
                    .map(SessionTurn::Remote)
                    .unwrap_or(SessionTurn::Idle),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    debug!(
                        "Session for {} lagged {} events; later writes supersede",
                        self.meeting_id, skipped
                    );
                    SessionTurn::Idle
                }
                Err(broadcast::error::RecvError::Closed) => SessionTurn::Closed,
            },
            Some(code) = self.debounce.fired() => SessionTurn::FlushReady(code),
        }
    }

    /// Fold a remote notification into local state. The remote value is
    /// authoritative on arrival: if it differs from the local buffer it
    /// overwrites it, and the adopted change is returned for display.
    /// Echoes of our own writes compare equal and are suppressed.
    pub fn apply_remote(&mut self, event: DocumentEvent) -> Option<RemoteChange> {
        let value = event.value;
        let (remote_slot, local_slot) = match event.field {
            DocumentField::Code => (&mut self.remote.code, &mut self.local.code),
            DocumentField::Language => (&mut self.remote.language, &mut self.local.language),
            DocumentField::Output => (&mut self.remote.output, &mut self.local.output),
        };

        *remote_slot = value.clone();
        if *local_slot == value {
            return None;
        }
        *local_slot = value.clone();

        if event.field == DocumentField::Code {
            // Adoption counts as a local-state change: it re-arms the
            // debounce with the adopted value, superseding any pending
            // stale edit. The eventual flush compares equal and is skipped.
            self.debounce.schedule(value.clone());
        }

        Some(RemoteChange {
            field: event.field,
            value,
        })
    }

    /// Write back a debounced edit, unless the value matches what the
    /// remote side already has.
    pub async fn flush_code(&mut self, code: String) -> Result<bool> {
        if code == self.remote.code {
            return Ok(false);
        }
        self.store
            .update_code(&self.meeting_id, &code, &self.local.language)
            .await?;
        Ok(true)
    }

    /// Claim the run slot and snapshot the buffer for execution. Returns
    /// `None` while a previous run is still in flight. The busy guard is
    /// per client only; other participants can still race.
    pub fn try_begin_run(&mut self) -> Option<RunRequest> {
        if self.executing {
            return None;
        }
        self.executing = true;
        let language = self.local.language.clone();
        let version = languages::version_for(&language).to_string();
        Some(RunRequest {
            language,
            version,
            code: self.local.code.clone(),
        })
    }

    /// Persist an execution result and release the run slot. Error strings
    /// from the bridge go through the same path as successful output.
    pub async fn complete_run(&mut self, output: String) -> Result<()> {
        self.local.output = output.clone();
        self.executing = false;
        self.store.update_output(&self.meeting_id, &output).await
    }

    /// Drop any pending write-back. Called when the client disconnects.
    pub fn shutdown(&mut self) {
        self.debounce.cancel();
    }
}
