//! WebSocket synchronization endpoint.
//!
//! Each connection hosts one `SyncSession`. The client sends edit,
//! language-selection, and run frames; the server pushes the changes other
//! participants commit, debounces the client's code edits before writing
//! them back, and streams run results when an execution finishes.

use axum::{
    extract::{
        ws::{Message, WebSocket},
        Path, State, WebSocketUpgrade,
    },
    response::IntoResponse,
};
use futures_util::{stream::SplitSink, SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::documents::DocumentState;
use crate::store::DocumentField;
use crate::sync::{SessionTurn, SyncSession};

/// Frames accepted from the client.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ClientFrame {
    Edit { code: String },
    SelectLanguage { language: String },
    Run,
}

/// Frames pushed to the client.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ServerFrame<'a> {
    Snapshot {
        code: &'a str,
        language: &'a str,
        output: &'a str,
    },
    Code {
        value: &'a str,
    },
    Language {
        value: &'a str,
    },
    Output {
        value: &'a str,
    },
}

pub async fn session_ws(
    ws: WebSocketUpgrade,
    Path(meeting_id): Path<String>,
    State(state): State<DocumentState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| async move {
        if let Err(err) = run_session(socket, meeting_id, state).await {
            warn!("Session ended with error: {:#}", err);
        }
    })
}

async fn run_session(
    socket: WebSocket,
    meeting_id: String,
    state: DocumentState,
) -> anyhow::Result<()> {
    let (mut sender, mut receiver) = socket.split();

    let mut session =
        SyncSession::open(state.store.clone(), meeting_id.clone(), state.debounce).await?;

    info!("Session opened for meeting {}", meeting_id);

    send_frame(
        &mut sender,
        &ServerFrame::Snapshot {
            code: session.code(),
            language: session.language(),
            output: session.output(),
        },
    )
    .await?;

    // Run results come back through a channel so the session loop stays
    // responsive while an execution is in flight.
    let (run_tx, mut run_rx) = mpsc::channel::<String>(1);

    loop {
        tokio::select! {
            incoming = receiver.next() => match incoming {
                Some(Ok(Message::Text(text))) => {
                    handle_client_frame(&text, &mut session, &state, &run_tx).await?;
                }
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(err)) => {
                    debug!("WebSocket receive error: {}", err);
                    break;
                }
            },
            turn = session.next_turn() => match turn {
                SessionTurn::Remote(change) => {
                    let frame = match change.field {
                        DocumentField::Code => ServerFrame::Code { value: &change.value },
                        DocumentField::Language => ServerFrame::Language { value: &change.value },
                        DocumentField::Output => ServerFrame::Output { value: &change.value },
                    };
                    send_frame(&mut sender, &frame).await?;
                }
                SessionTurn::FlushReady(code) => {
                    session.flush_code(code).await?;
                }
                SessionTurn::Idle => {}
                SessionTurn::Closed => break,
            },
            Some(output) = run_rx.recv() => {
                session.complete_run(output.clone()).await?;
                // The store echo compares equal to local state, so push the
                // result to this client explicitly.
                send_frame(&mut sender, &ServerFrame::Output { value: &output }).await?;
            }
        }
    }

    session.shutdown();
    info!("Session closed for meeting {}", meeting_id);
    Ok(())
}

async fn handle_client_frame(
    text: &str,
    session: &mut SyncSession,
    state: &DocumentState,
    run_tx: &mpsc::Sender<String>,
) -> anyhow::Result<()> {
    let frame: ClientFrame = match serde_json::from_str(text) {
        Ok(frame) => frame,
        Err(err) => {
            debug!("Ignoring malformed client frame: {}", err);
            return Ok(());
        }
    };

    match frame {
        ClientFrame::Edit { code } => {
            session.edit_code(code);
        }
        ClientFrame::SelectLanguage { language } => {
            session.select_language(language).await?;
        }
        ClientFrame::Run => {
            // Busy guard: re-invocation while a run is outstanding is
            // silently dropped, mirroring a disabled run button.
            if let Some(run) = session.try_begin_run() {
                let executor = state.executor.clone();
                let tx = run_tx.clone();
                tokio::spawn(async move {
                    let output = executor.execute(&run.language, &run.version, &run.code).await;
                    let _ = tx.send(output).await;
                });
            } else {
                debug!(
                    "Run ignored for meeting {}: execution already in flight",
                    session.meeting_id()
                );
            }
        }
    }

    Ok(())
}

async fn send_frame(
    sender: &mut SplitSink<WebSocket, Message>,
    frame: &ServerFrame<'_>,
) -> anyhow::Result<()> {
    let json = serde_json::to_string(frame)?;
    sender.send(Message::Text(json)).await?;
    Ok(())
}
