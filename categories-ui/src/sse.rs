//! Server-Sent Events stream and file watcher.

use std::convert::Infallible;
use std::time::Duration;

use axum::extract::State;
use axum::response::sse::{Event, Sse};
use futures::stream::Stream;
use notify::{Event as NotifyEvent, EventKind, PollWatcher, RecursiveMode, Watcher};
use serde::Serialize;
use tokio::sync::broadcast;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::state::{AppState, ChangeEvent};

#[derive(Serialize)]
struct SsePayload {
    #[serde(rename = "type")]
    event_type: &'static str,
}

impl From<&ChangeEvent> for SsePayload {
    fn from(event: &ChangeEvent) -> Self {
        let event_type = match event {
            ChangeEvent::CategoriesChanged => "categories_changed",
            ChangeEvent::ConfigChanged => "config_changed",
        };
        SsePayload { event_type }
    }
}

/// SSE endpoint handler.
pub async fn events_handler(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let mut rx = state.event_tx.subscribe();

    let stream = async_stream::stream! {
        yield Ok(Event::default().event("connected").data("{}"));

        loop {
            match rx.recv().await {
                Ok(change_event) => {
                    let payload = SsePayload::from(&change_event);
                    if let Ok(json) = serde_json::to_string(&payload) {
                        yield Ok(Event::default().event("change").data(json));
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!(skipped = n, "SSE client lagged, some events dropped");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    break;
                }
            }
        }
    };

    Sse::new(stream).keep_alive(
        axum::response::sse::KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("ping"),
    )
}

/// Start the file watcher in a background task.
pub fn start_file_watcher(state: AppState) {
    tokio::spawn(async move {
        if let Err(e) = run_file_watcher(state).await {
            warn!(error = %e, "file watcher failed");
        }
    });
}

async fn run_file_watcher(state: AppState) -> anyhow::Result<()> {
    let (tx, mut rx) = mpsc::channel::<NotifyEvent>(100);

    let mut watcher = PollWatcher::new(
        move |res: Result<NotifyEvent, notify::Error>| {
            if let Ok(event) = res {
                let _ = tx.try_send(event);
            }
        },
        notify::Config::default().with_poll_interval(Duration::from_millis(100)),
    )?;

    let state_dir = state.state_dir();
    watcher.watch(&state_dir, RecursiveMode::NonRecursive)?;
    info!(path = %state_dir.display(), "watching category store");

    // A reorder rewrites the store via temp file + rename, which surfaces as
    // several events; batch them so clients see one change per write.
    let mut pending_events: Vec<NotifyEvent> = Vec::new();
    let mut flush_tick = tokio::time::interval(Duration::from_millis(100));
    flush_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            Some(event) = rx.recv() => {
                pending_events.push(event);
            }
            _ = flush_tick.tick() => {
                if pending_events.is_empty() {
                    continue;
                }
                process_events(&state, &pending_events);
                pending_events.clear();
            }
        }
    }
}

fn process_events(state: &AppState, events: &[NotifyEvent]) {
    let mut categories_changed = false;
    let mut config_changed = false;

    let store_path = state.store_path();
    let config_path = state.config_path();

    for event in events {
        if !matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_)) {
            continue;
        }

        for path in &event.paths {
            if path == &store_path {
                categories_changed = true;
            } else if path == &config_path {
                config_changed = true;
            }
        }
    }

    if categories_changed {
        debug!("broadcasting categories change");
        let _ = state.event_tx.send(ChangeEvent::CategoriesChanged);
    }
    if config_changed {
        debug!("broadcasting config change");
        let _ = state.event_tx.send(ChangeEvent::ConfigChanged);
    }
}
