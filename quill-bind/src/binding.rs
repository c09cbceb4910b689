//! Binding between one text surface and a collaboration channel.
//!
//! ## Lifecycle
//!
//! ```text
//! Uninitialized ──subscribe──► AwaitingSnapshot ──document──► Live
//!                                                              │
//!                                     disconnect / teardown    │
//!                                                              ▼
//!                                                        Disconnected
//! ```
//!
//! A binding driven by [`Binding::run`] on another task is stopped through a
//! [`TeardownHandle`]. Dropping a binding that is still connected shuts it
//! down as well, so an aborted task leaves the surface read-only.
//!
//! Editing is only enabled while `Live`. Every handler runs to completion on
//! the caller's task before the next one starts, so a transform batch is
//! never interleaved with local change processing.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use uuid::Uuid;

use crate::channel::{Collaborator, DocumentSnapshot, RemoteEvent};
use crate::config::{BindingConfig, ConfigError};
use crate::cursor::CursorReporter;
use crate::diff::detect_change;
use crate::surface::{ChangeReceiver, TextSurface};
use crate::transform::{Transform, TransformError};

/// Message raised when the remote side refuses a local transform.
pub const LOCAL_TRANSFORM_REJECTED: &str = "Local change resulted in invalid transform";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingState {
    Uninitialized,
    AwaitingSnapshot,
    Live,
    Disconnected,
}

/// Counters for monitoring a binding.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BindingStats {
    pub transforms_sent: u64,
    pub transforms_rejected: u64,
    pub transforms_applied: u64,
    pub protocol_errors: u64,
    pub cursor_reports: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BindingError {
    #[error("text surface cannot report changes, editing stays disabled")]
    MissingChangeNotifications,
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Stops a running binding from outside its task.
#[derive(Debug, Clone)]
pub struct TeardownHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl TeardownHandle {
    /// Ask the binding to shut down. Its event loop handles this before any
    /// queued event or local change.
    pub fn teardown(&self) {
        self.tx.send_replace(true);
    }
}

/// Keeps a [`TextSurface`] in sync with a shared document.
#[derive(Debug)]
pub struct Binding<S: TextSurface, C: Collaborator> {
    id: Uuid,
    surface: S,
    collaborator: C,
    state: BindingState,
    /// Content as last sent or applied; local changes are diffed against it.
    content: String,
    events: Option<mpsc::Receiver<RemoteEvent>>,
    changes: Option<ChangeReceiver>,
    reporter: CursorReporter,
    stats: BindingStats,
    shutdown_tx: Arc<watch::Sender<bool>>,
    shutdown_rx: watch::Receiver<bool>,
}

impl<S, C> Binding<S, C>
where
    S: TextSurface,
    C: Collaborator,
{
    /// Attach to `surface` and subscribe to `events`.
    ///
    /// The surface is made read-only until the document snapshot arrives.
    /// Fails if the configuration is invalid or the surface has no change
    /// notifications; either way the error is also raised through
    /// `collaborator` and the surface stays read-only.
    pub fn bind(
        mut surface: S,
        mut collaborator: C,
        events: mpsc::Receiver<RemoteEvent>,
        config: &BindingConfig,
    ) -> Result<Self, BindingError> {
        surface.set_editable(false);

        if let Err(e) = config.validate() {
            log::error!("Refusing to bind: {e}");
            collaborator.raise_error(&e.to_string());
            return Err(e.into());
        }

        let Some(changes) = surface.take_change_notifications() else {
            let err = BindingError::MissingChangeNotifications;
            log::error!("Refusing to bind: {err}");
            collaborator.raise_error(&err.to_string());
            return Err(err);
        };

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let mut binding = Self {
            id: Uuid::new_v4(),
            surface,
            collaborator,
            state: BindingState::Uninitialized,
            content: String::new(),
            events: None,
            changes: None,
            reporter: CursorReporter::new(config.poll_period()),
            stats: BindingStats::default(),
            shutdown_tx: Arc::new(shutdown_tx),
            shutdown_rx,
        };
        binding.subscribe(events, changes);
        Ok(binding)
    }

    fn subscribe(&mut self, events: mpsc::Receiver<RemoteEvent>, changes: ChangeReceiver) {
        self.events = Some(events);
        self.changes = Some(changes);
        self.state = BindingState::AwaitingSnapshot;
        log::debug!("Binding {} awaiting document snapshot", self.id);
    }

    /// Handle for tearing the binding down while `run()` owns it.
    pub fn teardown_handle(&self) -> TeardownHandle {
        TeardownHandle {
            tx: Arc::clone(&self.shutdown_tx),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> BindingState {
        self.state
    }

    /// Content as last sent or applied.
    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn stats(&self) -> &BindingStats {
        &self.stats
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn collaborator(&self) -> &C {
        &self.collaborator
    }

    pub fn collaborator_mut(&mut self) -> &mut C {
        &mut self.collaborator
    }

    /// Dispatch one inbound event.
    pub fn handle_remote_event(&mut self, event: RemoteEvent) {
        match (self.state, event) {
            (BindingState::AwaitingSnapshot, RemoteEvent::Document(snapshot)) => {
                self.on_snapshot(snapshot)
            }
            (BindingState::Live, RemoteEvent::Transforms(batch)) => self.apply_batch(&batch),
            (BindingState::Live, RemoteEvent::Disconnect) => self.shut_down("remote disconnect"),
            (BindingState::Live, RemoteEvent::Presence(payload)) => {
                self.collaborator.presence(&payload)
            }
            (BindingState::Disconnected, event) => {
                log::debug!("Binding {} dropping {} event after disconnect", self.id, event.kind());
            }
            (state, event) => {
                self.protocol_error(&format!("unexpected {} event while {state:?}", event.kind()));
            }
        }
    }

    fn on_snapshot(&mut self, snapshot: DocumentSnapshot) {
        self.surface.set_content(&snapshot.content);
        self.content = snapshot.content;
        self.surface.set_editable(true);
        self.reporter.start();
        self.state = BindingState::Live;
        log::info!(
            "Binding {} live with {} chars",
            self.id,
            self.content.chars().count()
        );
    }

    /// React to a change notification from the surface.
    ///
    /// Diffs the surface against the last known content and sends the
    /// resulting transform. The known content is updated before sending and
    /// is not rolled back if the remote side rejects the transform; the
    /// rejection is raised as an error instead. Returns the transform, if any.
    pub fn handle_local_change(&mut self) -> Option<Transform> {
        if self.state != BindingState::Live {
            log::debug!("Binding {} ignoring local change while {:?}", self.id, self.state);
            return None;
        }

        let new_content = self.surface.content();
        let transform = detect_change(&self.content, &new_content)?;
        self.content = new_content;

        match self.collaborator.send_transform(&transform) {
            Ok(()) => self.stats.transforms_sent += 1,
            Err(rejection) => {
                self.stats.transforms_rejected += 1;
                log::warn!("Binding {} diverged: {rejection}", self.id);
                self.collaborator.raise_error(LOCAL_TRANSFORM_REJECTED);
            }
        }
        Some(transform)
    }

    /// Apply a batch in order. The first transform that does not fit the
    /// buffer is reported and it and the rest of the batch are dropped.
    fn apply_batch(&mut self, batch: &[Transform]) {
        // Anything the user typed since the last notification goes out first,
        // otherwise it would be folded into the remote edit and never sent.
        self.handle_local_change();

        for (index, transform) in batch.iter().enumerate() {
            if let Err(e) = self.apply_remote(transform) {
                self.protocol_error(&format!(
                    "dropping transform {} of {}: {e}",
                    index + 1,
                    batch.len()
                ));
                return;
            }
        }
    }

    /// Apply one remote transform to the surface, carrying the selection.
    ///
    /// The new selection is computed from the pre-edit selection, then
    /// content and selection are written back to back.
    fn apply_remote(&mut self, transform: &Transform) -> Result<(), TransformError> {
        let selection = self.surface.selection();
        let new_content = transform.apply(&self.surface.content())?;
        let new_selection = selection.remap(transform, new_content.chars().count());

        self.surface.set_content(&new_content);
        self.surface.set_selection(new_selection);
        self.content = new_content;
        self.stats.transforms_applied += 1;
        Ok(())
    }

    /// Send the caret upstream. Only while live.
    pub fn report_cursor(&mut self) -> Option<usize> {
        if self.state != BindingState::Live {
            return None;
        }
        self.stats.cursor_reports += 1;
        Some(CursorReporter::report(&self.surface, &mut self.collaborator))
    }

    fn protocol_error(&mut self, message: &str) {
        self.stats.protocol_errors += 1;
        log::warn!("Binding {} protocol error: {message}", self.id);
        self.collaborator.raise_error(message);
    }

    /// Stop everything: unsubscribe, cancel the reporter, lock the surface.
    pub fn teardown(&mut self) {
        if self.state != BindingState::Disconnected {
            self.shut_down("teardown");
        }
    }

    fn shut_down(&mut self, reason: &str) {
        self.reporter.stop();
        if let Some(mut events) = self.events.take() {
            events.close();
        }
        if let Some(mut changes) = self.changes.take() {
            changes.close();
        }
        self.surface.set_editable(false);
        self.content.clear();
        self.state = BindingState::Disconnected;
        log::info!("Binding {} disconnected ({reason})", self.id);
    }

    /// Drive the binding until it disconnects, is torn down, or one of its
    /// inbound channels closes.
    ///
    /// A teardown request wins over everything else. Local changes are
    /// drained before remote events, and the cursor tick comes last, so a
    /// caret report always reflects every edit seen so far.
    pub async fn run(&mut self) {
        while self.state != BindingState::Disconnected {
            if *self.shutdown_rx.borrow() {
                self.shut_down("teardown");
                break;
            }
            let (Some(events), Some(changes)) = (self.events.as_mut(), self.changes.as_mut())
            else {
                break;
            };
            let shutdown = &mut self.shutdown_rx;
            let reporting = self.reporter.is_running();

            tokio::select! {
                biased;
                _ = shutdown.changed() => self.shut_down("teardown"),
                change = changes.recv() => match change {
                    Some(()) => {
                        self.handle_local_change();
                    }
                    None => self.shut_down("surface closed"),
                },
                event = events.recv() => match event {
                    Some(event) => self.handle_remote_event(event),
                    None => self.shut_down("event channel closed"),
                },
                _ = self.reporter.tick(), if reporting => {
                    self.report_cursor();
                }
            }
        }
    }
}

impl<S: TextSurface, C: Collaborator> Drop for Binding<S, C> {
    fn drop(&mut self) {
        if self.state != BindingState::Disconnected {
            self.shut_down("dropped");
        }
    }
}
