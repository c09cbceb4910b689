//! The editable text surface a binding is attached to.
//!
//! A surface owns the visible content and the user's selection. The binding
//! reads and rewrites both, and listens for change notifications that fire
//! after every mutation the surface did not receive through `set_content`.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc;

use crate::selection::Selection;
use crate::transform::byte_offset;

/// Receiver side of a surface's change notifications.
pub type ChangeReceiver = mpsc::UnboundedReceiver<()>;

/// What a binding needs from the widget it is bound to.
pub trait TextSurface {
    /// Current content.
    fn content(&self) -> String;

    /// Replace the content. Must not fire a change notification.
    fn set_content(&mut self, content: &str);

    /// Current selection in char offsets.
    fn selection(&self) -> Selection;

    fn set_selection(&mut self, selection: Selection);

    /// Allow or block user edits.
    fn set_editable(&mut self, editable: bool);

    /// Hand over the change-notification stream.
    ///
    /// `None` means the surface has no way to report user edits; a binding
    /// cannot be built on top of it.
    fn take_change_notifications(&mut self) -> Option<ChangeReceiver>;
}

#[derive(Debug, Default)]
struct SurfaceState {
    content: String,
    selection: Selection,
    editable: bool,
}

/// In-memory surface behaving like a plain-text editing widget.
///
/// Clones share state, so one handle can be given to a binding while another
/// plays the user: `type_text`, `backspace`, `user_replace_all` and
/// `set_user_selection` mutate the content the way keystrokes would and then
/// notify. `close` plays the widget going away.
#[derive(Debug, Clone)]
pub struct MemorySurface {
    state: Arc<Mutex<SurfaceState>>,
    notify_tx: Arc<Mutex<Option<mpsc::UnboundedSender<()>>>>,
    notify_rx: Arc<Mutex<Option<ChangeReceiver>>>,
}

impl MemorySurface {
    /// Create an empty, non-editable surface with change notifications.
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            state: Arc::new(Mutex::new(SurfaceState::default())),
            notify_tx: Arc::new(Mutex::new(Some(tx))),
            notify_rx: Arc::new(Mutex::new(Some(rx))),
        }
    }

    /// Create a surface that cannot report user edits.
    pub fn without_notifications() -> Self {
        Self {
            state: Arc::new(Mutex::new(SurfaceState::default())),
            notify_tx: Arc::new(Mutex::new(None)),
            notify_rx: Arc::new(Mutex::new(None)),
        }
    }

    fn state(&self) -> MutexGuard<'_, SurfaceState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn notify(&self) {
        let notify_tx = self.notify_tx.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(tx) = notify_tx.as_ref() {
            // Nobody listening once the binding is torn down.
            let _ = tx.send(());
        }
    }

    /// Destroy the widget: no more edits, and the change-notification stream
    /// ends for every clone.
    pub fn close(&self) {
        self.state().editable = false;
        self.notify_tx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
    }

    /// Whether user edits are currently accepted.
    pub fn is_editable(&self) -> bool {
        self.state().editable
    }

    /// Replace the selection with `text` and put the caret after it.
    ///
    /// Returns `false` (and changes nothing) while the surface is read-only.
    pub fn type_text(&self, text: &str) -> bool {
        {
            let mut state = self.state();
            if !state.editable {
                return false;
            }
            let Selection { start, end } = state.selection;
            let (start, end) = (start.min(end), start.max(end));
            let start_byte = byte_offset(&state.content, start);
            let end_byte = byte_offset(&state.content, end);
            state.content.replace_range(start_byte..end_byte, text);
            state.selection = Selection::caret(start + text.chars().count());
        }
        self.notify();
        true
    }

    /// Delete the selection, or the char before the caret.
    pub fn backspace(&self) -> bool {
        {
            let mut state = self.state();
            if !state.editable {
                return false;
            }
            let Selection { start, end } = state.selection;
            let (mut start, end) = (start.min(end), start.max(end));
            if start == end {
                if start == 0 {
                    return true;
                }
                start -= 1;
            }
            let start_byte = byte_offset(&state.content, start);
            let end_byte = byte_offset(&state.content, end);
            state.content.replace_range(start_byte..end_byte, "");
            state.selection = Selection::caret(start);
        }
        self.notify();
        true
    }

    /// Swap the whole content as a user action would (paste over select-all,
    /// find-and-replace). The caret moves to the end.
    pub fn user_replace_all(&self, content: &str) -> bool {
        {
            let mut state = self.state();
            if !state.editable {
                return false;
            }
            state.content = content.to_string();
            state.selection = Selection::caret(content.chars().count());
        }
        self.notify();
        true
    }

    /// Move the caret or selection as the user would. No content change, so
    /// no notification.
    pub fn set_user_selection(&self, selection: Selection) {
        let mut state = self.state();
        let len = state.content.chars().count();
        state.selection = Selection::new(selection.start.min(len), selection.end.min(len));
    }
}

impl Default for MemorySurface {
    fn default() -> Self {
        Self::new()
    }
}

impl TextSurface for MemorySurface {
    fn content(&self) -> String {
        self.state().content.clone()
    }

    fn set_content(&mut self, content: &str) {
        let mut state = self.state();
        let len = content.chars().count();
        state.content = content.to_string();
        state.selection = Selection::new(state.selection.start.min(len), state.selection.end.min(len));
    }

    fn selection(&self) -> Selection {
        self.state().selection
    }

    fn set_selection(&mut self, selection: Selection) {
        self.set_user_selection(selection);
    }

    fn set_editable(&mut self, editable: bool) {
        self.state().editable = editable;
    }

    fn take_change_notifications(&mut self) -> Option<ChangeReceiver> {
        self.notify_rx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }
}
