//! The undo manager: history, cursor and the apply gate.
//!
//! Operations are pushed once they have been performed. The manager keeps
//! a bounded history with a cursor; entries before the cursor can be undone,
//! entries at or after it can be redone. Only one undo or redo runs at a
//! time. Every state change is broadcast to subscribers.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use rewind_core::{ApplyOutcome, Direction, InvariantViolation, UndoConfig, UndoStrings};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use crate::operation::{ApplyContext, UndoableOperation};
use crate::service::FileOperationsService;
use crate::trash_restore::TrashRestoreResolver;

/// Snapshot of what the user can do next.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UndoState {
    pub can_undo: bool,
    pub can_redo: bool,
    pub undo_label: String,
    pub undo_description: String,
    pub redo_label: String,
    pub redo_description: String,
    /// An undo or redo is running.
    pub pending: bool,
}

/// Notification sent to subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UndoEvent {
    StateChanged(UndoState),
}

#[derive(Debug)]
struct History {
    /// `None` marks an operation checked out by the running apply.
    entries: VecDeque<Option<UndoableOperation>>,
    cursor: usize,
    depth: usize,
    /// Bumped whenever entries are replaced, so a running apply can tell
    /// its slot is gone.
    generation: u64,
    pending: Option<CancellationToken>,
}

impl History {
    fn new(depth: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            cursor: 0,
            depth: depth.max(1),
            generation: 0,
            pending: None,
        }
    }

    fn undoable(&self) -> Option<&UndoableOperation> {
        if self.pending.is_some() {
            return None;
        }
        self.cursor
            .checked_sub(1)
            .and_then(|i| self.entries.get(i))
            .and_then(Option::as_ref)
    }

    fn redoable(&self) -> Option<&UndoableOperation> {
        if self.pending.is_some() {
            return None;
        }
        self.entries.get(self.cursor).and_then(Option::as_ref)
    }

    fn push(&mut self, operation: UndoableOperation) {
        self.entries.truncate(self.cursor);
        self.entries.retain(Option::is_some);
        self.entries.push_back(Some(operation));
        while self.entries.len() > self.depth {
            self.entries.pop_front();
        }
        self.cursor = self.entries.len();
        self.generation += 1;
    }

    fn clear(&mut self) {
        self.entries.clear();
        self.cursor = 0;
        self.generation += 1;
    }

    fn state(&self) -> UndoState {
        let generic = UndoStrings::generic();
        let (undo_label, undo_description) = match self.undoable() {
            Some(op) => op.label_and_description(Direction::Undo),
            None => (generic.undo_label, generic.undo_description),
        };
        let (redo_label, redo_description) = match self.redoable() {
            Some(op) => op.label_and_description(Direction::Redo),
            None => (generic.redo_label, generic.redo_description),
        };

        UndoState {
            can_undo: self.undoable().is_some(),
            can_redo: self.redoable().is_some(),
            undo_label,
            undo_description,
            redo_label,
            redo_description,
            pending: self.pending.is_some(),
        }
    }
}

/// An operation taken out of its history slot while it is applied.
///
/// Checking in puts the operation back and releases the apply gate. A
/// checkout dropped before that (the apply future was dropped) checks in
/// without moving the cursor, so the operation can be applied again.
struct Checkout<'a> {
    history: &'a Mutex<History>,
    operation: Option<UndoableOperation>,
    index: usize,
    generation: u64,
}

impl Checkout<'_> {
    /// Return the operation to its slot, moving the cursor to `cursor` if
    /// given. Returns false when the history was replaced meanwhile and the
    /// operation was discarded.
    fn check_in(&mut self, cursor: Option<usize>) -> bool {
        let mut history = self.history.lock().unwrap_or_else(|e| e.into_inner());
        history.pending = None;

        let Some(operation) = self.operation.take() else {
            return false;
        };
        if history.generation != self.generation {
            return false;
        }

        history.entries[self.index] = Some(operation);
        if let Some(cursor) = cursor {
            history.cursor = cursor;
        }
        true
    }
}

impl Drop for Checkout<'_> {
    fn drop(&mut self) {
        if self.operation.is_some() {
            tracing::warn!(target: "undo", "apply dropped before completion");
            self.check_in(None);
        }
    }
}

/// Records performed operations and replays them on request.
pub struct UndoManager<S: FileOperationsService + ?Sized = dyn FileOperationsService> {
    service: Arc<S>,
    history: Mutex<History>,
    events: broadcast::Sender<UndoEvent>,
    trash_resolver: TrashRestoreResolver,
}

impl<S: FileOperationsService + ?Sized> std::fmt::Debug for UndoManager<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UndoManager")
            .field("history", &self.history)
            .field("trash_resolver", &self.trash_resolver)
            .finish_non_exhaustive()
    }
}

impl<S: FileOperationsService + ?Sized> UndoManager<S> {
    pub fn new(service: Arc<S>, config: &UndoConfig) -> Self {
        let (events, _) = broadcast::channel(config.event_channel_size.max(1));

        Self {
            service,
            history: Mutex::new(History::new(config.history_depth)),
            events,
            trash_resolver: TrashRestoreResolver::new(config.trash_time_epsilon_secs),
        }
    }

    /// The service operations are replayed through.
    pub fn service(&self) -> &Arc<S> {
        &self.service
    }

    fn lock(&self) -> MutexGuard<'_, History> {
        self.history.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn notify(&self) {
        let state = self.state();
        // No subscribers is fine
        let _ = self.events.send(UndoEvent::StateChanged(state));
    }

    /// Receive a [`UndoEvent`] for every state change.
    pub fn subscribe(&self) -> broadcast::Receiver<UndoEvent> {
        self.events.subscribe()
    }

    /// Record a performed operation.
    ///
    /// Anything redoable is discarded. Pushing while an apply runs is
    /// allowed; the running apply's operation is then dropped when it
    /// finishes.
    pub fn push_operation(&self, operation: impl Into<UndoableOperation>) {
        let operation = operation.into();
        tracing::debug!(target: "undo", kind = %operation.kind(), items = operation.item_count(), "operation recorded");
        self.lock().push(operation);
        self.notify();
    }

    /// Forget every recorded operation.
    pub fn clear(&self) {
        self.lock().clear();
        tracing::debug!(target: "undo", "history cleared");
        self.notify();
    }

    pub fn can_undo(&self) -> bool {
        self.lock().undoable().is_some()
    }

    pub fn can_redo(&self) -> bool {
        self.lock().redoable().is_some()
    }

    pub fn is_pending(&self) -> bool {
        self.lock().pending.is_some()
    }

    pub fn state(&self) -> UndoState {
        self.lock().state()
    }

    pub fn undo_label(&self) -> String {
        self.state().undo_label
    }

    pub fn undo_description(&self) -> String {
        self.state().undo_description
    }

    pub fn redo_label(&self) -> String {
        self.state().redo_label
    }

    pub fn redo_description(&self) -> String {
        self.state().redo_description
    }

    /// Cancel the running apply, if any.
    pub fn cancel(&self) {
        if let Some(token) = &self.lock().pending {
            tracing::info!(target: "undo", "cancelling apply");
            token.cancel();
        }
    }

    pub async fn undo(&self) -> Result<ApplyOutcome, InvariantViolation> {
        self.apply(Direction::Undo).await
    }

    pub async fn redo(&self) -> Result<ApplyOutcome, InvariantViolation> {
        self.apply(Direction::Redo).await
    }

    /// Undo or redo one operation.
    ///
    /// Fails without touching any state when another apply is running or
    /// there is nothing to apply. The cursor only moves when the operation
    /// succeeded; the gate is released whatever the outcome.
    pub async fn apply(&self, direction: Direction) -> Result<ApplyOutcome, InvariantViolation> {
        let (operation, index, generation, cancel) = {
            let mut history = self.lock();
            if history.pending.is_some() {
                tracing::error!(target: "undo", %direction, "apply requested while another is running");
                return Err(InvariantViolation::ApplyPending);
            }

            let index = match direction {
                Direction::Undo => history.cursor.checked_sub(1),
                Direction::Redo => Some(history.cursor).filter(|&i| i < history.entries.len()),
            };
            let Some(operation) = index.and_then(|i| history.entries.get_mut(i)).and_then(Option::take) else {
                tracing::error!(target: "undo", %direction, "nothing to apply");
                return Err(InvariantViolation::NothingToApply(direction));
            };
            let index = index.unwrap_or_default();

            let cancel = CancellationToken::new();
            history.pending = Some(cancel.clone());
            (operation, index, history.generation, cancel)
        };

        tracing::info!(target: "undo", kind = %operation.kind(), %direction, "apply started");
        let mut checkout = Checkout {
            history: &self.history,
            operation: Some(operation),
            index,
            generation,
        };
        self.notify();

        let ctx = ApplyContext::new(&*self.service, cancel).with_trash_resolver(self.trash_resolver);
        let result = match checkout.operation.as_mut() {
            Some(operation) => operation.apply(direction, &ctx).await,
            None => Err(InvariantViolation::NothingToApply(direction)),
        };

        let cursor = matches!(result, Ok(ApplyOutcome::Success)).then_some(match direction {
            Direction::Undo => index,
            Direction::Redo => index + 1,
        });
        if !checkout.check_in(cursor) {
            tracing::debug!(target: "undo", "history replaced during apply, operation discarded");
        }
        drop(checkout);

        match &result {
            Ok(outcome) => tracing::info!(target: "undo", %direction, %outcome, "apply finished"),
            Err(e) => tracing::error!(target: "undo", %direction, error = %e, "apply broke an invariant"),
        }
        self.notify();
        result
    }
}
