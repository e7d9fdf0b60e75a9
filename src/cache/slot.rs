//! Per-slot in-flight operation bookkeeping.
//!
//! A slot admits at most one live operation. Beginning a new operation
//! cancels the previous token and bumps the slot generation in one atomic
//! step, so no two non-cancelled operations in the same slot can both
//! commit. Tokens only move from active to cancelled; cancelling an
//! already-cancelled or completed operation is a no-op.

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

#[derive(Default)]
struct SlotState {
    token: Option<CancellationToken>,
    generation: u64,
}

/// A logical mutation channel (one for section updates, one for photo
/// uploads).
#[derive(Default)]
pub(crate) struct MutationSlot {
    state: Mutex<SlotState>,
}

impl MutationSlot {
    /// Cancel any live operation, then claim the slot for a new one.
    /// Returns the new token and the generation that identifies this
    /// operation at the response-application boundary.
    pub fn begin(&self) -> (CancellationToken, u64) {
        let mut state = self.state.lock();
        if let Some(previous) = state.token.take() {
            previous.cancel();
        }
        let token = CancellationToken::new();
        state.generation += 1;
        state.token = Some(token.clone());
        (token, state.generation)
    }

    /// Whether `generation` still identifies the slot's live operation.
    pub fn is_current(&self, generation: u64) -> bool {
        self.state.lock().generation == generation
    }

    /// Cancel the live operation, if any. Idempotent.
    pub fn cancel(&self) {
        let mut state = self.state.lock();
        if let Some(token) = state.token.take() {
            token.cancel();
        }
    }

    /// Release the slot after the operation identified by `generation`
    /// resolved. Leaves a newer operation's token alone.
    pub fn finish(&self, generation: u64) {
        let mut state = self.state.lock();
        if state.generation == generation {
            state.token = None;
        }
    }
}
