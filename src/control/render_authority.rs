//! render authority: owner of the canonical render state
//!
//! anybody may take a snapshot, only the coordinator (this module's parent) may write

use std::sync::{Arc, RwLock};

use crate::entity::bo::render_state_bo::RenderState;
use crate::entity::bo::thread_status::StatusCell;

#[derive(Debug, Clone)]
pub struct RenderAuthority {
    state: Arc<RwLock<RenderState>>,
    // startup handshake of the render thread
    status: StatusCell,
}

impl RenderAuthority {
    pub fn new(initial: RenderState) -> Self {
        RenderAuthority {
            state: Arc::new(RwLock::new(initial)),
            status: StatusCell::new(),
        }
    }

    /// current state by value, cheap enough to call every frame
    pub fn snapshot(&self) -> RenderState {
        self.state.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn status(&self) -> &StatusCell {
        &self.status
    }

    pub(super) fn write<R>(&self, f: impl FnOnce(&mut RenderState) -> R) -> R {
        let mut guard = self.state.write().unwrap_or_else(|e| e.into_inner());
        f(&mut guard)
    }
}
