//! messages exchanged through a control block

use std::fmt;

use super::command_bo::Command;
use super::render_state_bo::RenderState;

/// control surfaces, declaration order is the coordinator polling order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PeerKind {
    Console,
    Web,
}

impl fmt::Display for PeerKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PeerKind::Console => f.write_str("console"),
            PeerKind::Web => f.write_str("web"),
        }
    }
}

/// command written into the block by a peer
#[derive(Debug, Clone)]
pub struct RequestBo {
    pub seq: u64,
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    Applied,
    /// the command was discarded, the render state is unchanged
    Rejected,
}

/// snapshot written back by the coordinator
#[derive(Debug, Clone)]
pub struct ReplyBo {
    pub seq: u64,
    pub outcome: DispatchOutcome,
    pub snapshot: RenderState,
}

impl ReplyBo {
    pub fn applied(&self) -> bool {
        self.outcome == DispatchOutcome::Applied
    }
}

/// one applied command, in dispatch order
#[derive(Debug, Clone)]
pub struct DispatchRecordBo {
    pub peer: PeerKind,
    pub command: Command,
    pub outcome: DispatchOutcome,
}
