//! control block: single slot mailbox between one peer and the coordinator
//!
//! ownership follows the status cell:
//! - `Loading` / `Running`: the peer owns the block and may submit
//! - `Waiting`: the coordinator owns it until it replies and flips back to `Running`
//!
//! the peer claims the block (`Running -> Waiting`) before writing the request, so a request
//! in the channel always means `Waiting`. replies carry the request sequence number, a reply
//! to a submit that timed out is discarded by the next submit.

use std::time::Duration;

use crossbeam::channel::{self, Receiver, Sender, TryRecvError};
use crossbeam::select;

use super::cancel::CancelToken;
use crate::common::error::ControlError;
use crate::entity::bo::command_bo::Command;
use crate::entity::bo::control_bo::{PeerKind, ReplyBo, RequestBo};
use crate::entity::bo::thread_status::{StatusCell, ThreadStatus};
use crate::{debug, trace, warn};

const LOG_TAG: &str = "control_block";

/// create the two halves of a peer's control block
/// `timeout` bounds each submit, `None` waits until the coordinator answers or `cancel` fires
pub fn control_block(
    peer: PeerKind,
    timeout: Option<Duration>,
    cancel: CancelToken,
) -> (ControlClient, ControlBlock) {
    let status = StatusCell::new();
    let (request_tx, request_rx) = channel::bounded(1);
    // the coordinator must never block on a reply
    let (reply_tx, reply_rx) = channel::unbounded();

    let client = ControlClient {
        peer,
        status: status.clone(),
        request_tx,
        reply_rx,
        cancel,
        timeout,
        next_seq: 0,
    };
    let block = ControlBlock {
        peer,
        status,
        request_rx,
        reply_tx,
    };
    (client, block)
}

/// peer half
#[derive(Debug)]
pub struct ControlClient {
    peer: PeerKind,
    status: StatusCell,
    request_tx: Sender<RequestBo>,
    reply_rx: Receiver<ReplyBo>,
    cancel: CancelToken,
    timeout: Option<Duration>,
    next_seq: u64,
}

impl ControlClient {
    /// the process cancel token this peer's submits observe
    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    pub fn status(&self) -> &StatusCell {
        &self.status
    }

    /// loading done, the peer accepts input from now on
    pub fn mark_running(&self) {
        if let Err(current) = self.status.transition(ThreadStatus::Loading, ThreadStatus::Running) {
            warn!(LOG_TAG, "{} peer marked running from {:?}", self.peer, current);
        }
    }

    pub fn mark_error(&self) {
        self.status.set(ThreadStatus::Error);
    }

    pub fn mark_stopping(&self) {
        self.status.set(ThreadStatus::Stopping);
    }

    pub fn mark_stopped(&self) {
        self.status.set(ThreadStatus::Stopped);
    }

    /// hand one command to the coordinator and block until it was applied or rejected
    ///
    /// on `Timeout` / `Cancelled` the block stays owned by the coordinator, the next submit
    /// returns `Busy` until the coordinator has dealt with the abandoned command
    pub fn submit(&mut self, command: Command) -> Result<ReplyBo, ControlError> {
        match self.status.transition(ThreadStatus::Running, ThreadStatus::Waiting) {
            Ok(()) => {}
            Err(ThreadStatus::Waiting) => return Err(ControlError::Busy(self.peer)),
            Err(other) => return Err(ControlError::NotRunning(self.peer, other)),
        }

        self.next_seq += 1;
        let seq = self.next_seq;
        trace!(LOG_TAG, "{} peer submit #{}: {}", self.peer, seq, command);

        if self.request_tx.try_send(RequestBo { seq, command }).is_err() {
            // capacity is one and we own the block, so the coordinator side is gone
            self.status.set(ThreadStatus::Running);
            return Err(ControlError::Disconnected(self.peer));
        }

        let deadline = match self.timeout {
            Some(timeout) => channel::after(timeout),
            None => channel::never(),
        };

        loop {
            select! {
                recv(self.reply_rx) -> msg => match msg {
                    Ok(reply) if reply.seq == seq => return Ok(reply),
                    Ok(stale) => {
                        debug!(LOG_TAG, "{} peer drops stale reply #{}", self.peer, stale.seq);
                    }
                    Err(_) => return Err(ControlError::Disconnected(self.peer)),
                },
                recv(self.cancel.receiver()) -> _ => {
                    return Err(ControlError::Cancelled(self.peer));
                }
                recv(deadline) -> _ => {
                    let timeout = self.timeout.unwrap_or_default();
                    warn!(LOG_TAG, "{} peer timed out after {:?} waiting for #{}", self.peer, timeout, seq);
                    return Err(ControlError::Timeout(self.peer, timeout));
                }
            }
        }
    }
}

impl Drop for ControlClient {
    // a peer thread that ends without stopping cleanly must still show up as stopped
    fn drop(&mut self) {
        if !self.status.get().is_terminal() {
            self.status.set(ThreadStatus::Stopped);
        }
    }
}

/// coordinator half
#[derive(Debug)]
pub struct ControlBlock {
    peer: PeerKind,
    status: StatusCell,
    request_rx: Receiver<RequestBo>,
    reply_tx: Sender<ReplyBo>,
}

impl ControlBlock {
    pub fn peer(&self) -> PeerKind {
        self.peer
    }

    pub fn status(&self) -> ThreadStatus {
        self.status.get()
    }

    /// the peer is waiting and its command is in the slot
    #[cfg(test)]
    pub fn is_pending(&self) -> bool {
        self.status.get() == ThreadStatus::Waiting && !self.request_rx.is_empty()
    }

    /// non blocking, only yields a request while the coordinator owns the block
    pub fn take_request(&self) -> Option<RequestBo> {
        if self.status.get() != ThreadStatus::Waiting {
            return None;
        }
        match self.request_rx.try_recv() {
            Ok(request) => Some(request),
            // claimed but not written yet, picked up next tick
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => None,
        }
    }

    /// give the block back to the peer together with the snapshot
    pub fn release(&self, reply: ReplyBo) {
        if let Err(current) = self.status.transition(ThreadStatus::Waiting, ThreadStatus::Running) {
            debug!(LOG_TAG, "{} peer left while its command was applied, status {:?}", self.peer, current);
        }
        if self.reply_tx.send(reply).is_err() {
            warn!(LOG_TAG, "{} peer is gone, reply dropped", self.peer);
        }
    }

    pub(crate) fn request_receiver(&self) -> &Receiver<RequestBo> {
        &self.request_rx
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::cancel::shutdown_channel;
    use crate::entity::bo::control_bo::DispatchOutcome;
    use crate::entity::bo::render_state_bo::RenderState;
    use std::thread;

    fn wait_pending(block: &ControlBlock) {
        while !block.is_pending() {
            thread::sleep(Duration::from_millis(1));
        }
    }

    fn reply(seq: u64) -> ReplyBo {
        ReplyBo {
            seq,
            outcome: DispatchOutcome::Applied,
            snapshot: RenderState::default(),
        }
    }

    #[test]
    fn test_submit_requires_running() {
        let (_trigger, cancel) = shutdown_channel();
        let (mut client, _block) = control_block(PeerKind::Console, None, cancel);
        assert_eq!(
            client.submit(Command::ReadColors).unwrap_err(),
            ControlError::NotRunning(PeerKind::Console, ThreadStatus::Loading)
        );
    }

    #[test]
    fn test_rendezvous() {
        let (_trigger, cancel) = shutdown_channel();
        let (mut client, block) = control_block(PeerKind::Web, None, cancel);
        client.mark_running();
        assert!(block.take_request().is_none());

        let peer = thread::spawn(move || {
            let reply = client.submit(Command::SetMode(true)).unwrap();
            (client, reply)
        });

        wait_pending(&block);
        assert_eq!(block.status(), ThreadStatus::Waiting);
        let request = block.take_request().unwrap();
        assert_eq!(request.command, Command::SetMode(true));
        block.release(reply(request.seq));

        let (client, reply) = peer.join().unwrap();
        assert!(reply.applied());
        assert_eq!(client.status().get(), ThreadStatus::Running);
    }

    #[test]
    fn test_timeout_then_busy_then_stale_reply_dropped() {
        let (_trigger, cancel) = shutdown_channel();
        let (mut client, block) = control_block(PeerKind::Console, Some(Duration::from_millis(20)), cancel);
        client.mark_running();

        assert!(matches!(client.submit(Command::ReadColors), Err(ControlError::Timeout(PeerKind::Console, _))));
        // the coordinator still owns the block
        assert_eq!(client.submit(Command::ReadColors).unwrap_err(), ControlError::Busy(PeerKind::Console));

        // late answer to the abandoned command
        let abandoned = block.take_request().unwrap();
        block.release(reply(abandoned.seq));

        let peer = thread::spawn(move || client.submit(Command::ToggleAutoStart));
        wait_pending(&block);
        let request = block.take_request().unwrap();
        assert_eq!(request.command, Command::ToggleAutoStart);
        assert!(request.seq > abandoned.seq);
        block.release(reply(request.seq));
        assert_eq!(peer.join().unwrap().unwrap().seq, request.seq);
    }

    #[test]
    fn test_cancel_releases_blocked_peer() {
        let (trigger, cancel) = shutdown_channel();
        let (mut client, block) = control_block(PeerKind::Web, None, cancel);
        client.mark_running();

        let peer = thread::spawn(move || client.submit(Command::ReadColors));
        wait_pending(&block);
        trigger.fire();
        assert_eq!(peer.join().unwrap().unwrap_err(), ControlError::Cancelled(PeerKind::Web));
    }

    #[test]
    fn test_dropped_coordinator_disconnects() {
        let (_trigger, cancel) = shutdown_channel();
        let (mut client, block) = control_block(PeerKind::Console, None, cancel);
        client.mark_running();
        drop(block);
        assert_eq!(client.submit(Command::ReadColors).unwrap_err(), ControlError::Disconnected(PeerKind::Console));
        assert_eq!(client.status().get(), ThreadStatus::Running);
    }
}
