//! process wide shutdown signal
//! firing the trigger disconnects the channel, every token clone observes it at once

use std::sync::{Arc, Mutex};

use crossbeam::channel::{self, Receiver, Sender, TryRecvError};

#[derive(Debug, Clone)]
pub struct ShutdownTrigger(Arc<Mutex<Option<Sender<()>>>>);

impl ShutdownTrigger {
    pub fn fire(&self) {
        let mut guard = self.0.lock().unwrap_or_else(|e| e.into_inner());
        guard.take();
    }
}

#[derive(Debug, Clone)]
pub struct CancelToken(Receiver<()>);

impl CancelToken {
    pub fn is_cancelled(&self) -> bool {
        matches!(self.0.try_recv(), Err(TryRecvError::Disconnected))
    }

    /// block until the trigger fired
    pub fn wait(&self) {
        let _ = self.0.recv();
    }

    pub(crate) fn receiver(&self) -> &Receiver<()> {
        &self.0
    }
}

pub fn shutdown_channel() -> (ShutdownTrigger, CancelToken) {
    // nothing is ever sent, only the disconnect matters
    let (tx, rx) = channel::bounded(0);
    (ShutdownTrigger(Arc::new(Mutex::new(Some(tx)))), CancelToken(rx))
}
