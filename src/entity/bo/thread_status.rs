//! lifecycle status shared by every actor (render authority, console peer, web peer)

use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam::atomic::AtomicCell;
use crossbeam::utils::Backoff;

/// phases are totally ordered: Loading < Running < Waiting < Stopping < Stopped
/// Error is terminal and reachable from any phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ThreadStatus {
    Error = -1,
    Loading = 0,
    Running = 1,
    Waiting = 2,
    Stopping = 3,
    Stopped = 4,
}

impl ThreadStatus {
    /// the actor finished or failed and will never accept commands again
    pub fn is_terminal(self) -> bool {
        matches!(self, ThreadStatus::Stopped | ThreadStatus::Error)
    }
}

/// status cell shared between an actor and whoever watches it
#[derive(Debug, Clone)]
pub struct StatusCell(Arc<AtomicCell<ThreadStatus>>);

impl StatusCell {
    pub fn new() -> Self {
        StatusCell(Arc::new(AtomicCell::new(ThreadStatus::Loading)))
    }

    pub fn get(&self) -> ThreadStatus {
        self.0.load()
    }

    pub fn set(&self, status: ThreadStatus) {
        self.0.store(status);
    }

    /// swap `current` for `new`, returns the observed status on failure
    pub fn transition(&self, current: ThreadStatus, new: ThreadStatus) -> Result<(), ThreadStatus> {
        self.0.compare_exchange(current, new).map(|_| ())
    }

    /// block until the actor left Loading or the timeout expired, returns the last observed status
    pub fn wait_while_loading(&self, timeout: Duration) -> ThreadStatus {
        let deadline = Instant::now() + timeout;
        let backoff = Backoff::new();
        loop {
            let status = self.get();
            if status != ThreadStatus::Loading || Instant::now() >= deadline {
                return status;
            }
            if backoff.is_completed() {
                std::thread::sleep(Duration::from_millis(1));
            } else {
                backoff.snooze();
            }
        }
    }
}

impl Default for StatusCell {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_phase_order() {
        assert!(ThreadStatus::Loading < ThreadStatus::Running);
        assert!(ThreadStatus::Running < ThreadStatus::Waiting);
        assert!(ThreadStatus::Waiting < ThreadStatus::Stopping);
        assert!(ThreadStatus::Stopping < ThreadStatus::Stopped);
        assert!(ThreadStatus::Error.is_terminal());
        assert!(!ThreadStatus::Waiting.is_terminal());
    }

    #[test]
    fn test_transition_only_from_expected() {
        let cell = StatusCell::new();
        assert_eq!(cell.transition(ThreadStatus::Running, ThreadStatus::Waiting), Err(ThreadStatus::Loading));
        cell.set(ThreadStatus::Running);
        assert!(cell.transition(ThreadStatus::Running, ThreadStatus::Waiting).is_ok());
        assert_eq!(cell.get(), ThreadStatus::Waiting);
    }

    #[test]
    fn test_wait_while_loading() {
        let cell = StatusCell::new();
        let remote = cell.clone();
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            remote.set(ThreadStatus::Running);
        });
        assert_eq!(cell.wait_while_loading(Duration::from_secs(5)), ThreadStatus::Running);
        handle.join().unwrap();
    }

    #[test]
    fn test_wait_while_loading_times_out() {
        let cell = StatusCell::new();
        assert_eq!(cell.wait_while_loading(Duration::from_millis(10)), ThreadStatus::Loading);
    }
}
