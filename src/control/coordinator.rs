//! coordinator: the only writer of the render authority
//!
//! every tick it scans the control blocks in peer order, applies each pending command,
//! replies with a fresh snapshot and hands the block back to its peer. it never waits on a
//! peer, between ticks it parks until a request arrives or the tick elapses.

use std::time::Duration;

use crossbeam::channel::Select;

use super::cancel::CancelToken;
use super::control_block::ControlBlock;
use super::render_authority::RenderAuthority;
use crate::entity::bo::command_bo::Command;
use crate::entity::bo::control_bo::{DispatchOutcome, DispatchRecordBo, PeerKind, ReplyBo};
use crate::entity::bo::render_state_bo::{
    BehaviorFlag, BehaviorFlags, Palette, RenderState, VenueName, MINUTES_PER_DAY,
};
use crate::entity::bo::thread_status::ThreadStatus;
use crate::util::time::{format_12h, local_minute_of_day};
use crate::{debug, info, trace, warn};

const LOG_TAG: &str = "coordinator";

/// why the control loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Cancelled,
    RendererStopped(ThreadStatus),
    PeerStopped(PeerKind, ThreadStatus),
}

pub struct Coordinator {
    authority: RenderAuthority,
    // kept sorted by peer kind
    blocks: Vec<ControlBlock>,
    tick: Duration,
    // minute the downbeat was last handled, autostart fires once per match
    showtime_seen: Option<u16>,
}

impl Coordinator {
    pub fn new(authority: RenderAuthority, tick: Duration) -> Self {
        Coordinator {
            authority,
            blocks: Vec::new(),
            tick,
            showtime_seen: None,
        }
    }

    pub fn register(&mut self, block: ControlBlock) {
        info!(LOG_TAG, "registered {} control block", block.peer());
        self.blocks.push(block);
        self.blocks.sort_by_key(|b| b.peer());
    }

    /// one non blocking pass over all control blocks
    /// returns what was applied, in application order
    pub fn poll_and_dispatch(&self) -> Vec<DispatchRecordBo> {
        let mut records = Vec::new();
        for block in &self.blocks {
            let Some(request) = block.take_request() else {
                continue;
            };

            let (outcome, snapshot) = self.authority.write(|state| {
                let outcome = apply(state, &request.command);
                (outcome, state.clone())
            });

            match outcome {
                DispatchOutcome::Applied if request.command.is_read_only() => {
                    debug!(LOG_TAG, "{} #{} read: {}", block.peer(), request.seq, request.command)
                }
                DispatchOutcome::Applied => {
                    info!(LOG_TAG, "{} #{} applied: {}", block.peer(), request.seq, request.command)
                }
                DispatchOutcome::Rejected => {
                    warn!(LOG_TAG, "{} #{} rejected: {}", block.peer(), request.seq, request.command)
                }
            }

            block.release(ReplyBo {
                seq: request.seq,
                outcome,
                snapshot,
            });
            records.push(DispatchRecordBo {
                peer: block.peer(),
                command: request.command,
                outcome,
            });
        }
        records
    }

    /// switch from slideshow to banner when the downbeat minute arrives and autostart is on
    /// fires at most once per downbeat minute, the guard is cleared as soon as the minute passes
    /// returns true when the mode was switched
    pub fn check_showtime(&mut self, now_minutes: u16) -> bool {
        if self.showtime_seen == Some(now_minutes) {
            return false;
        }
        let switched = self.authority.write(|state| {
            if state.downbeat_minutes != now_minutes {
                return None;
            }
            let switch = state.autostart() && state.slideshow();
            if switch {
                state.flags.set(BehaviorFlag::SlideshowMode, false);
            }
            Some(switch)
        });

        match switched {
            None => {
                self.showtime_seen = None;
                false
            }
            // autostart may still be turned on during the downbeat minute
            Some(false) => false,
            Some(true) => {
                self.showtime_seen = Some(now_minutes);
                info!(LOG_TAG, "showtime {} reached, autostart switched to banner", format_12h(now_minutes));
                true
            }
        }
    }

    /// control loop, runs until cancelled or until any actor stopped
    pub fn run(&mut self, cancel: &CancelToken) -> StopReason {
        info!(LOG_TAG, "coordinator running, tick {:?}, {} peers", self.tick, self.blocks.len());
        loop {
            if cancel.is_cancelled() {
                info!(LOG_TAG, "coordinator cancelled");
                return StopReason::Cancelled;
            }
            if let Some(reason) = self.stopped_actor() {
                info!(LOG_TAG, "coordinator exiting: {:?}", reason);
                return reason;
            }

            for record in self.poll_and_dispatch() {
                trace!(LOG_TAG, "dispatched {} {} -> {:?}", record.peer, record.command, record.outcome);
            }
            self.check_showtime(local_minute_of_day());
            self.wait_for_work(cancel);
        }
    }

    fn stopped_actor(&self) -> Option<StopReason> {
        let render_status = self.authority.status().get();
        if render_status.is_terminal() {
            return Some(StopReason::RendererStopped(render_status));
        }
        self.blocks
            .iter()
            .find(|b| b.status().is_terminal())
            .map(|b| StopReason::PeerStopped(b.peer(), b.status()))
    }

    // park until a request lands, the cancel token fires or one tick passed
    fn wait_for_work(&self, cancel: &CancelToken) {
        let mut select = Select::new();
        for block in &self.blocks {
            select.recv(block.request_receiver());
        }
        select.recv(cancel.receiver());
        if select.ready_timeout(self.tick).is_err() {
            debug!(LOG_TAG, "idle tick");
        }
    }
}

/// opcode table: apply one command to the render state
/// invalid arguments leave the state untouched
pub fn apply(state: &mut RenderState, command: &Command) -> DispatchOutcome {
    match command {
        Command::SetFlagField(bits) => {
            state.flags = BehaviorFlags::from_bits(*bits);
            DispatchOutcome::Applied
        }
        Command::ToggleFlag { mask, on } => match BehaviorFlag::from_mask(*mask) {
            Some(flag) => {
                state.flags.set(flag, *on);
                DispatchOutcome::Applied
            }
            None => DispatchOutcome::Rejected,
        },
        Command::SetDownbeat(minutes) => {
            if (0..MINUTES_PER_DAY).contains(minutes) {
                state.downbeat_minutes = *minutes as u16;
                DispatchOutcome::Applied
            } else {
                DispatchOutcome::Rejected
            }
        }
        Command::SetVenueName(name) => {
            state.venue_name = VenueName::new(name);
            DispatchOutcome::Applied
        }
        Command::SetColorSlot { slot, color } => {
            match (state.colors.get_mut((*slot as usize).wrapping_sub(1)), Palette::from_index(*color)) {
                (Some(target), Some(palette)) => {
                    *target = palette;
                    DispatchOutcome::Applied
                }
                _ => DispatchOutcome::Rejected,
            }
        }
        Command::ReadColors => DispatchOutcome::Applied,
        Command::SetMode(slideshow) => {
            state.flags.set(BehaviorFlag::SlideshowMode, *slideshow);
            DispatchOutcome::Applied
        }
        Command::ToggleAutoStart => {
            let on = state.autostart();
            state.flags.set(BehaviorFlag::AutoStart, !on);
            DispatchOutcome::Applied
        }
        Command::Unrecognized => DispatchOutcome::Rejected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::error::ControlError;
    use crate::control::cancel::shutdown_channel;
    use crate::control::control_block::{control_block, ControlClient};
    use std::thread;

    fn applied(state: &mut RenderState, command: Command) -> bool {
        apply(state, &command) == DispatchOutcome::Applied
    }

    fn wait_pending(coordinator: &Coordinator, peer: PeerKind) {
        while !coordinator.blocks.iter().any(|b| b.peer() == peer && b.is_pending()) {
            thread::sleep(Duration::from_millis(1));
        }
    }

    #[test]
    fn test_downbeat_boundaries() {
        let mut state = RenderState::default();
        assert!(applied(&mut state, Command::SetDownbeat(0)));
        assert_eq!(state.downbeat_minutes, 0);
        assert!(applied(&mut state, Command::SetDownbeat(1439)));
        assert_eq!(state.downbeat_minutes, 1439);
        assert!(!applied(&mut state, Command::SetDownbeat(1440)));
        assert!(!applied(&mut state, Command::SetDownbeat(1500)));
        assert!(!applied(&mut state, Command::SetDownbeat(-1)));
        assert_eq!(state.downbeat_minutes, 1439);
    }

    #[test]
    fn test_color_slot_range() {
        let mut state = RenderState::default();
        assert!(applied(&mut state, Command::SetColorSlot { slot: 3, color: 7 }));
        assert_eq!(state.color(3), Some(Palette::White));

        let before = state.clone();
        assert!(!applied(&mut state, Command::SetColorSlot { slot: 0, color: 1 }));
        assert!(!applied(&mut state, Command::SetColorSlot { slot: 4, color: 1 }));
        assert!(!applied(&mut state, Command::SetColorSlot { slot: 1, color: 8 }));
        assert_eq!(state, before);
    }

    #[test]
    fn test_flags() {
        let mut state = RenderState::default();
        assert!(applied(&mut state, Command::ToggleFlag { mask: 0x04, on: false }));
        assert!(!state.flags.contains(BehaviorFlag::BaseLight));
        assert!(applied(&mut state, Command::ToggleFlag { mask: 0x01, on: true }));
        assert!(state.slideshow());
        // two bits at once is not a recognized flag
        assert!(!applied(&mut state, Command::ToggleFlag { mask: 0x05, on: true }));
        assert!(!state.flags.contains(BehaviorFlag::BaseLight));

        assert!(applied(&mut state, Command::SetFlagField(0x0f)));
        assert_eq!(state.flags.bits(), 0x0f);

        assert!(applied(&mut state, Command::SetMode(false)));
        assert_eq!(state.flags.bits(), 0x0e);

        assert!(applied(&mut state, Command::ToggleAutoStart));
        assert!(!state.autostart());
        assert!(applied(&mut state, Command::ToggleAutoStart));
        assert!(state.autostart());
    }

    #[test]
    fn test_venue_truncated() {
        let mut state = RenderState::default();
        assert!(applied(&mut state, Command::SetVenueName("v".repeat(300))));
        assert_eq!(state.venue_name.as_str().len(), 247);
    }

    #[test]
    fn test_read_only_commands() {
        let mut state = RenderState::default();
        let before = state.clone();
        assert!(applied(&mut state, Command::ReadColors));
        assert!(applied(&mut state, Command::ReadColors));
        assert!(!applied(&mut state, Command::Unrecognized));
        assert_eq!(state, before);
    }

    fn setup() -> (Coordinator, ControlClient, ControlClient, crate::control::cancel::ShutdownTrigger, CancelToken) {
        let (trigger, cancel) = shutdown_channel();
        let authority = RenderAuthority::new(RenderState::default());
        let mut coordinator = Coordinator::new(authority, Duration::from_millis(5));
        // registration order does not matter
        let (web, web_block) = control_block(PeerKind::Web, None, cancel.clone());
        let (console, console_block) = control_block(PeerKind::Console, None, cancel.clone());
        coordinator.register(web_block);
        coordinator.register(console_block);
        web.mark_running();
        console.mark_running();
        (coordinator, console, web, trigger, cancel)
    }

    #[test]
    fn test_same_tick_console_first() {
        let (coordinator, mut console, mut web, _trigger, _cancel) = setup();

        let console_thread = thread::spawn(move || console.submit(Command::SetColorSlot { slot: 1, color: 3 }));
        let web_thread = thread::spawn(move || web.submit(Command::SetColorSlot { slot: 2, color: 2 }));
        wait_pending(&coordinator, PeerKind::Console);
        wait_pending(&coordinator, PeerKind::Web);

        let records = coordinator.poll_and_dispatch();
        let order: Vec<PeerKind> = records.iter().map(|r| r.peer).collect();
        assert_eq!(order, vec![PeerKind::Console, PeerKind::Web]);

        let console_reply = console_thread.join().unwrap().unwrap();
        let web_reply = web_thread.join().unwrap().unwrap();
        assert_eq!(console_reply.snapshot.color(1), Some(Palette::Blue));
        // web was applied after console and sees both updates
        assert_eq!(web_reply.snapshot.color(1), Some(Palette::Blue));
        assert_eq!(web_reply.snapshot.color(2), Some(Palette::Green));

        let state = coordinator.authority.snapshot();
        assert_eq!(state.color(1), Some(Palette::Blue));
        assert_eq!(state.color(2), Some(Palette::Green));
        assert!(coordinator.poll_and_dispatch().is_empty());
    }

    #[test]
    fn test_rejected_reply_keeps_state() {
        let (coordinator, mut console, _web, _trigger, _cancel) = setup();
        let peer = thread::spawn(move || console.submit(Command::SetDownbeat(1500)));
        wait_pending(&coordinator, PeerKind::Console);
        coordinator.poll_and_dispatch();

        let reply = peer.join().unwrap().unwrap();
        assert_eq!(reply.outcome, DispatchOutcome::Rejected);
        assert_eq!(reply.snapshot.downbeat_minutes, 1200);
        assert_eq!(coordinator.authority.snapshot().downbeat_minutes, 1200);
    }

    #[test]
    fn test_run_loop_round_trip() {
        let (mut coordinator, mut console, mut web, trigger, cancel) = setup();
        let authority = coordinator.authority.clone();
        let runner = thread::spawn(move || coordinator.run(&cancel));

        let reply = console.submit(Command::SetVenueName("The Forum".to_string())).unwrap();
        assert_eq!(reply.snapshot.venue_name.as_str(), "The Forum");
        let reply = web.submit(Command::SetDownbeat(1290)).unwrap();
        assert_eq!(reply.snapshot.downbeat_minutes, 1290);
        assert_eq!(reply.snapshot.venue_name.as_str(), "The Forum");

        let first = console.submit(Command::ReadColors).unwrap();
        let second = console.submit(Command::ReadColors).unwrap();
        assert_eq!(first.snapshot, second.snapshot);
        assert_eq!(authority.snapshot(), second.snapshot);

        trigger.fire();
        assert_eq!(runner.join().unwrap(), StopReason::Cancelled);
        assert_eq!(console.submit(Command::ReadColors).unwrap_err(), ControlError::Cancelled(PeerKind::Console));
    }

    #[test]
    fn test_run_stops_when_peer_stops() {
        let (mut coordinator, console, _web, _trigger, cancel) = setup();
        let runner = thread::spawn(move || coordinator.run(&cancel));
        console.mark_stopped();
        assert_eq!(
            runner.join().unwrap(),
            StopReason::PeerStopped(PeerKind::Console, ThreadStatus::Stopped)
        );
    }

    #[test]
    fn test_showtime_autostart() {
        let (mut coordinator, _console, _web, _trigger, _cancel) = setup();
        coordinator.authority.write(|state| state.flags.set(BehaviorFlag::SlideshowMode, true));

        assert!(!coordinator.check_showtime(1199));
        assert!(coordinator.authority.snapshot().slideshow());
        assert!(coordinator.check_showtime(1200));
        assert!(!coordinator.authority.snapshot().slideshow());

        // once per minute, slideshow can be brought back during the downbeat minute
        coordinator.authority.write(|state| state.flags.set(BehaviorFlag::SlideshowMode, true));
        assert!(!coordinator.check_showtime(1200));
        assert!(coordinator.authority.snapshot().slideshow());
    }

    #[test]
    fn test_showtime_fires_again_next_day() {
        let (mut coordinator, _console, _web, _trigger, _cancel) = setup();
        coordinator.authority.write(|state| state.flags.set(BehaviorFlag::SlideshowMode, true));
        assert!(coordinator.check_showtime(1200));

        for minute in (1201..1440).chain(0..1200) {
            assert!(!coordinator.check_showtime(minute));
        }
        coordinator.authority.write(|state| state.flags.set(BehaviorFlag::SlideshowMode, true));
        assert!(coordinator.check_showtime(1200));
        assert!(!coordinator.authority.snapshot().slideshow());
    }

    #[test]
    fn test_autostart_enabled_during_downbeat_minute() {
        let (mut coordinator, _console, _web, _trigger, _cancel) = setup();
        coordinator.authority.write(|state| {
            state.flags.set(BehaviorFlag::SlideshowMode, true);
            state.flags.set(BehaviorFlag::AutoStart, false);
        });
        assert!(!coordinator.check_showtime(1200));

        coordinator.authority.write(|state| state.flags.set(BehaviorFlag::AutoStart, true));
        assert!(coordinator.check_showtime(1200));
        assert!(!coordinator.authority.snapshot().slideshow());
    }

    #[test]
    fn test_showtime_without_autostart() {
        let (mut coordinator, _console, _web, _trigger, _cancel) = setup();
        coordinator.authority.write(|state| {
            state.flags.set(BehaviorFlag::SlideshowMode, true);
            state.flags.set(BehaviorFlag::AutoStart, false);
        });
        assert!(!coordinator.check_showtime(1200));
        assert!(coordinator.authority.snapshot().slideshow());
    }
}
