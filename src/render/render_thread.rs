//! render loop worker: one snapshot per frame, never waits on a peer

use std::thread::{self, JoinHandle};
use std::time::Duration;

use super::traits::Renderer;
use crate::control::cancel::CancelToken;
use crate::control::render_authority::RenderAuthority;
use crate::entity::bo::thread_status::ThreadStatus;
use crate::{error, info};

const LOG_TAG: &str = "render_thread";

pub fn spawn<R: Renderer + 'static>(
    authority: RenderAuthority,
    renderer: R,
    frame_interval: Duration,
    cancel: CancelToken,
) -> JoinHandle<()> {
    thread::spawn(move || run_loop(authority, renderer, frame_interval, cancel))
}

pub fn run_loop<R: Renderer>(
    authority: RenderAuthority,
    mut renderer: R,
    frame_interval: Duration,
    cancel: CancelToken,
) {
    let status = authority.status();
    status.set(ThreadStatus::Loading);
    if let Err(e) = renderer.init() {
        error!(LOG_TAG, "renderer init failed: {}", e);
        status.set(ThreadStatus::Error);
        return;
    }
    status.set(ThreadStatus::Running);
    info!(LOG_TAG, "render thread running, frame interval {:?}", frame_interval);

    while !cancel.is_cancelled() && !renderer.should_close() {
        let state = authority.snapshot();
        if let Err(e) = renderer.draw_frame(&state) {
            error!(LOG_TAG, "frame failed: {}", e);
            status.set(ThreadStatus::Error);
            return;
        }
        thread::sleep(frame_interval);
    }

    status.set(ThreadStatus::Stopping);
    info!(LOG_TAG, "render thread stopping");
    status.set(ThreadStatus::Stopped);
}
