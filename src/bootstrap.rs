//! process bootstrap: start every actor in order, run the coordinator, tear down

use std::thread::JoinHandle;
use std::time::Duration;

use crate::common::error::{BannerError, ErrorCode};
use crate::common::setting::Settings;
use crate::control::cancel::{shutdown_channel, ShutdownTrigger};
use crate::control::control_block::control_block;
use crate::control::coordinator::{Coordinator, StopReason};
use crate::control::render_authority::RenderAuthority;
use crate::entity::bo::control_bo::PeerKind;
use crate::entity::bo::render_state_bo::RenderState;
use crate::entity::bo::thread_status::{StatusCell, ThreadStatus};
use crate::http_server::server;
use crate::peer::console_peer;
use crate::render::headless_renderer::HeadlessRenderer;
use crate::render::render_thread;
use crate::{error, info};

const LOG_TAG: &str = "bootstrap";

/// block until an actor left `Loading`, anything but `Running` is a startup failure
pub fn wait_running(name: &str, status: &StatusCell, timeout: Duration) -> Result<(), BannerError> {
    match status.wait_while_loading(timeout) {
        ThreadStatus::Running => {
            info!(LOG_TAG, "{} is running", name);
            Ok(())
        }
        ThreadStatus::Loading => Err(BannerError {
            code: ErrorCode::StartupError,
            msg: format!("{} did not start within {:?}", name, timeout),
        }),
        other => Err(BannerError {
            code: ErrorCode::StartupError,
            msg: format!("{} failed to start, status {:?}", name, other),
        }),
    }
}

// threads that are joined on shutdown, the console thread sits in a stdin read and is left behind
#[derive(Default)]
struct Workers {
    render: Option<JoinHandle<()>>,
    web: Option<JoinHandle<Result<(), BannerError>>>,
}

impl Workers {
    fn shutdown(self, trigger: &ShutdownTrigger) {
        trigger.fire();
        if let Some(handle) = self.web {
            match handle.join() {
                Ok(Ok(())) => {}
                Ok(Err(e)) => error!(LOG_TAG, "web peer ended with error: {}", e),
                Err(_) => error!(LOG_TAG, "web peer thread panicked"),
            }
        }
        if let Some(handle) = self.render {
            if handle.join().is_err() {
                error!(LOG_TAG, "render thread panicked");
            }
        }
    }
}

/// run the banner until an actor stops or the process is interrupted
pub fn run(settings: &Settings) -> Result<StopReason, BannerError> {
    let startup_timeout = settings.control.startup_timeout();
    let submit_timeout = settings.control.submit_timeout();

    let authority = RenderAuthority::new(RenderState::with_venue(&settings.meta.default_venue_name));
    let (trigger, cancel) = shutdown_channel();

    let ctrlc_trigger = trigger.clone();
    ctrlc::set_handler(move || {
        info!(LOG_TAG, "interrupted, shutting down");
        ctrlc_trigger.fire();
    })
    .map_err(|e| BannerError {
        code: ErrorCode::StartupError,
        msg: format!("cannot install ctrl-c handler: {e}"),
    })?;

    let mut workers = Workers::default();

    // render authority first, the peers need somebody to render their changes
    workers.render = Some(render_thread::spawn(
        authority.clone(),
        HeadlessRenderer::new(),
        settings.render.frame_interval(),
        cancel.clone(),
    ));
    if let Err(e) = wait_running("renderer", authority.status(), startup_timeout) {
        workers.shutdown(&trigger);
        return Err(e);
    }

    let (web_client, web_block) = control_block(PeerKind::Web, submit_timeout, cancel.clone());
    let web_status = web_client.status().clone();
    workers.web = Some(server::spawn(
        settings.web.web_host.clone(),
        settings.web.web_port,
        settings.web.workers,
        web_client,
        cancel.clone(),
    ));
    if let Err(e) = wait_running("web peer", &web_status, startup_timeout) {
        workers.shutdown(&trigger);
        return Err(e);
    }

    let (console_client, console_block) = control_block(PeerKind::Console, submit_timeout, cancel.clone());
    let console_status = console_client.status().clone();
    console_peer::spawn(console_client, settings.web.panel_url());
    if let Err(e) = wait_running("console peer", &console_status, startup_timeout) {
        workers.shutdown(&trigger);
        return Err(e);
    }

    let mut coordinator = Coordinator::new(authority, settings.control.coordinator_tick());
    coordinator.register(console_block);
    coordinator.register(web_block);
    let reason = coordinator.run(&cancel);

    info!(LOG_TAG, "shutting down: {:?}", reason);
    workers.shutdown(&trigger);
    Ok(reason)
}
