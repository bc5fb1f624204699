//! web peer: venue control endpoint for the browser panel
//!
//! `GET /update.json?<query>` decodes the query into one command, waits for the coordinator
//! and answers with the resulting render state as json

use std::sync::{Mutex, MutexGuard};
use std::thread::{self, JoinHandle};

use actix_web::error::{ErrorInternalServerError, ErrorServiceUnavailable};
use actix_web::{get, web, App, HttpRequest, HttpResponse, HttpServer};

use crate::common::error::{BannerError, ControlError, ErrorCode};
use crate::control::cancel::CancelToken;
use crate::control::control_block::ControlClient;
use crate::entity::bo::command_bo::Command;
use crate::entity::bo::control_bo::ReplyBo;
use crate::entity::dto::status_dto::StatusDto;
use crate::wire::web_adapter::decode_query;
use crate::{debug, error, info, warn};

const LOG_TAG: &str = "http_server";

/// the web peer's control client, shared by all actix workers
/// the mutex keeps one command in flight, later requests queue behind it
pub struct WebPeer {
    client: Mutex<ControlClient>,
}

impl WebPeer {
    pub fn new(client: ControlClient) -> Self {
        WebPeer {
            client: Mutex::new(client),
        }
    }

    fn client(&self) -> MutexGuard<'_, ControlClient> {
        self.client.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// blocking, call from a blocking thread
    pub fn submit(&self, command: Command) -> Result<ReplyBo, ControlError> {
        self.client().submit(command)
    }
}

#[get("/update.json")]
async fn update(req: HttpRequest, peer: web::Data<WebPeer>) -> actix_web::Result<HttpResponse> {
    let command = decode_query(req.query_string());
    debug!(LOG_TAG, "query {:?} -> {}", req.query_string(), command);

    let peer = peer.into_inner();
    let reply = web::block(move || peer.submit(command))
        .await
        .map_err(ErrorInternalServerError)?
        .map_err(|e| {
            warn!(LOG_TAG, "update failed: {}", e);
            ErrorServiceUnavailable(e)
        })?;
    Ok(HttpResponse::Ok().json(StatusDto::from(&reply.snapshot)))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(update);
}

async fn serve(
    host: String,
    port: u16,
    workers: usize,
    peer: web::Data<WebPeer>,
    cancel: CancelToken,
) -> std::io::Result<()> {
    let app_peer = peer.clone();
    let server = HttpServer::new(move || App::new().app_data(app_peer.clone()).configure(configure))
        .workers(workers.max(1))
        // shutdown is driven by the cancel token
        .disable_signals()
        .bind((host.as_str(), port))?
        .run();

    info!(LOG_TAG, "web peer listening on {}:{}", host, port);
    peer.client().mark_running();

    let handle = server.handle();
    actix_web::rt::spawn(async move {
        let _ = actix_web::rt::task::spawn_blocking(move || cancel.wait()).await;
        info!(LOG_TAG, "stopping web server");
        handle.stop(true).await;
    });

    server.await
}

/// run the web peer on its own actix system thread
pub fn spawn(
    host: String,
    port: u16,
    workers: usize,
    client: ControlClient,
    cancel: CancelToken,
) -> JoinHandle<Result<(), BannerError>> {
    thread::spawn(move || {
        let peer = web::Data::new(WebPeer::new(client));
        let result = actix_web::rt::System::new().block_on(serve(host, port, workers, peer.clone(), cancel));

        match result {
            Ok(()) => {
                let client = peer.client();
                client.mark_stopping();
                info!(LOG_TAG, "web peer stopped");
                client.mark_stopped();
                Ok(())
            }
            Err(e) => {
                error!(LOG_TAG, "web server failed: {}", e);
                peer.client().mark_error();
                Err(BannerError {
                    code: ErrorCode::HttpError,
                    msg: e.to_string(),
                })
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::cancel::shutdown_channel;
    use crate::control::control_block::control_block;
    use crate::control::coordinator::Coordinator;
    use crate::control::render_authority::RenderAuthority;
    use crate::entity::bo::control_bo::PeerKind;
    use crate::entity::bo::render_state_bo::RenderState;
    use actix_web::http::StatusCode;
    use actix_web::test;
    use std::time::Duration;

    #[actix_web::test]
    async fn test_update_round_trip() {
        let (trigger, cancel) = shutdown_channel();
        let authority = RenderAuthority::new(RenderState::default());
        let mut coordinator = Coordinator::new(authority.clone(), Duration::from_millis(2));
        let (client, block) = control_block(PeerKind::Web, Some(Duration::from_secs(5)), cancel.clone());
        coordinator.register(block);
        client.mark_running();
        let runner = thread::spawn(move || coordinator.run(&cancel));

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(WebPeer::new(client)))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::get().uri("/update.json?c05").to_request();
        let status: StatusDto = test::call_and_read_body_json(&app, req).await;
        assert_eq!(status.red, 5);

        let req = test::TestRequest::get().uri("/update.json?vThe%20Forum").to_request();
        let status: StatusDto = test::call_and_read_body_json(&app, req).await;
        assert_eq!(status.name, "The Forum");
        assert_eq!(status.red, 5);

        let req = test::TestRequest::get().uri("/update.json?01").to_request();
        let status: StatusDto = test::call_and_read_body_json(&app, req).await;
        assert!(status.slideshow);

        // rejected and unrecognized queries still answer with the current state
        let req = test::TestRequest::get().uri("/update.json?t2500").to_request();
        let status: StatusDto = test::call_and_read_body_json(&app, req).await;
        assert_eq!(status.downbeat, 1200);
        let req = test::TestRequest::get().uri("/update.json").to_request();
        let status: StatusDto = test::call_and_read_body_json(&app, req).await;
        assert_eq!(status.name, "The Forum");

        assert_eq!(authority.snapshot().venue_name.as_str(), "The Forum");
        trigger.fire();
        runner.join().unwrap();
    }

    #[actix_web::test]
    async fn test_cancelled_is_unavailable() {
        let (trigger, cancel) = shutdown_channel();
        let (client, _block) = control_block(PeerKind::Web, None, cancel);
        client.mark_running();
        trigger.fire();

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(WebPeer::new(client)))
                .configure(configure),
        )
        .await;
        let req = test::TestRequest::get().uri("/update.json?c05").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
