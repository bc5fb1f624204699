//! control peers, one per control surface
//! the web peer lives in http_server next to the actix app

pub mod console_peer;
