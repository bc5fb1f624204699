mod bootstrap;
mod common;
mod control;
mod entity;
mod http_server;
mod peer;
mod render;
mod util;
mod wire;

use common::logger::init_logger;
use common::setting::Settings;
use dotenv::dotenv;
use std::error::Error;

const LOG_TAG: &str = "main";

fn main() -> Result<(), Box<dyn Error>> {
    dotenv().ok();

    let settings = Settings::get()?;

    init_logger(&settings.env.log_level)?;
    info!(LOG_TAG, "{} starting, env: {:?}", settings.meta.application_name, settings.env.env);
    debug!(LOG_TAG, "settings: {:?}", settings);

    let reason = bootstrap::run(settings)?;
    info!(LOG_TAG, "exited: {:?}", reason);
    Ok(())
}
