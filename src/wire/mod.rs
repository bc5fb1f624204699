//! wire adapters: turn raw surface input into commands
//! - console_adapter: one console line
//! - web_adapter: one http query string

pub mod console_adapter;
pub mod web_adapter;
