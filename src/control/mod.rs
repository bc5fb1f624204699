//! command synchronization core
//! - control_block: per peer single slot mailbox
//! - coordinator: applies pending commands, sole writer of the render authority
//! - render_authority: canonical render state and its snapshot accessor
//! - cancel: shutdown signal releasing every blocked peer

pub mod cancel;
pub mod control_block;
pub mod coordinator;
pub mod render_authority;
