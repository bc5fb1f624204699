//! entities
//! - bo: objects passed between threads
//! - dto: objects leaving the process

pub mod bo;
pub mod dto;
