pub mod command_bo;
pub mod control_bo;
pub mod render_state_bo;
pub mod thread_status;
