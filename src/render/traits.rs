use crate::common::error::RenderError;
use crate::entity::bo::render_state_bo::RenderState;

/// frame sink driven by the render thread
pub trait Renderer: Send {
    /// called once on the render thread before the first frame
    fn init(&mut self) -> Result<(), RenderError>;

    /// draw one frame from a snapshot of the render authority
    fn draw_frame(&mut self, state: &RenderState) -> Result<(), RenderError>;

    /// the output was closed, the render thread should stop
    fn should_close(&self) -> bool {
        false
    }
}
