//! renderer without a display, logs what a screen would show

use super::traits::Renderer;
use crate::common::error::RenderError;
use crate::entity::bo::render_state_bo::RenderState;
use crate::info;
use crate::util::time::format_12h;

const LOG_TAG: &str = "headless_renderer";

#[derive(Debug, Default)]
pub struct HeadlessRenderer {
    frames: u64,
    last: Option<RenderState>,
    // stop after this many frames, unlimited when None
    frame_limit: Option<u64>,
}

impl HeadlessRenderer {
    pub fn new() -> Self {
        HeadlessRenderer::default()
    }
}

#[cfg(test)]
impl HeadlessRenderer {
    pub fn with_frame_limit(frame_limit: u64) -> Self {
        HeadlessRenderer {
            frame_limit: Some(frame_limit),
            ..HeadlessRenderer::default()
        }
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// last drawn state
    pub fn last(&self) -> Option<&RenderState> {
        self.last.as_ref()
    }
}

impl Renderer for HeadlessRenderer {
    fn init(&mut self) -> Result<(), RenderError> {
        info!(LOG_TAG, "headless renderer ready");
        Ok(())
    }

    fn draw_frame(&mut self, state: &RenderState) -> Result<(), RenderError> {
        self.frames += 1;
        if self.last.as_ref() == Some(state) {
            return Ok(());
        }

        let colors: Vec<String> = state
            .colors
            .iter()
            .map(|c| {
                let [r, g, b] = c.rgb();
                format!("{}({:.1},{:.1},{:.1})", c.name(), r, g, b)
            })
            .collect();
        info!(
            LOG_TAG,
            "frame {}: {} mode, colors [{}], flags {:#04x}, venue \"{}\", Showtime: {}",
            self.frames,
            if state.slideshow() { "slideshow" } else { "banner" },
            colors.join(", "),
            state.flags.bits(),
            state.venue_name,
            format_12h(state.downbeat_minutes)
        );
        self.last = Some(state.clone());
        Ok(())
    }

    fn should_close(&self) -> bool {
        self.frame_limit.is_some_and(|limit| self.frames >= limit)
    }
}
