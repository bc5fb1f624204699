pub mod headless_renderer;
pub mod render_thread;
pub mod traits;
