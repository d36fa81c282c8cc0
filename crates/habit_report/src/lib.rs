pub mod app;
pub mod render;

pub use crate::app::{run, run_with, AppConfig, OutputFormat};
pub use crate::render::render_text;
