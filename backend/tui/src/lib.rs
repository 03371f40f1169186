//! TUI (Terminal User Interface) for AquaLabel.
//!
//! Exposes the ratatui screen and the state required to run "aqualabel scan".

pub mod app;
pub mod input;
pub mod render;
pub mod runner;
pub mod worker;

pub use app::AppState;
pub use input::{handle_key_event, Intent};
pub use render::draw_ui;
pub use runner::run;
pub use worker::InferenceWorker;
