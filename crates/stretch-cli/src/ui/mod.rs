//! Ratatui front end.
//!
//! Keys:
//! - Space / s: start or pause
//! - p: pause
//! - n: skip to the next entry
//! - r: reset (reloads the routine file when one was given)
//! - l: logs
//! - h / ?: help
//! - q / Esc: quit

mod app;
mod render;
mod view_model;

pub(crate) use app::run_tui;
