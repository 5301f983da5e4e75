// src/dashboard/mod.rs
mod render;
mod state;

pub use render::{elapsed_since, format_elapsed, partition, render_page, up_summary, PageView};
pub use state::Dashboard;
