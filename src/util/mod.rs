//! Text helpers shared by snapshot loading and outline printing.
//!
//! - **Sanitizing**: strip terminal control sequences from remote-sourced names
//! - **Width**: Unicode-aware measuring and truncation for terminal columns

mod text;

pub use text::{display_width, strip_control_chars, truncate_to_width};
