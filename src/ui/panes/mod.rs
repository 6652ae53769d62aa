//! TUI pane rendering modules
//!
//! This module provides the rendering logic for all visual panes in the
//! coverage viewer.
//!
//! # Pane Modules
//!
//! - [`runs`]: One row per input file with its coverage percentage
//! - [`source`]: Script source with syntax highlighting and covered lines marked
//! - [`output`]: Output printed by the selected run
//! - [`status`]: Status bar with keybindings and the selected run's summary
//!
//! Each pane module exports a stateless `render_*` function; scroll offsets
//! are owned by [`App`](crate::ui::App).

pub mod output;
pub mod runs;
pub mod source;
pub mod status;

pub use output::render_output_pane;
pub use runs::render_runs_pane;
pub use source::render_source_pane;
pub use status::render_status_bar;
