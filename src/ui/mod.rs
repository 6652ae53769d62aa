//! Terminal user interface built on [ratatui](https://github.com/ratatui-org/ratatui).
//!
//! The coverage viewer is organized into three layers:
//!
//! - **[`app`]**: application state, keyboard event loop, pane focus, run selection
//! - **[`panes`]**: stateless render functions for each visible pane (runs,
//!   source, output, status bar)
//! - **[`theme`]**: centralized color palette used by all panes
//!
//! The entry point for consumers is [`App`]: build it from a
//! [`BatchReport`](crate::runner::BatchReport) and call [`App::run`] to start
//! the event loop.
//!
//! [`App::run`]: app::App::run

pub mod app;
pub mod panes;
pub mod theme;

pub use app::App;
