//! Memory model for the script interpreter
//!
//! This module provides the core runtime abstractions:
//! - [`value`]: Runtime value representation (numbers, strings, lists, callables)
//! - [`stack`]: Call stack with frames and chained variable scopes
//!
//! # Sharing
//!
//! Values are reference counted with `Rc`, never `Arc`: an interpreter and
//! everything it allocates stay on the thread that created them.

pub mod stack;
pub mod value;
