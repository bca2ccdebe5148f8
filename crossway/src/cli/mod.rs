//! Command-line interface
//!
//! Argument definitions in [`args`], handlers in [`commands`].

pub mod args;
pub mod commands;
