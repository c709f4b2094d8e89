//! Command-line front end for vibedir sessions.
//!
//! The binary is a thin wrapper over [`cli::run`]; the interactive loop in
//! [`app`] reads from any `BufRead` so it can be driven from tests.

pub mod app;
pub mod cli;
pub mod commands;
