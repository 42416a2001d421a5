//! Library side of the `timecentric` binary: the query service and the
//! file-to-file commands, kept here so they can be tested without a process.

pub mod commands;
pub mod server;

pub use server::{AppState, create_router, run_server};
