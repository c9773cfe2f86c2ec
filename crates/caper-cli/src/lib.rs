//! Caper CLI library: command implementations shared by the `caper` binary
//! and its integration tests.

pub mod cli;
pub mod commands;
