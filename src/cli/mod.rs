//! CLI Layer
//!
//! Command implementations live under [`commands`]; argument parsing stays
//! in the binary.

pub mod commands;
