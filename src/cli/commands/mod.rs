//! CLI Commands

pub mod config;
pub mod generate;
pub mod tag;
