//! ElectroTrack CLI library.
//!
//! This crate provides the CLI interface for hydration recommendations.

mod cli;
pub mod commands;
mod config;

pub use cli::{Cli, Commands, RecommendArgs, RegisterArgs};
pub use config::Config;
