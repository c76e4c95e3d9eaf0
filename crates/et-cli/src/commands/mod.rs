//! CLI subcommand implementations.

pub mod demo;
pub mod recommend;
pub mod register;
pub mod status;
pub mod train;
pub mod util;
