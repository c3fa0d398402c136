pub mod commands;
pub mod display;
pub mod plan;

pub use commands::CliArgs;
