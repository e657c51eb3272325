pub mod clean;
pub mod config;

pub use clean::CleanCommand;
pub use config::ConfigCommand;
