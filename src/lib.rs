pub mod app;
pub mod cli;
pub mod config;
pub mod highlight;
pub mod remote;
pub mod ui;

pub use config::{AppConfig, ConfigLoader, ConfigPaths};
