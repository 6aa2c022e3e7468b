//! Core application infrastructure

pub mod cli;
pub mod config;
pub mod constants;
pub mod shutdown;
pub mod storage;

pub use crate::app::CoreApp;
pub use cli::{CliConfig, Commands};
pub use config::{AppConfig, ServerConfig};
pub use storage::AppStorage;

pub use crate::data::SqliteService;
pub use shutdown::ShutdownService;
