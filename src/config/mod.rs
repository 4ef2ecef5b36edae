//! Configuration loaded from `config/` files and `APP__*` environment variables

mod app_config;

pub use app_config::{AppConfig, DemoConfig, LogFormat, LoggingConfig};
