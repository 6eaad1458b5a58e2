pub mod config;
pub mod config_path;
pub mod error;
pub mod http;
pub mod store;
pub mod webhook;
