// Infrastructure module - External dependencies and adapters
pub mod ws;
pub mod logging;
pub mod config;
