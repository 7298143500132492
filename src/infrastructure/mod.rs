// Infrastructure layer - External dependencies and adapters
pub mod config;
pub mod event_log;
pub mod webdriver;
