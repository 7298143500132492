// Main entry point - Dependency injection and supervisor startup
mod application;
mod domain;
mod infrastructure;

use std::process::ExitCode;
use std::sync::Arc;

use crate::application::supervisor::{RunOutcome, SessionSupervisor};
use crate::infrastructure::config::load_kiosk_config;
use crate::infrastructure::event_log::EventLog;
use crate::infrastructure::webdriver::WebDriverSurfaceFactory;

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    // Load configuration; a bad dashboard list or blank credentials means
    // the rotation loop never starts
    let config = match load_kiosk_config() {
        Ok(config) => Arc::new(config),
        Err(e) => {
            tracing::error!(error = %e, "configuration rejected");
            return ExitCode::from(2);
        }
    };

    let events = match EventLog::open(&config.event_log) {
        Ok(events) => events,
        Err(e) => {
            tracing::error!(error = %e, path = %config.event_log, "could not open event log");
            return ExitCode::from(2);
        }
    };

    // Create the surface factory (infrastructure layer)
    let factory = Arc::new(WebDriverSurfaceFactory::new(config.surface.clone()));

    // Run the supervisor (application layer)
    tracing::info!(
        dashboards = config.dashboards.len(),
        switch_interval_minutes = config.rotation.switch_interval_minutes,
        "starting kiosk rotation supervisor"
    );
    let mut supervisor = SessionSupervisor::new(config, factory, events);

    match supervisor.run().await {
        RunOutcome::OperatorShutdown => ExitCode::SUCCESS,
        RunOutcome::RetriesExhausted => ExitCode::from(1),
    }
}
