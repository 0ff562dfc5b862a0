//! Formwright playground: drives the catalog forms through scripted sessions.

#![forbid(unsafe_code)]

mod playground_config;
mod sessions;

use formwright_core::AppError;
use formwright_infrastructure::SimulatedApiSubmitHandler;
use tracing::info;

use crate::playground_config::{PlaygroundConfig, init_tracing};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = PlaygroundConfig::load()?;
    let handler =
        SimulatedApiSubmitHandler::new(config.submit_delay(), config.failure_rate, config.seed)?;

    info!(
        forms = ?config.forms,
        validation_mode = config.validation_mode.as_str(),
        submit_delay_ms = config.submit_delay_ms,
        failure_rate = config.failure_rate,
        seed = ?config.seed,
        "formwright-playground started"
    );

    for name in &config.forms {
        sessions::run(name, config.form_options(), &handler).await?;
    }

    Ok(())
}
