use std::env;
use std::time::Duration;

use formwright_application::form_catalog::form_names;
use formwright_application::{FormOptions, ValidationMode};
use formwright_core::AppError;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone)]
pub struct PlaygroundConfig {
    pub forms: Vec<&'static str>,
    pub validation_mode: ValidationMode,
    pub submit_delay_ms: u64,
    pub failure_rate: f64,
    pub seed: Option<u64>,
}

impl PlaygroundConfig {
    pub fn load() -> Result<Self, AppError> {
        let requested = env::var("PLAYGROUND_FORM").unwrap_or_else(|_| "all".to_owned());
        let forms = match requested.trim() {
            "all" => form_names().to_vec(),
            name => match form_names().into_iter().find(|known| *known == name) {
                Some(known) => vec![known],
                None => {
                    return Err(AppError::Validation(format!(
                        "PLAYGROUND_FORM must be 'all' or one of {}, got '{name}'",
                        form_names().join(", ")
                    )));
                }
            },
        };

        let validation_mode = ValidationMode::parse(
            env::var("PLAYGROUND_VALIDATION_MODE")
                .unwrap_or_else(|_| ValidationMode::OnSubmit.as_str().to_owned())
                .trim(),
        )?;
        let submit_delay_ms = parse_env_u64("PLAYGROUND_SUBMIT_DELAY_MS", 250)?;
        let failure_rate = parse_env_f64("PLAYGROUND_FAILURE_RATE", 0.3)?;
        if !(0.0..=1.0).contains(&failure_rate) {
            return Err(AppError::Validation(format!(
                "PLAYGROUND_FAILURE_RATE must be between 0 and 1, got {failure_rate}"
            )));
        }

        let seed = env::var("PLAYGROUND_SEED")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .map(|value| {
                value.trim().parse::<u64>().map_err(|error| {
                    AppError::Validation(format!("invalid PLAYGROUND_SEED value '{value}': {error}"))
                })
            })
            .transpose()?;

        Ok(Self {
            forms,
            validation_mode,
            submit_delay_ms,
            failure_rate,
            seed,
        })
    }

    pub fn form_options(&self) -> FormOptions {
        FormOptions::with_mode(self.validation_mode)
    }

    pub fn submit_delay(&self) -> Duration {
        Duration::from_millis(self.submit_delay_ms)
    }
}

pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn parse_env_u64(name: &str, default: u64) -> Result<u64, AppError> {
    match env::var(name) {
        Ok(value) => value.trim().parse::<u64>().map_err(|error| {
            AppError::Validation(format!("invalid {name} value '{value}': {error}"))
        }),
        Err(_) => Ok(default),
    }
}

fn parse_env_f64(name: &str, default: f64) -> Result<f64, AppError> {
    match env::var(name) {
        Ok(value) => value.trim().parse::<f64>().map_err(|error| {
            AppError::Validation(format!("invalid {name} value '{value}': {error}"))
        }),
        Err(_) => Ok(default),
    }
}
