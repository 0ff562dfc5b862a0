//! Submit handler that imitates a slow, unreliable API.

use std::time::Duration;

use async_trait::async_trait;
use formwright_application::{SubmitError, SubmitHandler};
use formwright_core::{AppError, AppResult};
use formwright_domain::FieldValue;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Message reported when a simulated call fails.
pub const SIMULATED_FAILURE_MESSAGE: &str = "Simulated API error: please try again";

/// Waits for a fixed delay, then fails with probability `failure_rate`.
pub struct SimulatedApiSubmitHandler {
    delay: Duration,
    failure_rate: f64,
    rng: Mutex<StdRng>,
}

impl SimulatedApiSubmitHandler {
    /// Creates a handler. A `seed` makes the failure sequence reproducible.
    pub fn new(delay: Duration, failure_rate: f64, seed: Option<u64>) -> AppResult<Self> {
        if !(0.0..=1.0).contains(&failure_rate) {
            return Err(AppError::Validation(format!(
                "failure rate must be between 0 and 1, got {failure_rate}"
            )));
        }

        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Ok(Self {
            delay,
            failure_rate,
            rng: Mutex::new(rng),
        })
    }

    /// Returns the simulated latency.
    #[must_use]
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Returns the failure probability.
    #[must_use]
    pub fn failure_rate(&self) -> f64 {
        self.failure_rate
    }
}

#[async_trait]
impl SubmitHandler for SimulatedApiSubmitHandler {
    async fn submit(&self, values: FieldValue) -> Result<(), SubmitError> {
        let fails = self.rng.lock().await.gen_bool(self.failure_rate);
        tokio::time::sleep(self.delay).await;

        if fails {
            warn!(delay_ms = self.delay.as_millis(), "simulated api call failed");
            return Err(SubmitError::new(SIMULATED_FAILURE_MESSAGE));
        }

        info!(
            delay_ms = self.delay.as_millis(),
            fields = values.leaves().len(),
            "simulated api call succeeded"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use formwright_application::SubmitHandler;
    use formwright_core::AppError;
    use formwright_domain::FieldValue;

    use super::{SIMULATED_FAILURE_MESSAGE, SimulatedApiSubmitHandler};

    fn handler(failure_rate: f64, seed: u64) -> SimulatedApiSubmitHandler {
        SimulatedApiSubmitHandler::new(Duration::ZERO, failure_rate, Some(seed))
            .unwrap_or_else(|error| panic!("invalid handler: {error}"))
    }

    #[tokio::test]
    async fn certain_failure_reports_message() {
        let handler = handler(1.0, 7);
        let result = handler.submit(FieldValue::group([("age", FieldValue::from(18))])).await;
        let error = result.err().unwrap_or_else(|| panic!("expected failure"));
        assert_eq!(error.message(), Some(SIMULATED_FAILURE_MESSAGE));
    }

    #[tokio::test]
    async fn zero_failure_rate_always_succeeds() {
        let handler = handler(0.0, 7);
        for _ in 0..20 {
            assert!(handler.submit(FieldValue::Null).await.is_ok());
        }
    }

    #[tokio::test]
    async fn same_seed_gives_same_outcomes() {
        let first = handler(0.5, 42);
        let second = handler(0.5, 42);
        for _ in 0..16 {
            let left = first.submit(FieldValue::Null).await.is_ok();
            let right = second.submit(FieldValue::Null).await.is_ok();
            assert_eq!(left, right);
        }
    }

    #[test]
    fn out_of_range_failure_rate_is_rejected() {
        let result = SimulatedApiSubmitHandler::new(Duration::ZERO, 1.5, None);
        assert!(matches!(result, Err(AppError::Validation(_))));
    }
}
