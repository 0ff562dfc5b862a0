//! Console submit handler for development. Logs submitted values to tracing output.

use async_trait::async_trait;
use formwright_application::{SubmitError, SubmitHandler};
use formwright_domain::FieldValue;
use tracing::info;

/// Development submit handler that logs the submitted values as JSON.
#[derive(Clone)]
pub struct ConsoleSubmitHandler {
    form: String,
}

impl ConsoleSubmitHandler {
    /// Creates a console handler labelled with the form name.
    #[must_use]
    pub fn new(form: impl Into<String>) -> Self {
        Self { form: form.into() }
    }
}

#[async_trait]
impl SubmitHandler for ConsoleSubmitHandler {
    async fn submit(&self, values: FieldValue) -> Result<(), SubmitError> {
        let payload = serde_json::to_string_pretty(&values)
            .map_err(|error| SubmitError::new(format!("failed to encode values: {error}")))?;

        info!(
            form = %self.form,
            "--- SUBMISSION (console) ---\nForm: {}\n\n{}\n--- END SUBMISSION ---",
            self.form,
            payload
        );

        Ok(())
    }
}
