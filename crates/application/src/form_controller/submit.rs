use super::*;

/// Root message used when the handler fails without one.
pub const SUBMIT_FALLBACK_MESSAGE: &str = "An unexpected error occurred";

impl FormController {
    /// Runs the submission pipeline: full validation, then the external
    /// handler when the form is valid.
    ///
    /// A request arriving while another submission is in flight is ignored.
    /// Handler failures are stored at the root path and reported as
    /// [`SubmitOutcome::Failed`]; they never surface as `Err`.
    pub async fn submit(&self, handler: &dyn SubmitHandler) -> AppResult<SubmitOutcome> {
        let name = self.definition.name();
        let values = {
            let mut state = self.state.lock().await;
            if state.submission.is_submitting() {
                warn!(form = %name, "submission already in flight; request ignored");
                return Ok(SubmitOutcome::Ignored);
            }

            state.submission.transition(SubmissionPhase::Validating)?;
            self.emit_phase(SubmissionPhase::Validating);
            if state.errors.remove(&ErrorMap::root_path()).is_some() {
                self.emit(FormEvent::ErrorsChanged {
                    errors: state.errors.clone(),
                });
            }
            info!(
                form = %name,
                attempt = state.submission.submit_count(),
                "submission validating"
            );
            state.registry.values().clone()
        };

        let mut errors = self.engine.validate_with_async_checks(&values).await;

        {
            let mut state = self.state.lock().await;
            for dependent in &mut state.dependents {
                dependent.filter_errors(&mut errors);
                dependent.take_pending_revalidation();
            }

            let before = state.errors.clone();
            state.errors = errors.clone();
            self.emit_errors_if_changed(&before, &state);

            if !errors.is_empty() {
                state.submission.transition(SubmissionPhase::Rejected)?;
                self.emit_phase(SubmissionPhase::Rejected);
                state.submission.transition(SubmissionPhase::Idle)?;
                self.emit_phase(SubmissionPhase::Idle);
                info!(form = %name, error_count = errors.len(), "submission rejected");
                return Ok(SubmitOutcome::Rejected(errors));
            }

            state.submission.transition(SubmissionPhase::Submitting)?;
            self.emit_phase(SubmissionPhase::Submitting);
            info!(form = %name, "submission handed to handler");
        }

        let result = handler.submit(values).await;

        let mut state = self.state.lock().await;
        let outcome = match result {
            Ok(()) => {
                state.submission.transition(SubmissionPhase::Succeeded)?;
                self.emit_phase(SubmissionPhase::Succeeded);
                info!(form = %name, "submission succeeded");
                SubmitOutcome::Succeeded
            }
            Err(error) => {
                state.submission.transition(SubmissionPhase::Failed)?;
                self.emit_phase(SubmissionPhase::Failed);
                let message = error
                    .message()
                    .filter(|message| !message.trim().is_empty())
                    .unwrap_or(SUBMIT_FALLBACK_MESSAGE)
                    .to_owned();
                warn!(form = %name, error = %message, "submission failed");

                state.errors.set_root(FieldError::new(
                    FieldErrorKind::Submission,
                    message.clone(),
                ));
                self.emit(FormEvent::ErrorsChanged {
                    errors: state.errors.clone(),
                });
                SubmitOutcome::Failed(message)
            }
        };

        state.submission.transition(SubmissionPhase::Idle)?;
        self.emit_phase(SubmissionPhase::Idle);
        Ok(outcome)
    }
}
