use formwright_core::{AppError, AppResult};
use formwright_domain::ErrorMap;
use serde::{Deserialize, Serialize};

/// Phase of the submission state machine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionPhase {
    /// Ready to accept a submit request.
    #[default]
    Idle,
    /// Full validation is running.
    Validating,
    /// Validation failed; the handler is not invoked.
    Rejected,
    /// The external handler is running.
    Submitting,
    /// The external handler completed.
    Succeeded,
    /// The external handler failed.
    Failed,
}

impl SubmissionPhase {
    /// Returns stable storage value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Validating => "validating",
            Self::Rejected => "rejected",
            Self::Submitting => "submitting",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        }
    }

    /// Returns whether the in-flight flag is set in this phase.
    #[must_use]
    pub fn is_submitting(&self) -> bool {
        matches!(self, Self::Validating | Self::Submitting)
    }

    /// Returns whether `next` is a legal successor of this phase.
    #[must_use]
    pub fn can_transition_to(&self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Idle, Self::Validating)
                | (Self::Validating, Self::Rejected | Self::Submitting)
                | (Self::Submitting, Self::Succeeded | Self::Failed)
                | (Self::Rejected | Self::Succeeded | Self::Failed, Self::Idle)
        )
    }
}

/// Submission state owned by one form instance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SubmissionState {
    phase: SubmissionPhase,
    submit_count: u32,
}

impl SubmissionState {
    /// Creates an idle state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current phase.
    #[must_use]
    pub fn phase(&self) -> SubmissionPhase {
        self.phase
    }

    /// Returns the in-flight flag.
    #[must_use]
    pub fn is_submitting(&self) -> bool {
        self.phase.is_submitting()
    }

    /// Returns how many submit attempts entered validation.
    #[must_use]
    pub fn submit_count(&self) -> u32 {
        self.submit_count
    }

    /// Returns whether at least one submit was attempted.
    #[must_use]
    pub fn is_submitted(&self) -> bool {
        self.submit_count > 0
    }

    /// Moves to `next`, failing with [`AppError::Conflict`] on an illegal edge.
    pub fn transition(&mut self, next: SubmissionPhase) -> AppResult<()> {
        if !self.phase.can_transition_to(next) {
            return Err(AppError::Conflict(format!(
                "submission cannot move from '{}' to '{}'",
                self.phase.as_str(),
                next.as_str()
            )));
        }

        if next == SubmissionPhase::Validating {
            self.submit_count = self.submit_count.saturating_add(1);
        }
        self.phase = next;
        Ok(())
    }

    /// Returns to a fresh idle state. Fails while a submission is in flight.
    pub fn reset(&mut self) -> AppResult<()> {
        if self.is_submitting() {
            return Err(AppError::Conflict(
                "cannot reset a form while a submission is in flight".to_owned(),
            ));
        }

        *self = Self::default();
        Ok(())
    }
}

/// Result of one submit request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// A submission was already in flight; nothing happened.
    Ignored,
    /// Validation failed; the handler was not invoked.
    Rejected(ErrorMap),
    /// The handler completed.
    Succeeded,
    /// The handler failed with the message stored at the root path.
    Failed(String),
}

#[cfg(test)]
mod tests {
    use formwright_core::AppError;

    use super::{SubmissionPhase, SubmissionState};

    #[test]
    fn successful_round_trip_sets_in_flight_only_in_middle_phases() {
        let mut state = SubmissionState::new();
        let mut observed = vec![(state.phase(), state.is_submitting())];
        for next in [
            SubmissionPhase::Validating,
            SubmissionPhase::Submitting,
            SubmissionPhase::Succeeded,
            SubmissionPhase::Idle,
        ] {
            let moved = state.transition(next);
            assert!(moved.is_ok());
            observed.push((state.phase(), state.is_submitting()));
        }

        assert_eq!(
            observed,
            vec![
                (SubmissionPhase::Idle, false),
                (SubmissionPhase::Validating, true),
                (SubmissionPhase::Submitting, true),
                (SubmissionPhase::Succeeded, false),
                (SubmissionPhase::Idle, false),
            ]
        );
        assert_eq!(state.submit_count(), 1);
    }

    #[test]
    fn illegal_edges_are_conflicts() {
        let mut state = SubmissionState::new();
        assert!(matches!(
            state.transition(SubmissionPhase::Submitting),
            Err(AppError::Conflict(_))
        ));

        let moved = state.transition(SubmissionPhase::Validating);
        assert!(moved.is_ok());
        assert!(matches!(
            state.transition(SubmissionPhase::Validating),
            Err(AppError::Conflict(_))
        ));
        assert!(matches!(state.reset(), Err(AppError::Conflict(_))));
    }

    #[test]
    fn rejected_and_failed_return_to_idle() {
        for terminal in [SubmissionPhase::Rejected, SubmissionPhase::Failed] {
            let mut state = SubmissionState::new();
            let path = if terminal == SubmissionPhase::Rejected {
                vec![SubmissionPhase::Validating, terminal, SubmissionPhase::Idle]
            } else {
                vec![
                    SubmissionPhase::Validating,
                    SubmissionPhase::Submitting,
                    terminal,
                    SubmissionPhase::Idle,
                ]
            };
            for next in path {
                assert!(state.transition(next).is_ok());
            }
            assert_eq!(state.phase(), SubmissionPhase::Idle);
            assert!(!state.is_submitting());
        }
    }
}
