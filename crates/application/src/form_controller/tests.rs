use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::json;
use tokio::sync::Mutex;

use formwright_core::AppError;
use formwright_domain::{FieldErrorKind, FieldPath, FieldValue, FormDefinition};

use crate::form_catalog::{profile_form, registration_form};
use crate::{
    FormController, FormEvent, FormOptions, RegistryMode, SUBMIT_FALLBACK_MESSAGE,
    SubmissionPhase, SubmitError, SubmitHandler, SubmitOutcome, ValidationMode,
};

#[derive(Default)]
struct CountingSubmitHandler {
    calls: AtomicUsize,
    received: Mutex<Vec<FieldValue>>,
}

#[async_trait]
impl SubmitHandler for CountingSubmitHandler {
    async fn submit(&self, values: FieldValue) -> Result<(), SubmitError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        self.received.lock().await.push(values);
        Ok(())
    }
}

struct FailingSubmitHandler {
    message: Option<&'static str>,
}

#[async_trait]
impl SubmitHandler for FailingSubmitHandler {
    async fn submit(&self, _values: FieldValue) -> Result<(), SubmitError> {
        Err(match self.message {
            Some(message) => SubmitError::new(message),
            None => SubmitError::silent(),
        })
    }
}

fn path(value: &str) -> FieldPath {
    FieldPath::parse(value).unwrap_or_else(|error| panic!("invalid test path: {error}"))
}

fn profile() -> FormDefinition {
    let start = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap_or_else(|| panic!("invalid test date"));
    profile_form(start).unwrap_or_else(|error| panic!("profile failed to build: {error}"))
}

async fn change(form: &FormController, field: &str, value: impl Into<FieldValue>) {
    form.change(field, value)
        .await
        .unwrap_or_else(|error| panic!("change of '{field}' failed: {error}"));
}

async fn fill_valid_profile(form: &FormController) {
    change(form, "firstName", "Ada").await;
    change(form, "lastName", "Lovelace").await;
    change(form, "email", "ada@example.com").await;
    change(form, "age", 36).await;
    change(form, "gender", "female").await;
    change(form, "address.city", "London").await;
    change(form, "address.state", "Greater London").await;
    change(form, "hobbies.0.name", "chess").await;
}

async fn submit(form: &FormController, handler: &dyn SubmitHandler) -> SubmitOutcome {
    form.submit(handler)
        .await
        .unwrap_or_else(|error| panic!("submission broke the state machine: {error}"))
}

#[tokio::test]
async fn double_submit_invokes_handler_once() {
    let form = FormController::new(profile(), FormOptions::default());
    fill_valid_profile(&form).await;
    let handler = CountingSubmitHandler::default();

    let (first, second) = tokio::join!(form.submit(&handler), form.submit(&handler));
    let mut outcomes = vec![first, second]
        .into_iter()
        .map(|outcome| outcome.unwrap_or_else(|error| panic!("submit failed: {error}")))
        .collect::<Vec<_>>();
    outcomes.sort_by_key(|outcome| matches!(outcome, SubmitOutcome::Succeeded));

    assert_eq!(outcomes, vec![SubmitOutcome::Ignored, SubmitOutcome::Succeeded]);
    assert_eq!(handler.calls.load(Ordering::SeqCst), 1);
    assert!(!form.state().await.is_submitting);
}

#[tokio::test]
async fn valid_submission_walks_phases_in_order() {
    let form = FormController::new(profile(), FormOptions::default());
    fill_valid_profile(&form).await;
    let mut events = form.subscribe();
    let handler = CountingSubmitHandler::default();

    assert_eq!(form.state().await.phase, SubmissionPhase::Idle);
    assert_eq!(submit(&form, &handler).await, SubmitOutcome::Succeeded);

    let mut phases = Vec::new();
    while let Ok(event) = events.try_recv() {
        if let FormEvent::PhaseChanged {
            phase,
            is_submitting,
        } = event
        {
            phases.push((phase, is_submitting));
        }
    }
    assert_eq!(
        phases,
        vec![
            (SubmissionPhase::Validating, true),
            (SubmissionPhase::Submitting, true),
            (SubmissionPhase::Succeeded, false),
            (SubmissionPhase::Idle, false),
        ]
    );

    let received = handler.received.lock().await;
    assert_eq!(received.len(), 1);
    assert_eq!(
        received[0].get(&path("address.city")),
        Some(&FieldValue::text("London"))
    );
}

#[tokio::test]
async fn invalid_submission_is_rejected_without_calling_handler() {
    let form = FormController::new(profile(), FormOptions::default());
    let handler = CountingSubmitHandler::default();

    let outcome = submit(&form, &handler).await;
    let SubmitOutcome::Rejected(errors) = outcome else {
        panic!("expected rejection, got {outcome:?}");
    };
    assert_eq!(
        errors.message(&path("firstName")),
        Some("First name is required")
    );
    assert_eq!(handler.calls.load(Ordering::SeqCst), 0);

    let state = form.state().await;
    assert_eq!(state.errors, errors);
    assert_eq!(state.phase, SubmissionPhase::Idle);
    assert_eq!(state.submit_count, 1);
}

#[tokio::test]
async fn handler_failure_becomes_root_error_and_allows_retry() {
    let form = FormController::new(profile(), FormOptions::default());
    fill_valid_profile(&form).await;

    let failing = FailingSubmitHandler {
        message: Some("Simulated server error"),
    };
    assert_eq!(
        submit(&form, &failing).await,
        SubmitOutcome::Failed("Simulated server error".to_owned())
    );
    let errors = form.errors().await;
    let root = errors.root().unwrap_or_else(|| panic!("root error missing"));
    assert_eq!(root.kind(), FieldErrorKind::Submission);
    assert_eq!(root.message(), "Simulated server error");

    let silent = FailingSubmitHandler { message: None };
    assert_eq!(
        submit(&form, &silent).await,
        SubmitOutcome::Failed(SUBMIT_FALLBACK_MESSAGE.to_owned())
    );

    let handler = CountingSubmitHandler::default();
    assert_eq!(submit(&form, &handler).await, SubmitOutcome::Succeeded);
    assert!(form.errors().await.is_empty());
}

#[tokio::test]
async fn removing_first_of_two_hobbies_keeps_the_second() {
    let form = FormController::new(profile(), FormOptions::default());
    let handler = CountingSubmitHandler::default();
    let second = form
        .append("hobbies", json!({ "name": "chess" }))
        .await
        .unwrap_or_else(|error| panic!("append failed: {error}"));

    let outcome = submit(&form, &handler).await;
    assert!(matches!(outcome, SubmitOutcome::Rejected(_)));
    assert!(form.errors().await.contains(&path("hobbies.0.name")));

    let entries = form
        .entries("hobbies")
        .await
        .unwrap_or_else(|error| panic!("entries failed: {error}"));
    let removed = form.remove("hobbies", entries[0].id).await;
    assert_eq!(removed.ok(), Some(FieldValue::from(json!({ "name": "" }))));

    let entries = form
        .entries("hobbies")
        .await
        .unwrap_or_else(|error| panic!("entries failed: {error}"));
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].id, second);
    assert_eq!(
        form.value("hobbies").await.ok().flatten(),
        Some(FieldValue::from(json!([{ "name": "chess" }])))
    );

    let errors = form.errors().await;
    assert!(!errors.contains(&path("hobbies.0.name")));
    assert!(!errors.contains(&path("hobbies.1.name")));
    assert!(!errors.contains(&path("hobbies")));
}

#[tokio::test]
async fn removing_the_last_hobby_violates_the_minimum() {
    let form = FormController::new(profile(), FormOptions::default());
    let entries = form
        .entries("hobbies")
        .await
        .unwrap_or_else(|error| panic!("entries failed: {error}"));

    let result = form.remove("hobbies", entries[0].id).await;
    assert!(matches!(
        result,
        Err(AppError::MinimumCountViolation { minimum: 1, .. })
    ));
    assert!(matches!(
        form.entries("tags").await,
        Err(AppError::NotFound(_))
    ));
}

async fn entries(form: &FormController) -> Vec<crate::FieldArrayEntry> {
    form.entries("hobbies")
        .await
        .unwrap_or_else(|error| panic!("entries failed: {error}"))
}

#[tokio::test]
async fn writing_the_whole_hobby_list_resyncs_entries_and_errors() {
    let form = FormController::new(profile(), FormOptions::with_mode(ValidationMode::OnChange));
    form.append("hobbies", json!({ "name": "" }))
        .await
        .unwrap_or_else(|error| panic!("append failed: {error}"));
    change(&form, "hobbies.1.name", "").await;
    assert_eq!(
        form.errors().await.message(&path("hobbies.1.name")),
        Some("Hobby name is required")
    );

    change(&form, "hobbies", json!([{ "name": "a" }])).await;
    assert_eq!(entries(&form).await.len(), 1);
    assert!(!form.errors().await.contains(&path("hobbies.1.name")));

    change(&form, "hobbies", json!([{ "name": "a" }, { "name": "b" }])).await;
    let listed = entries(&form).await;
    assert_eq!(listed.len(), 2);

    let removed = form.remove("hobbies", listed[0].id).await;
    assert_eq!(removed.ok(), Some(FieldValue::from(json!({ "name": "a" }))));
    form.append("hobbies", json!({ "name": "c" }))
        .await
        .unwrap_or_else(|error| panic!("append failed: {error}"));

    let listed = entries(&form).await;
    assert_eq!(
        listed.iter().map(|entry| entry.index).collect::<Vec<_>>(),
        vec![0, 1]
    );
    assert_eq!(
        form.value("hobbies").await.ok().flatten(),
        Some(FieldValue::from(json!([{ "name": "b" }, { "name": "c" }])))
    );
}

#[tokio::test]
async fn appended_hobby_does_not_inherit_a_removed_rows_blur() {
    let form = FormController::new(profile(), FormOptions::with_mode(ValidationMode::OnTouched));
    form.append("hobbies", json!({ "name": "x" }))
        .await
        .unwrap_or_else(|error| panic!("append failed: {error}"));
    let blurred = form.blur("hobbies.1.name").await;
    assert!(matches!(blurred, Ok(true)));

    let first = entries(&form).await[0].id;
    let removed = form.remove("hobbies", first).await;
    assert!(removed.is_ok());
    form.append("hobbies", json!({ "name": "y" }))
        .await
        .unwrap_or_else(|error| panic!("append failed: {error}"));

    change(&form, "hobbies.1.name", "").await;
    assert!(form.errors().await.is_empty());

    change(&form, "hobbies.0.name", "").await;
    assert_eq!(
        form.errors().await.message(&path("hobbies.0.name")),
        Some("Hobby name is required")
    );
}

#[tokio::test]
async fn referral_follows_subscription_without_flagging_untouched_field() {
    let form = FormController::new(profile(), FormOptions::with_mode(ValidationMode::OnChange));
    let referral = path("referral");
    let handler = CountingSubmitHandler::default();
    fill_valid_profile(&form).await;

    assert!(!form.is_visible("referral").await.unwrap_or(true));
    change(&form, "subscribe", true).await;
    assert!(form.is_visible("referral").await.unwrap_or(false));
    assert!(!form.errors().await.contains(&referral));

    let outcome = submit(&form, &handler).await;
    let SubmitOutcome::Rejected(errors) = outcome else {
        panic!("expected rejection, got {outcome:?}");
    };
    assert_eq!(
        errors.message(&referral),
        Some("Referral is required when subscribed")
    );
    assert_eq!(handler.calls.load(Ordering::SeqCst), 0);

    change(&form, "subscribe", false).await;
    assert!(form.errors().await.is_empty());
    assert!(!form.is_visible("referral").await.unwrap_or(true));

    change(&form, "subscribe", true).await;
    assert!(!form.errors().await.contains(&referral));

    change(&form, "referral", "   ").await;
    assert_eq!(
        form.errors().await.message(&referral),
        Some("Referral is required when subscribed")
    );

    change(&form, "referral", "a friend").await;
    assert!(form.errors().await.is_empty());
    assert_eq!(submit(&form, &handler).await, SubmitOutcome::Succeeded);
}

#[tokio::test]
async fn on_change_mode_validates_only_the_changed_field() {
    let definition =
        registration_form().unwrap_or_else(|error| panic!("registration failed to build: {error}"));
    let form = FormController::new(definition, FormOptions::with_mode(ValidationMode::OnChange));

    change(&form, "fname", "Al").await;
    let errors = form.errors().await;
    assert_eq!(errors.len(), 1);
    assert_eq!(
        errors.message(&path("fname")),
        Some("First name must be at least 3 characters long")
    );

    change(&form, "age", "101").await;
    let errors = form.errors().await;
    assert_eq!(errors.len(), 2);
    assert_eq!(
        errors.message(&path("age")),
        Some("Age must be less than or equal to 100")
    );

    change(&form, "fname", "Alice").await;
    assert!(!form.errors().await.contains(&path("fname")));
}

#[tokio::test]
async fn on_blur_mode_waits_for_blur() {
    let form = FormController::new(profile(), FormOptions::with_mode(ValidationMode::OnBlur));
    change(&form, "email", "nope").await;
    assert!(form.errors().await.is_empty());

    let blurred = form.blur("email").await;
    assert!(matches!(blurred, Ok(true)));
    assert_eq!(
        form.errors().await.message(&path("email")),
        Some("Invalid email format")
    );
}

#[tokio::test]
async fn trigger_validates_on_demand() {
    let form = FormController::new(profile(), FormOptions::default());
    let valid = form.trigger(Some("lastName")).await;
    assert!(matches!(valid, Ok(false)));
    assert_eq!(form.errors().await.len(), 1);

    fill_valid_profile(&form).await;
    assert!(matches!(form.trigger(None).await, Ok(true)));
    assert!(form.errors().await.is_empty());
}

#[tokio::test]
async fn unknown_fields_depend_on_registry_mode() {
    let permissive = FormController::new(profile(), FormOptions::default());
    assert!(matches!(permissive.change("nickname", "ada").await, Ok(false)));

    let strict = FormController::new(
        profile(),
        FormOptions {
            registry_mode: RegistryMode::Strict,
            ..FormOptions::default()
        },
    );
    assert!(matches!(
        strict.change("nickname", "ada").await,
        Err(AppError::UnknownField(_))
    ));
}

#[tokio::test]
async fn reset_restores_defaults_and_clears_state() {
    let definition = profile();
    let defaults = definition.defaults().clone();
    let form = FormController::new(definition, FormOptions::default());
    let mut events = form.subscribe();
    let handler = CountingSubmitHandler::default();

    change(&form, "firstName", "Ada").await;
    let outcome = submit(&form, &handler).await;
    assert!(matches!(outcome, SubmitOutcome::Rejected(_)));
    assert!(form.state().await.is_dirty);

    let reset = form.reset(None).await;
    assert!(reset.is_ok());
    let state = form.state().await;
    assert_eq!(state.values, defaults);
    assert!(state.errors.is_empty());
    assert!(state.touched.is_empty());
    assert_eq!(state.submit_count, 0);
    assert!(!state.is_dirty);

    let mut saw_reset = false;
    while let Ok(event) = events.try_recv() {
        saw_reset |= event == FormEvent::Reset;
    }
    assert!(saw_reset);
}
