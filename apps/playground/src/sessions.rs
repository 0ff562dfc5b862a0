use formwright_application::form_catalog::{
    PLAIN_FORM, PROFILE_FORM, REGISTRATION_FORM, REGISTRATION_RULES_FORM, form_by_name,
    icecream_option,
};
use formwright_application::{
    FormController, FormEvent, FormOptions, SubmitHandler, SubmitOutcome,
};
use formwright_core::{AppError, AppResult};
use formwright_domain::FieldValue;
use formwright_infrastructure::ConsoleSubmitHandler;
use serde_json::json;
use tokio::sync::broadcast::Receiver;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

/// Runs the scripted session for the catalog form `name`.
pub async fn run(name: &str, options: FormOptions, handler: &dyn SubmitHandler) -> AppResult<()> {
    let form = FormController::new(form_by_name(name)?, options);
    let watcher = tokio::spawn(watch_events(name.to_owned(), form.subscribe()));

    info!(form = %name, mode = options.mode.as_str(), "session started");
    match name {
        PLAIN_FORM => plain_session(&form).await?,
        REGISTRATION_FORM | REGISTRATION_RULES_FORM => registration_session(&form, handler).await?,
        PROFILE_FORM => profile_session(&form, handler).await?,
        _ => return Err(AppError::NotFound(format!("no session for form '{name}'"))),
    }

    drop(form);
    if let Err(error) = watcher.await {
        warn!(form = %name, error = %error, "event watcher stopped abnormally");
    }
    info!(form = %name, "session finished");
    Ok(())
}

async fn watch_events(form: String, mut events: Receiver<FormEvent>) {
    loop {
        match events.recv().await {
            Ok(FormEvent::PhaseChanged {
                phase,
                is_submitting,
            }) => debug!(form = %form, phase = phase.as_str(), is_submitting, "phase changed"),
            Ok(FormEvent::ErrorsChanged { errors }) => {
                debug!(form = %form, error_count = errors.len(), "errors changed");
            }
            Ok(FormEvent::ValueChanged { path }) => debug!(form = %form, path = %path, "value changed"),
            Ok(FormEvent::Reset) => debug!(form = %form, "form reset"),
            Err(RecvError::Lagged(skipped)) => {
                warn!(form = %form, skipped, "event watcher lagged");
            }
            Err(RecvError::Closed) => break,
        }
    }
}

async fn report(form: &FormController, step: &str) -> AppResult<()> {
    let errors = form.errors().await;
    let encoded = serde_json::to_string(&errors)
        .map_err(|error| AppError::Internal(format!("failed to encode errors: {error}")))?;
    println!("[{}] {step}: {encoded}", form.definition().name());
    Ok(())
}

async fn submit_and_report(
    form: &FormController,
    handler: &dyn SubmitHandler,
    step: &str,
) -> AppResult<SubmitOutcome> {
    let outcome = form.submit(handler).await?;
    let label = match &outcome {
        SubmitOutcome::Ignored => "ignored",
        SubmitOutcome::Rejected(_) => "rejected",
        SubmitOutcome::Succeeded => "succeeded",
        SubmitOutcome::Failed(_) => "failed",
    };
    report(form, &format!("{step} ({label})")).await?;
    Ok(outcome)
}

async fn plain_session(form: &FormController) -> AppResult<()> {
    form.change("firstName", "Ada").await?;
    form.change("email", "ada@example.com").await?;
    form.change("password", "secret1").await?;
    form.change("gender", "female").await?;
    form.change("age", "36").await?;
    form.change("terms", true).await?;

    let console = ConsoleSubmitHandler::new(form.definition().name().as_str());
    submit_and_report(form, &console, "submit uncontrolled values").await?;
    Ok(())
}

async fn registration_session(form: &FormController, handler: &dyn SubmitHandler) -> AppResult<()> {
    submit_and_report(form, handler, "submit defaults").await?;

    form.change("fname", "admin").await?;
    form.change("email", "ada@").await?;
    form.change("password", "abcd").await?;
    form.change("age", "17").await?;
    report(form, "after invalid edits").await?;

    let chocolate = icecream_option("chocolate")
        .ok_or_else(|| AppError::NotFound("ice cream option 'chocolate' not found".to_owned()))?;
    form.change("fname", "Ada").await?;
    form.change("email", "ada@example.com").await?;
    form.change("password", "ada1").await?;
    form.change("age", "36").await?;
    form.change("terms", true).await?;
    form.change("icecream", FieldValue::List(vec![chocolate])).await?;
    report(form, "after fixes").await?;

    submit_and_report(form, handler, "submit valid values").await?;
    Ok(())
}

async fn profile_session(form: &FormController, handler: &dyn SubmitHandler) -> AppResult<()> {
    form.change("firstName", "Ada").await?;
    form.change("lastName", "Lovelace").await?;
    form.change("email", "ada@example.com").await?;
    form.change("age", 36).await?;
    form.change("gender", "female").await?;
    form.change("address.city", "London").await?;
    form.change("address.state", "Greater London").await?;
    form.change("hobbies.0.name", "chess").await?;

    let extra = form.append("hobbies", json!({ "name": "" })).await?;
    submit_and_report(form, handler, "submit with empty hobby").await?;
    form.remove("hobbies", extra).await?;
    report(form, "after removing empty hobby").await?;

    form.change("subscribe", true).await?;
    println!(
        "[{}] referral visible: {}",
        form.definition().name(),
        form.is_visible("referral").await?
    );
    submit_and_report(form, handler, "submit subscribed without referral").await?;

    form.change("referral", "newsletter").await?;
    report(form, "after entering referral").await?;
    submit_and_report(form, handler, "submit complete profile").await?;
    Ok(())
}
