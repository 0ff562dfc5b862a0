//! Ready-made forms: a plain form without rules, a registration form in
//! both rule styles and a profile form with nested fields, a field array
//! and a dependent field.

use chrono::{NaiveDate, Utc};
use formwright_core::{AppError, AppResult};
use formwright_domain::{
    FieldDependency, FieldPath, FieldRules, FieldValue, FormDefinition, FormRules, Schema,
};
use serde_json::json;

/// Logical name of the plain form.
pub const PLAIN_FORM: &str = "plain";
/// Logical name of the schema-driven registration form.
pub const REGISTRATION_FORM: &str = "registration";
/// Logical name of the rule-driven registration form.
pub const REGISTRATION_RULES_FORM: &str = "registration_rules";
/// Logical name of the profile form.
pub const PROFILE_FORM: &str = "profile";

/// Selectable ice cream flavors as `(value, label)`.
pub const ICECREAM_OPTIONS: [(&str, &str); 3] = [
    ("chocolate", "Chocolate"),
    ("strawberry", "Strawberry"),
    ("vanilla", "Vanilla"),
];

const GENDERS: [&str; 3] = ["male", "female", "other"];
const NAME_PATTERN: &str = "^[A-Za-z]+$";
const PASSWORD_PATTERN: &str = r"^[A-Za-z\d]{4,}$";
const PASSWORD_MESSAGE: &str = "Password must contain at least one letter and one number";

/// Returns the logical names of every catalog form.
#[must_use]
pub fn form_names() -> [&'static str; 4] {
    [
        PLAIN_FORM,
        REGISTRATION_FORM,
        REGISTRATION_RULES_FORM,
        PROFILE_FORM,
    ]
}

/// Builds the catalog form named `name`.
pub fn form_by_name(name: &str) -> AppResult<FormDefinition> {
    match name {
        PLAIN_FORM => plain_form(),
        REGISTRATION_FORM => registration_form(),
        REGISTRATION_RULES_FORM => registration_rules_form(),
        PROFILE_FORM => profile_form(Utc::now().date_naive()),
        _ => Err(AppError::NotFound(format!("form '{name}' not found"))),
    }
}

/// Returns the value of one ice cream option as stored by the multi-select.
#[must_use]
pub fn icecream_option(value: &str) -> Option<FieldValue> {
    ICECREAM_OPTIONS
        .iter()
        .find(|(option, _)| *option == value)
        .map(|(option, label)| FieldValue::from(json!({ "value": option, "label": label })))
}

/// Uncontrolled form: values are collected but nothing is checked.
pub fn plain_form() -> AppResult<FormDefinition> {
    FormDefinition::new(
        PLAIN_FORM,
        "React Hook Forms",
        FormRules::new().build()?,
        FieldValue::from(json!({
            "firstName": "",
            "email": "",
            "password": "",
            "gender": "",
            "age": "",
            "terms": false
        })),
    )
}

fn registration_defaults() -> FieldValue {
    FieldValue::from(json!({
        "fname": "",
        "email": "",
        "password": "",
        "gender": "male",
        "age": 18,
        "terms": false,
        "icecream": []
    }))
}

fn is_allowed_name(value: &FieldValue) -> bool {
    value
        .as_text()
        .is_none_or(|name| !name.eq_ignore_ascii_case("admin"))
}

fn has_letter_and_digit(value: &FieldValue) -> bool {
    value.as_text().is_some_and(|password| {
        password.chars().any(|c| c.is_ascii_alphabetic())
            && password.chars().any(|c| c.is_ascii_digit())
    })
}

fn is_checked(value: &FieldValue) -> bool {
    value.as_bool() == Some(true)
}

/// Registration form validated by a declarative schema.
pub fn registration_form() -> AppResult<FormDefinition> {
    let icecream_item = Schema::object([("value", Schema::string()), ("label", Schema::string())]);
    let schema = Schema::object([
        (
            "fname",
            Schema::string()
                .min(3, "First name must be at least 3 characters long")
                .max(20, "First name must be less than 20 characters")
                .regex(NAME_PATTERN, "First name must contain only letters")?
                .refine("This name is not allowed", is_allowed_name),
        ),
        ("email", Schema::string().email("Invalid email format")),
        (
            "password",
            Schema::string()
                .min(4, "Password must be at least 4 characters long")
                .max(10, "Password must be less than 10 characters")
                .regex(PASSWORD_PATTERN, PASSWORD_MESSAGE)?
                .refine(PASSWORD_MESSAGE, has_letter_and_digit),
        ),
        (
            "gender",
            Schema::enumeration(GENDERS, "Select any one option"),
        ),
        (
            "age",
            Schema::number()
                .min(18, "You must be at least 18 years old")
                .max(100, "Age must be less than or equal to 100"),
        ),
        (
            "terms",
            Schema::boolean().refine("You must accept the terms and conditions", is_checked),
        ),
        (
            "icecream",
            Schema::array(icecream_item).min(1, "Please select at least one ice cream flavor"),
        ),
    ]);

    FormDefinition::new(
        REGISTRATION_FORM,
        "React Hook Form With Zod",
        schema.compile()?,
        registration_defaults(),
    )
}

/// Registration form validated by imperative per-field rules. Produces the
/// same errors as [`registration_form`].
pub fn registration_rules_form() -> AppResult<FormDefinition> {
    let rules = FormRules::new()
        .register(
            "fname",
            FieldRules::new()
                .text()
                .min_length(3, "First name must be at least 3 characters long")
                .max_length(20, "First name must be less than 20 characters")
                .pattern(NAME_PATTERN, "First name must contain only letters")?
                .validate("This name is not allowed", is_allowed_name),
        )?
        .register(
            "email",
            FieldRules::new().text().email("Invalid email format"),
        )?
        .register(
            "password",
            FieldRules::new()
                .text()
                .min_length(4, "Password must be at least 4 characters long")
                .max_length(10, "Password must be less than 10 characters")
                .pattern(PASSWORD_PATTERN, PASSWORD_MESSAGE)?
                .validate(PASSWORD_MESSAGE, has_letter_and_digit),
        )?
        .register(
            "gender",
            FieldRules::new()
                .text()
                .type_message("Select any one option")
                .one_of(GENDERS, "Select any one option"),
        )?
        .register(
            "age",
            FieldRules::new()
                .min(18.0, "You must be at least 18 years old")
                .max(100.0, "Age must be less than or equal to 100"),
        )?
        .register(
            "terms",
            FieldRules::new()
                .boolean()
                .validate("You must accept the terms and conditions", is_checked),
        )?
        .register(
            "icecream",
            FieldRules::new().min_items(1, "Please select at least one ice cream flavor"),
        )?
        .register("icecream.*", FieldRules::new().group())?
        .register("icecream.*.value", FieldRules::new().text())?
        .register("icecream.*.label", FieldRules::new().text())?
        .build()?;

    FormDefinition::new(
        REGISTRATION_RULES_FORM,
        "React Hook Form With Rules",
        rules,
        registration_defaults(),
    )
}

fn referral_given(form: &FieldValue) -> bool {
    let subscribed = form
        .get(&FieldPath::root().key("subscribe"))
        .is_some_and(FieldValue::is_truthy);
    !subscribed
        || form
            .get(&FieldPath::root().key("referral"))
            .and_then(FieldValue::as_text)
            .is_some_and(|referral| !referral.trim().is_empty())
}

/// Profile form with nested address, a hobby field array and a referral
/// field shown only while subscribed. `start_date` is the default start date.
pub fn profile_form(start_date: NaiveDate) -> AppResult<FormDefinition> {
    let hobby = Schema::object([("name", Schema::string().nonempty("Hobby name is required"))]);
    let address = Schema::object([
        ("city", Schema::string().nonempty("City is required")),
        ("state", Schema::string().nonempty("State is required")),
    ]);
    let schema = Schema::object([
        ("firstName", Schema::string().nonempty("First name is required")),
        ("lastName", Schema::string().nonempty("Last name is required")),
        (
            "email",
            Schema::string()
                .nonempty("Email is required")
                .email("Invalid email format"),
        ),
        (
            "age",
            Schema::number()
                .min(18, "Age must be at least 18")
                .max(100, "Age must be less than or equal to 100"),
        ),
        ("gender", Schema::enumeration(GENDERS, "Gender is required")),
        ("address", address),
        (
            "hobbies",
            Schema::array(hobby).min(1, "At least one hobby is required"),
        ),
        ("startDate", Schema::date().type_message("Start date is required")),
        ("subscribe", Schema::boolean()),
        ("referral", Schema::string()),
    ])
    .refine_at(
        "referral",
        &["subscribe"],
        "Referral is required when subscribed",
        referral_given,
    )?;

    let mut defaults = FieldValue::from(json!({
        "firstName": "",
        "lastName": "",
        "email": "",
        "age": 18,
        "gender": "",
        "address": { "city": "", "state": "" },
        "hobbies": [{ "name": "" }],
        "subscribe": false,
        "referral": ""
    }));
    defaults.set(&FieldPath::root().key("startDate"), FieldValue::Date(start_date))?;

    FormDefinition::new(PROFILE_FORM, "Profile", schema.compile()?, defaults)?
        .with_field_array("hobbies")?
        .with_dependency(FieldDependency::when_truthy("subscribe", "referral")?)
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use formwright_core::AppError;
    use formwright_domain::{FieldPath, FieldValue, FormDefinition};
    use serde_json::json;

    use super::{
        PROFILE_FORM, form_by_name, form_names, icecream_option, profile_form, registration_form,
        registration_rules_form,
    };
    use crate::{RefinementPolicy, ValidationEngine};

    fn engine(definition: &FormDefinition) -> ValidationEngine {
        ValidationEngine::new(definition.rules().clone(), RefinementPolicy::default())
    }

    fn build(form: fn() -> formwright_core::AppResult<FormDefinition>) -> FormDefinition {
        form().unwrap_or_else(|error| panic!("catalog form failed to build: {error}"))
    }

    fn path(value: &str) -> FieldPath {
        FieldPath::parse(value).unwrap_or_else(|error| panic!("invalid test path: {error}"))
    }

    #[test]
    fn every_catalog_form_builds() {
        for name in form_names() {
            let form = form_by_name(name)
                .unwrap_or_else(|error| panic!("form '{name}' failed to build: {error}"));
            assert_eq!(form.name().as_str(), name);
        }
        assert!(matches!(form_by_name("checkout"), Err(AppError::NotFound(_))));
    }

    #[test]
    fn both_registration_styles_report_identical_errors() {
        let schema = engine(&build(registration_form));
        let rules = engine(&build(registration_rules_form));
        let chocolate = icecream_option("chocolate")
            .unwrap_or_else(|| panic!("chocolate option missing"));

        let inputs = [
            json!({}),
            json!({ "fname": "", "email": "", "password": "", "gender": "male", "age": 18, "terms": false, "icecream": [] }),
            json!({ "fname": "Admin", "email": "a@b", "password": "abcd", "gender": "robot", "age": "17", "terms": true, "icecream": "none" }),
            json!({ "fname": "Al", "email": "al@example.com", "password": "abc12345678", "gender": null, "age": "abc", "terms": "yes", "icecream": [1] }),
            json!({ "fname": "Alice1", "email": "alice@example.com", "password": "a1!", "gender": "other", "age": 101, "terms": false, "icecream": [chocolate.to_json()] }),
            json!({ "fname": "Alice", "email": "alice@example.com", "password": "abc1", "gender": "female", "age": 30, "terms": true, "icecream": [chocolate.to_json()] }),
        ];

        for input in inputs {
            let form = FieldValue::from(input.clone());
            assert_eq!(
                schema.validate(&form),
                rules.validate(&form),
                "styles diverged for {input}"
            );
        }
    }

    #[test]
    fn registration_messages_follow_declaration_order() {
        let engine = engine(&build(registration_form));
        let errors = engine.validate(&FieldValue::from(json!({
            "fname": "admin",
            "email": "not-an-email",
            "password": "abcd",
            "gender": "male",
            "age": 17,
            "terms": false,
            "icecream": []
        })));

        assert_eq!(errors.message(&path("fname")), Some("This name is not allowed"));
        assert_eq!(errors.message(&path("email")), Some("Invalid email format"));
        assert_eq!(
            errors.message(&path("password")),
            Some("Password must contain at least one letter and one number")
        );
        assert_eq!(
            errors.message(&path("age")),
            Some("You must be at least 18 years old")
        );
        assert_eq!(
            errors.message(&path("terms")),
            Some("You must accept the terms and conditions")
        );
        assert_eq!(
            errors.message(&path("icecream")),
            Some("Please select at least one ice cream flavor")
        );
        assert!(!errors.contains(&path("gender")));
    }

    #[test]
    fn profile_defaults_fail_on_required_fields_only() {
        let start = NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap_or_else(|| panic!("invalid test date"));
        let definition = profile_form(start)
            .unwrap_or_else(|error| panic!("profile failed to build: {error}"));
        assert_eq!(definition.name().as_str(), PROFILE_FORM);

        let errors = engine(&definition).validate(definition.defaults());
        let messages: Vec<(String, String)> = errors
            .iter()
            .map(|(path, error)| (path.to_string(), error.message().to_owned()))
            .collect();
        assert_eq!(
            messages,
            vec![
                ("address.city".to_owned(), "City is required".to_owned()),
                ("address.state".to_owned(), "State is required".to_owned()),
                ("email".to_owned(), "Email is required".to_owned()),
                ("firstName".to_owned(), "First name is required".to_owned()),
                ("gender".to_owned(), "Gender is required".to_owned()),
                ("hobbies.0.name".to_owned(), "Hobby name is required".to_owned()),
                ("lastName".to_owned(), "Last name is required".to_owned()),
            ]
        );
    }

    #[test]
    fn invalid_start_date_reports_type_message() {
        let start = NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap_or_else(|| panic!("invalid test date"));
        let definition = profile_form(start)
            .unwrap_or_else(|error| panic!("profile failed to build: {error}"));
        let mut form = definition.defaults().clone();
        let stored = form.set(&path("startDate"), FieldValue::text("someday"));
        assert!(stored.is_ok());

        let errors = engine(&definition).validate(&form);
        assert_eq!(
            errors.message(&path("startDate")),
            Some("Start date is required")
        );
    }
}
