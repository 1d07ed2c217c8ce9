//! Checking submitted content before it reaches the store.

use serde::Serialize;

/// Message shown next to a field that was left empty.
pub const REQUIRED_MESSAGE: &str = "This field is required";

/// The validation result for one form field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormError {
    /// Whether the field failed validation.
    pub failed: bool,
    /// What was wrong, empty if nothing was.
    pub message: String,
    /// The name of the field.
    pub field: &'static str,
}

impl FormError {
    /// A passing result for a field.
    pub fn none(field: &'static str) -> FormError {
        FormError {
            failed: false,
            message: String::new(),
            field,
        }
    }

    /// A failing result for a field that was left empty.
    pub fn required(field: &'static str) -> FormError {
        FormError {
            failed: true,
            message: REQUIRED_MESSAGE.to_string(),
            field,
        }
    }
}

fn check_required(field: &'static str, value: &str) -> FormError {
    if value.trim().is_empty() {
        FormError::required(field)
    } else {
        FormError::none(field)
    }
}

/// Validate a new thread.
///
/// Both slots are always filled, title first, so a form can be re-rendered
/// whole. The flag is true when neither field failed.
pub fn validate_post(title: &str, comment: &str) -> ([FormError; 2], bool) {
    let errors = [
        check_required("title", title),
        check_required("comment", comment),
    ];
    let ok = errors.iter().all(|error| !error.failed);

    (errors, ok)
}

/// Validate a new reply.
pub fn validate_reply(comment: &str) -> (FormError, bool) {
    let error = check_required("comment", comment);
    let ok = !error.failed;

    (error, ok)
}
