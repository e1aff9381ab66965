//! Adapters from [`validator`] results to the field-level detail lists
//! carried by [`CoreError::Validation`].

use validator::{Validate, ValidationErrors};

use crate::error::CoreError;

/// Flatten `errors` into human-readable lines, ordered by field name so the
/// output is stable across runs.
pub fn violation_details(errors: &ValidationErrors) -> Vec<String> {
    let mut fields: Vec<(String, Vec<String>)> = errors
        .field_errors()
        .into_iter()
        .map(|(field, errs)| {
            let field = field.to_string();
            let lines = errs
                .iter()
                .map(|err| match &err.message {
                    Some(msg) => msg.to_string(),
                    None => format!("{field} is invalid ({})", err.code),
                })
                .collect();
            (field, lines)
        })
        .collect();

    fields.sort_by(|a, b| a.0.cmp(&b.0));
    fields.into_iter().flat_map(|(_, lines)| lines).collect()
}

/// Run `input.validate()` and turn any failure into a
/// [`CoreError::Validation`] headed by `message`.
pub fn validate_input<T: Validate>(input: &T, message: &str) -> Result<(), CoreError> {
    input.validate().map_err(|errors| CoreError::Validation {
        message: message.to_string(),
        details: violation_details(&errors),
    })
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use validator::Validate;

    use super::*;

    #[derive(Validate)]
    struct Sample {
        #[validate(length(min = 1, message = "b must not be empty"))]
        b: String,
        #[validate(range(min = 1, message = "a must be positive"))]
        a: i64,
        #[validate(length(min = 2))]
        c: String,
    }

    #[test]
    fn details_are_sorted_by_field() {
        let sample = Sample {
            b: String::new(),
            a: 0,
            c: "x".into(),
        };
        let errors = sample.validate().unwrap_err();
        let details = violation_details(&errors);

        assert_eq!(details.len(), 3);
        assert_eq!(details[0], "a must be positive");
        assert_eq!(details[1], "b must not be empty");
        assert_eq!(details[2], "c is invalid (length)");
    }

    #[test]
    fn validate_input_wraps_message() {
        let sample = Sample {
            b: "ok".into(),
            a: -3,
            c: "ok".into(),
        };
        let err = validate_input(&sample, "Invalid sample").unwrap_err();
        assert_matches!(
            err,
            CoreError::Validation { message, details } if message == "Invalid sample" && details.len() == 1
        );
    }

    #[test]
    fn valid_input_passes() {
        let sample = Sample {
            b: "ok".into(),
            a: 1,
            c: "ok".into(),
        };
        assert!(validate_input(&sample, "Invalid sample").is_ok());
    }
}
