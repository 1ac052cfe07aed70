use validator::ValidationErrors;

use crate::error::AppError;

/// Convert validation errors to AppError
pub fn validation_errors_to_app_error(errors: ValidationErrors) -> AppError {
    let mut error_messages = Vec::new();

    for (field, field_errors) in errors.field_errors() {
        for error in field_errors {
            let message = match error.code.as_ref() {
                "length" => "Invalid length",
                "range" => "Value out of range",
                "required" => "Field is required",
                "unknown_card" => "Not a card in a standard deck with jokers",
                _ => "Validation error",
            };

            error_messages.push(format!("{}: {}", field, message));
        }
    }

    AppError::Validation(error_messages.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct Probe {
        #[validate(range(min = 1, max = 54))]
        slot: i32,
    }

    #[test]
    fn test_validation_errors_become_app_error() {
        let probe = Probe { slot: 99 };
        let error = validation_errors_to_app_error(probe.validate().unwrap_err());

        match error {
            AppError::Validation(message) => {
                assert!(message.contains("slot"));
                assert!(message.contains("Value out of range"));
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }
}
