use validator::Validate;

use crate::shared::types::{DomainError, DomainResult};

/// Run `validator` checks and flatten field errors into a single
/// `DomainError::Validation` message (`field: message; field: message`).
pub fn validate_input<T: Validate>(input: &T) -> DomainResult<()> {
    input.validate().map_err(|errors| {
        let mut field_errors: Vec<String> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| {
                    let msg = e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| e.code.to_string());
                    format!("{}: {}", field, msg)
                })
            })
            .collect();
        field_errors.sort();

        if field_errors.is_empty() {
            DomainError::Validation("Validation failed".to_string())
        } else {
            DomainError::Validation(field_errors.join("; "))
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Validate)]
    struct Party {
        #[validate(length(min = 1, message = "name is required"))]
        name: String,
        #[validate(range(min = 0.0, message = "must be non-negative"))]
        paid: f64,
    }

    #[test]
    fn valid_input_passes() {
        let p = Party { name: "Acme".into(), paid: 0.0 };
        assert!(validate_input(&p).is_ok());
    }

    #[test]
    fn errors_are_flattened_and_sorted() {
        let p = Party { name: String::new(), paid: -1.0 };
        let err = validate_input(&p).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Validation: name: name is required; paid: must be non-negative"
        );
    }
}
