//! Validation helpers for configuration values

pub use crate::error::ValidationError;

/// Common validators for config values
pub struct Validator;

impl Validator {
    /// Validates that a numeric value is within a range
    pub fn in_range<T>(value: T, min: T, max: T, field: &str) -> Result<(), ValidationError>
    where
        T: PartialOrd + std::fmt::Display + Copy,
    {
        if value < min || value > max {
            Err(ValidationError::with_value(
                field,
                format!("must be between {} and {}", min, max),
                value,
            ))
        } else {
            Ok(())
        }
    }

    /// Validates that a string is not empty
    pub fn not_empty(value: &str, field: &str) -> Result<(), ValidationError> {
        if value.trim().is_empty() {
            Err(ValidationError::new(field, "must not be empty"))
        } else {
            Ok(())
        }
    }

    /// Validates that a sequence contains no duplicate values
    pub fn all_distinct<T>(values: &[T], field: &str) -> Result<(), ValidationError>
    where
        T: PartialEq + std::fmt::Display,
    {
        for (i, a) in values.iter().enumerate() {
            if values[i + 1..].contains(a) {
                return Err(ValidationError::with_value(
                    field,
                    "assigned to more than one function",
                    a,
                ));
            }
        }
        Ok(())
    }

    /// Collects multiple validation results into a single result
    pub fn collect_errors(
        results: Vec<Result<(), ValidationError>>,
    ) -> Result<(), Vec<ValidationError>> {
        let errors: Vec<ValidationError> = results.into_iter().filter_map(|r| r.err()).collect();

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_range_accepts_bounds() {
        assert!(Validator::in_range(1, 1, 10, "f").is_ok());
        assert!(Validator::in_range(10, 1, 10, "f").is_ok());
    }

    #[test]
    fn test_in_range_rejects_outside() {
        let err = Validator::in_range(0, 1, 10, "f").unwrap_err();
        assert_eq!(err.field, "f");
        assert_eq!(err.value.as_deref(), Some("0"));
    }

    #[test]
    fn test_not_empty() {
        assert!(Validator::not_empty("x", "f").is_ok());
        assert!(Validator::not_empty("  ", "f").is_err());
    }

    #[test]
    fn test_all_distinct() {
        assert!(Validator::all_distinct(&[17, 27, 22], "pins").is_ok());
        assert!(Validator::all_distinct(&[17, 27, 17], "pins").is_err());
    }

    #[test]
    fn test_collect_errors() {
        let ok: Vec<Result<(), ValidationError>> = vec![Ok(()), Ok(())];
        assert!(Validator::collect_errors(ok).is_ok());

        let mixed = vec![Ok(()), Err(ValidationError::new("f", "bad"))];
        let errors = Validator::collect_errors(mixed).unwrap_err();
        assert_eq!(errors.len(), 1);
    }
}
