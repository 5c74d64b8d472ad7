//! Message schema contract and validation errors.
//!
//! A schema here is a Rust type: serde gives the structural half (the
//! `type` discriminant, required fields, field types) and
//! [`MessageSchema::validate`] covers the constraints serde cannot express
//! (non-empty strings, lengths, ranges).

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

/// A typed, schema-validated message.
///
/// Implementors are normally enums tagged on `"type"`:
///
/// ```rust,ignore
/// #[derive(Serialize, Deserialize)]
/// #[serde(tag = "type", rename_all = "camelCase")]
/// enum Inbound {
///     SetName { name: String },
///     Ping,
/// }
/// ```
pub trait MessageSchema: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Value of the `type` discriminant for this message.
    fn message_type(&self) -> &'static str;

    /// Check constraints beyond what deserialization enforces.
    fn validate(&self) -> Result<(), SchemaValidationError> {
        Ok(())
    }
}

/// Errors that can occur during schema validation.
///
/// # Security
///
/// These errors contain detailed information for debugging. When returning
/// errors to clients, use `to_client_message()` to get sanitized versions.
#[derive(Debug, Clone, Error)]
pub enum SchemaValidationError {
    #[error("Field {field} cannot be empty")]
    EmptyField { field: String },

    #[error("Field {field} is too long: maximum {max}, got {actual}")]
    TooLong {
        field: String,
        max: usize,
        actual: usize,
    },

    #[error("Value out of range for field {field}: {value} not in [{min}, {max}]")]
    OutOfRange {
        field: String,
        value: String,
        min: String,
        max: String,
    },

    #[error("Invalid format for field {field}: expected {format}")]
    InvalidFormat { field: String, format: String },

    #[error("Schema validation failed: {message}")]
    Generic { message: String },

    #[error("Validation errors: {0:?}")]
    Multiple(Vec<SchemaValidationError>),
}

impl SchemaValidationError {
    /// Convert to client-safe error message.
    pub fn to_client_message(&self) -> String {
        match self {
            SchemaValidationError::EmptyField { field } => {
                format!("Field '{}' cannot be empty", field)
            }
            SchemaValidationError::TooLong { field, max, .. } => {
                format!("Field '{}' must be at most {} characters", field, max)
            }
            SchemaValidationError::OutOfRange { field, min, max, .. } => {
                format!("Field '{}' must be between {} and {}", field, min, max)
            }
            SchemaValidationError::InvalidFormat { field, format } => {
                format!("Field '{}' must be a valid {}", field, format)
            }
            SchemaValidationError::Generic { message } => {
                if message.chars().count() > 100 {
                    let truncated: String = message.chars().take(97).collect();
                    format!("Validation failed: {}...", truncated)
                } else {
                    format!("Validation failed: {}", message)
                }
            }
            SchemaValidationError::Multiple(errors) => {
                // First error only
                errors
                    .first()
                    .map(|e| e.to_client_message())
                    .unwrap_or_else(|| "Validation failed".to_string())
            }
        }
    }

    /// Collapse a list of errors: none is `Ok`, one is itself, more is `Multiple`.
    pub fn collect(mut errors: Vec<SchemaValidationError>) -> Result<(), SchemaValidationError> {
        match errors.len() {
            0 => Ok(()),
            1 => Err(errors.remove(0)),
            _ => Err(SchemaValidationError::Multiple(errors)),
        }
    }

    /// Get the count of validation errors.
    pub fn error_count(&self) -> usize {
        match self {
            SchemaValidationError::Multiple(errors) => errors.len(),
            _ => 1,
        }
    }
}

impl PartialEq for SchemaValidationError {
    fn eq(&self, other: &Self) -> bool {
        self.to_string() == other.to_string()
    }
}

/// Field-level checks for [`MessageSchema::validate`] implementations.
pub mod rules {
    use super::SchemaValidationError;

    /// Rejects strings that are empty after trimming.
    pub fn non_empty(field: &str, value: &str) -> Result<(), SchemaValidationError> {
        if value.trim().is_empty() {
            return Err(SchemaValidationError::EmptyField {
                field: field.to_string(),
            });
        }
        Ok(())
    }

    /// Rejects strings longer than `max` characters.
    pub fn max_chars(field: &str, value: &str, max: usize) -> Result<(), SchemaValidationError> {
        let actual = value.chars().count();
        if actual > max {
            return Err(SchemaValidationError::TooLong {
                field: field.to_string(),
                max,
                actual,
            });
        }
        Ok(())
    }

    /// Rejects numbers outside `[min, max]`.
    pub fn in_range<T>(field: &str, value: T, min: T, max: T) -> Result<(), SchemaValidationError>
    where
        T: PartialOrd + std::fmt::Display,
    {
        if value < min || value > max {
            return Err(SchemaValidationError::OutOfRange {
                field: field.to_string(),
                value: value.to_string(),
                min: min.to_string(),
                max: max.to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_field_client_message_names_field() {
        let err = SchemaValidationError::EmptyField {
            field: "name".to_string(),
        };
        assert_eq!(err.to_client_message(), "Field 'name' cannot be empty");
    }

    #[test]
    fn too_long_hides_actual_length_from_client() {
        let err = SchemaValidationError::TooLong {
            field: "text".to_string(),
            max: 10,
            actual: 9000,
        };
        assert!(err.to_string().contains("9000"));
        assert!(!err.to_client_message().contains("9000"));
    }

    #[test]
    fn out_of_range_shows_bounds() {
        let err = SchemaValidationError::OutOfRange {
            field: "volume".to_string(),
            value: "150".to_string(),
            min: "0".to_string(),
            max: "100".to_string(),
        };
        assert_eq!(
            err.to_client_message(),
            "Field 'volume' must be between 0 and 100"
        );
    }

    #[test]
    fn multiple_errors_returns_first_in_client_message() {
        let err = SchemaValidationError::Multiple(vec![
            SchemaValidationError::EmptyField {
                field: "first".to_string(),
            },
            SchemaValidationError::EmptyField {
                field: "second".to_string(),
            },
        ]);
        assert_eq!(err.to_client_message(), "Field 'first' cannot be empty");
        assert_eq!(err.error_count(), 2);
    }

    #[test]
    fn generic_error_truncates_long_messages() {
        let err = SchemaValidationError::Generic {
            message: "é".repeat(200),
        };
        let client_msg = err.to_client_message();
        assert!(client_msg.ends_with("..."));
        assert!(client_msg.chars().count() < 130);
    }

    #[test]
    fn collect_flattens_by_count() {
        assert!(SchemaValidationError::collect(vec![]).is_ok());

        let one = SchemaValidationError::collect(vec![SchemaValidationError::EmptyField {
            field: "a".into(),
        }])
        .unwrap_err();
        assert_eq!(one.error_count(), 1);

        let two = SchemaValidationError::collect(vec![
            SchemaValidationError::EmptyField { field: "a".into() },
            SchemaValidationError::EmptyField { field: "b".into() },
        ])
        .unwrap_err();
        assert_eq!(two.error_count(), 2);
    }

    #[test]
    fn rules_non_empty_rejects_whitespace() {
        assert!(rules::non_empty("name", "   ").is_err());
        assert!(rules::non_empty("name", "Alice").is_ok());
    }

    #[test]
    fn rules_max_chars_counts_characters_not_bytes() {
        assert!(rules::max_chars("name", "ééé", 3).is_ok());
        assert!(rules::max_chars("name", "éééé", 3).is_err());
    }

    #[test]
    fn rules_in_range_is_inclusive() {
        assert!(rules::in_range("n", 0, 0, 10).is_ok());
        assert!(rules::in_range("n", 10, 0, 10).is_ok());
        assert!(rules::in_range("n", 11, 0, 10).is_err());
    }
}
