//! Shared validation helpers for inbound HTTP adapters.
//!
//! Each failure is an `invalid_request` error whose `details` name the
//! offending field and a stable validation code.

use serde_json::json;

use crate::domain::{Error, UserId};

/// Validation error codes for HTTP request failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ErrorCode {
    MissingField,
    InvalidUuid,
    InvalidId,
    InvalidLength,
    InvalidValue,
}

impl ErrorCode {
    const fn as_str(self) -> &'static str {
        match self {
            Self::MissingField => "missing_field",
            Self::InvalidUuid => "invalid_uuid",
            Self::InvalidId => "invalid_id",
            Self::InvalidValue => "invalid_value",
            Self::InvalidLength => "invalid_length",
        }
    }
}

/// Newtype wrapper for HTTP field names to provide type safety.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FieldName(&'static str);

impl FieldName {
    pub(crate) const fn new(name: &'static str) -> Self {
        Self(name)
    }

    const fn as_str(self) -> &'static str {
        self.0
    }
}

/// Inclusive character-count bounds for a text field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Length {
    pub(crate) min: usize,
    pub(crate) max: usize,
}

pub(crate) const GROUP_NAME_LENGTH: Length = Length { min: 1, max: 64 };
pub(crate) const EMOJI_LENGTH: Length = Length { min: 1, max: 16 };
pub(crate) const MESSAGE_MAX_CHARS: usize = 200;
pub(crate) const ANNOUNCEMENT_MAX_CHARS: usize = 500;

/// Builder for validation errors with field context.
struct ValidationError {
    field: &'static str,
    message: String,
}

impl ValidationError {
    fn new(field: FieldName, message: impl Into<String>) -> Self {
        Self {
            field: field.as_str(),
            message: message.into(),
        }
    }

    fn with_code(self, code: ErrorCode) -> Error {
        Error::invalid_request(self.message).with_details(json!({
            "field": self.field,
            "code": code.as_str(),
        }))
    }

    fn with_value(self, code: ErrorCode, value: impl Into<String>) -> Error {
        Error::invalid_request(self.message).with_details(json!({
            "field": self.field,
            "value": value.into(),
            "code": code.as_str(),
        }))
    }

    fn with_bounds(self, length: Length) -> Error {
        Error::invalid_request(self.message).with_details(json!({
            "field": self.field,
            "min": length.min,
            "max": length.max,
            "code": ErrorCode::InvalidLength.as_str(),
        }))
    }
}

pub(crate) fn missing_field_error(field: FieldName) -> Error {
    let name = field.as_str();
    ValidationError::new(field, format!("missing required field: {name}"))
        .with_code(ErrorCode::MissingField)
}

pub(crate) fn invalid_uuid_error(field: FieldName, value: &str) -> Error {
    let name = field.as_str();
    ValidationError::new(field, format!("{name} must be a valid UUID"))
        .with_value(ErrorCode::InvalidUuid, value)
}

/// Parse a path or body segment into a [`UserId`].
pub(crate) fn parse_user_id(value: &str, field: FieldName) -> Result<UserId, Error> {
    UserId::new(value).map_err(|_| invalid_uuid_error(field, value))
}

/// Parse a positive numeric identifier such as a group or notification id.
pub(crate) fn parse_numeric_id(value: &str, field: FieldName) -> Result<i64, Error> {
    match value.trim().parse::<i64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => {
            let name = field.as_str();
            Err(
                ValidationError::new(field, format!("{name} must be a positive integer"))
                    .with_value(ErrorCode::InvalidId, value),
            )
        }
    }
}

/// Reject `value` as not one of the accepted `choices`.
pub(crate) fn invalid_choice_error(field: FieldName, value: &str, choices: &str) -> Error {
    let name = field.as_str();
    ValidationError::new(field, format!("{name} must be one of: {choices}"))
        .with_value(ErrorCode::InvalidValue, value)
}

/// Trim `value` and reject it when nothing remains.
pub(crate) fn required_text(value: &str, field: FieldName) -> Result<String, Error> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(missing_field_error(field));
    }
    Ok(trimmed.to_owned())
}

/// Trim `value` and check its character count against `length`.
pub(crate) fn bounded_text(value: &str, field: FieldName, length: Length) -> Result<String, Error> {
    let trimmed = value.trim();
    let count = trimmed.chars().count();
    if count < length.min || count > length.max {
        let name = field.as_str();
        return Err(ValidationError::new(
            field,
            format!(
                "{name} must be between {} and {} characters",
                length.min, length.max
            ),
        )
        .with_bounds(length));
    }
    Ok(trimmed.to_owned())
}

/// Trim an optional free-text field; blank input becomes `None`.
pub(crate) fn optional_text(
    value: Option<&str>,
    field: FieldName,
    max_chars: usize,
) -> Result<Option<String>, Error> {
    let Some(trimmed) = value.map(str::trim).filter(|text| !text.is_empty()) else {
        return Ok(None);
    };
    if trimmed.chars().count() > max_chars {
        let name = field.as_str();
        return Err(ValidationError::new(
            field,
            format!("{name} must be at most {max_chars} characters"),
        )
        .with_bounds(Length {
            min: 0,
            max: max_chars,
        }));
    }
    Ok(Some(trimmed.to_owned()))
}
