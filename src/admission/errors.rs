// Copyright 2024 The Kubernetes Authors.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Admission error types.

use super::attributes::Attributes;
use std::fmt;
use thiserror::Error;

/// Result type for admission operations.
pub type AdmissionResult<T> = Result<T, AdmissionError>;

/// AdmissionError represents errors that can occur during admission.
#[derive(Debug, Error)]
pub enum AdmissionError {
    /// BadRequest indicates a malformed request.
    #[error("{0}")]
    BadRequest(String),

    /// Forbidden indicates the request is not allowed.
    #[error("{0}")]
    Forbidden(ForbiddenError),

    /// Invalid carries one or more field-level violations.
    #[error("{0}")]
    Invalid(InvalidError),

    /// Aggregate represents multiple errors.
    #[error("{0}")]
    Aggregate(AggregateError),

    /// Internal represents an internal error.
    #[error("internal error: {0}")]
    Internal(String),

    /// NotFound indicates a resource was not found.
    #[error("{kind} \"{name}\" not found")]
    NotFound { kind: String, name: String },
}

impl AdmissionError {
    /// Create a new BadRequest error.
    pub fn bad_request(msg: impl Into<String>) -> Self {
        AdmissionError::BadRequest(msg.into())
    }

    /// Create a new Forbidden error.
    pub fn forbidden(
        name: impl Into<String>,
        namespace: impl Into<String>,
        resource: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        AdmissionError::Forbidden(ForbiddenError {
            name: name.into(),
            namespace: namespace.into(),
            resource: resource.into(),
            message: message.into(),
        })
    }

    /// Create a Forbidden error for the object described by the attributes.
    pub fn new_forbidden(attributes: &dyn Attributes, message: impl fmt::Display) -> Self {
        Self::forbidden(
            attributes.get_name(),
            attributes.get_namespace(),
            attributes.get_resource().resource.clone(),
            message.to_string(),
        )
    }

    /// Create an Invalid error for the object described by the attributes.
    pub fn new_invalid(attributes: &dyn Attributes, errors: ErrorList) -> Self {
        Self::invalid(
            attributes.get_kind().kind.clone(),
            attributes.get_name(),
            errors,
        )
    }

    /// Create an Invalid error.
    pub fn invalid(kind: impl Into<String>, name: impl Into<String>, errors: ErrorList) -> Self {
        AdmissionError::Invalid(InvalidError {
            kind: kind.into(),
            name: name.into(),
            errors,
        })
    }

    /// Create an aggregate error from multiple errors. A single error is
    /// returned as is.
    pub fn aggregate(mut errors: Vec<AdmissionError>) -> Self {
        if errors.len() == 1 {
            if let Some(err) = errors.pop() {
                return err;
            }
        }
        AdmissionError::Aggregate(AggregateError { errors })
    }

    /// Create a NotFound error.
    pub fn not_found(kind: impl Into<String>, name: impl Into<String>) -> Self {
        AdmissionError::NotFound {
            kind: kind.into(),
            name: name.into(),
        }
    }

    /// Create an Internal error.
    pub fn internal_error(msg: impl Into<String>) -> Self {
        AdmissionError::Internal(msg.into())
    }

    /// HTTP status code the API server answers with.
    pub fn status_code(&self) -> u16 {
        match self {
            AdmissionError::BadRequest(_) => 400,
            AdmissionError::Forbidden(_) => 403,
            AdmissionError::NotFound { .. } => 404,
            AdmissionError::Invalid(_) => 422,
            AdmissionError::Aggregate(aggregate) => aggregate
                .common(AdmissionError::status_code)
                .unwrap_or(500),
            AdmissionError::Internal(_) => 500,
        }
    }

    /// Machine-readable status reason.
    pub fn reason(&self) -> &'static str {
        match self {
            AdmissionError::BadRequest(_) => "BadRequest",
            AdmissionError::Forbidden(_) => "Forbidden",
            AdmissionError::NotFound { .. } => "NotFound",
            AdmissionError::Invalid(_) => "Invalid",
            AdmissionError::Aggregate(aggregate) => aggregate
                .common(AdmissionError::reason)
                .unwrap_or("InternalError"),
            AdmissionError::Internal(_) => "InternalError",
        }
    }
}

/// ForbiddenError represents a forbidden admission error.
#[derive(Debug)]
pub struct ForbiddenError {
    pub name: String,
    pub namespace: String,
    pub resource: String,
    pub message: String,
}

impl fmt::Display for ForbiddenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} \"{}\" is forbidden: {}",
            self.resource, self.name, self.message
        )
    }
}

/// InvalidError groups the field errors found for a single object.
#[derive(Debug)]
pub struct InvalidError {
    pub kind: String,
    pub name: String,
    pub errors: ErrorList,
}

impl fmt::Display for InvalidError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} \"{}\" is invalid: {}", self.kind, self.name, self.errors)
    }
}

/// FieldError represents a field-level error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub error_type: FieldErrorType,
    pub value: String,
    pub detail: String,
    pub supported_values: Vec<String>,
}

impl FieldError {
    fn new(error_type: FieldErrorType, field: &str, value: &str, detail: &str) -> Self {
        Self {
            field: field.to_string(),
            error_type,
            value: value.to_string(),
            detail: detail.to_string(),
            supported_values: Vec::new(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.error_type {
            FieldErrorType::NotSupported => {
                return write!(
                    f,
                    "{}: Unsupported value: \"{}\": supported values: {}",
                    self.field,
                    self.value,
                    self.supported_values
                        .iter()
                        .map(|s| format!("\"{}\"", s))
                        .collect::<Vec<_>>()
                        .join(", ")
                );
            }
            FieldErrorType::Required => write!(f, "{}: Required value", self.field)?,
            FieldErrorType::Invalid => {
                write!(f, "{}: Invalid value: \"{}\"", self.field, self.value)?
            }
            FieldErrorType::Forbidden => write!(f, "{}: Forbidden", self.field)?,
        }
        if self.detail.is_empty() {
            Ok(())
        } else {
            write!(f, ": {}", self.detail)
        }
    }
}

/// FieldErrorType represents the type of field error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldErrorType {
    /// NotSupported indicates the value is not in the list of supported values.
    NotSupported,
    /// Required indicates a required field is missing.
    Required,
    /// Invalid indicates an invalid value.
    Invalid,
    /// Forbidden indicates the field may not be set or changed.
    Forbidden,
}

/// ErrorList holds the field errors of one validation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorList(pub Vec<FieldError>);

impl ErrorList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, error: FieldError) {
        self.0.push(error);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.0.iter()
    }
}

impl fmt::Display for ErrorList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.len() == 1 {
            return write!(f, "{}", self.0[0]);
        }
        let error_strings: Vec<String> = self.0.iter().map(|e| e.to_string()).collect();
        write!(f, "[{}]", error_strings.join(", "))
    }
}

/// AggregateError represents multiple errors.
#[derive(Debug)]
pub struct AggregateError {
    pub errors: Vec<AdmissionError>,
}

impl AggregateError {
    /// The value shared by every member, if there is one.
    fn common<T: PartialEq>(&self, f: impl Fn(&AdmissionError) -> T) -> Option<T> {
        let mut values = self.errors.iter().map(f);
        let first = values.next()?;
        values.all(|v| v == first).then_some(first)
    }
}

impl fmt::Display for AggregateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let error_strings: Vec<String> = self.errors.iter().map(|e| e.to_string()).collect();
        write!(f, "[{}]", error_strings.join(", "))
    }
}

/// Helper function to create a "not supported" field error.
pub fn field_not_supported(field: &str, value: &str, supported: Vec<&str>) -> FieldError {
    FieldError {
        supported_values: supported.into_iter().map(String::from).collect(),
        ..FieldError::new(FieldErrorType::NotSupported, field, value, "")
    }
}

/// Helper function to create a "required" field error.
pub fn field_required(field: &str, detail: &str) -> FieldError {
    FieldError::new(FieldErrorType::Required, field, "", detail)
}

/// Helper function to create an "invalid" field error.
pub fn field_invalid(field: &str, value: &str, detail: &str) -> FieldError {
    FieldError::new(FieldErrorType::Invalid, field, value, detail)
}

/// Helper function to create a "forbidden" field error.
pub fn field_forbidden(field: &str, detail: &str) -> FieldError {
    FieldError::new(FieldErrorType::Forbidden, field, "", detail)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forbidden_error_display() {
        let err = AdmissionError::forbidden(
            "my-shoot",
            "garden-dev",
            "shoots",
            "could not find referenced seed",
        );
        let msg = err.to_string();
        assert_eq!(
            msg,
            "shoots \"my-shoot\" is forbidden: could not find referenced seed"
        );
        assert_eq!(err.status_code(), 403);
        assert_eq!(err.reason(), "Forbidden");
    }

    #[test]
    fn test_field_error_display() {
        let err = field_invalid("spec.provider.zones", "zone-b", "zone is not a shoot worker zone");
        assert_eq!(
            err.to_string(),
            "spec.provider.zones: Invalid value: \"zone-b\": zone is not a shoot worker zone"
        );

        let err = field_not_supported("spec.scope", "Pod", vec!["Project", "Secret"]);
        assert!(err.to_string().contains("Unsupported value: \"Pod\""));
        assert!(err.to_string().contains("\"Project\", \"Secret\""));

        assert_eq!(
            field_required("spec.shoot.name", "").to_string(),
            "spec.shoot.name: Required value"
        );
    }

    #[test]
    fn test_error_list_display() {
        let mut list = ErrorList::new();
        list.push(field_forbidden("spec.a", "one"));
        assert_eq!(list.to_string(), "spec.a: Forbidden: one");

        list.push(field_forbidden("spec.b", "two"));
        let msg = list.to_string();
        assert!(msg.starts_with('['));
        assert!(msg.contains("spec.b: Forbidden: two"));
    }

    #[test]
    fn test_aggregate_error_display() {
        let errors = vec![
            AdmissionError::bad_request("error 1"),
            AdmissionError::internal_error("error 2"),
        ];
        let err = AdmissionError::aggregate(errors);
        let msg = err.to_string();
        assert!(msg.starts_with('['));
        assert!(msg.ends_with(']'));
        assert!(msg.contains("error 1"));
        assert!(msg.contains("internal error: error 2"));
        assert_eq!(err.status_code(), 500);
        assert_eq!(err.reason(), "InternalError");
    }

    #[test]
    fn test_aggregate_of_forbidden_errors() {
        let err = AdmissionError::aggregate(vec![
            AdmissionError::forbidden("aws", "", "cloudprofiles", "one"),
            AdmissionError::forbidden("aws", "", "cloudprofiles", "two"),
        ]);
        assert!(matches!(&err, AdmissionError::Aggregate(a) if a.errors.len() == 2));
        assert_eq!(err.status_code(), 403);
        assert_eq!(err.reason(), "Forbidden");

        let single = AdmissionError::aggregate(vec![AdmissionError::bad_request("only")]);
        assert!(matches!(single, AdmissionError::BadRequest(_)));
    }
}
