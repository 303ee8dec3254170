/// Base DDD abstractions for the domain layer
use std::fmt::{self, Debug};

/// Trait for value objects - immutable objects defined by their attributes
/// Value objects are equal if all their attributes are equal
pub trait ValueObject: Clone + PartialEq + Eq + Debug {}

/// Trait for entities - objects with identity that can change over time
/// Entities are equal if their IDs are equal, regardless of other attributes
pub trait Entity: Debug {
    type Id: ValueObject;

    fn id(&self) -> &Self::Id;
}

/// Result type for domain operations
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-specific errors
///
/// Every variant carries a stable, machine-readable key (`error.page.slug.invalid`)
/// next to the human readable message, so callers can branch on the kind of
/// failure without matching on message text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Invalid value provided (empty slug, unknown status, missing hook argument)
    InvalidValue { key: &'static str, message: String },
    /// Model or language not found
    NotFound { key: &'static str, message: String },
    /// A sibling with the same slug already exists
    Duplicate { key: &'static str, message: String },
    /// The capability check refused the operation
    PermissionDenied { key: &'static str, message: String },
    /// A model was constructed from props of the wrong shape
    InvalidType { key: &'static str, message: String },
    /// Business rule violation
    LogicViolation { key: &'static str, message: String },
    /// The storage or repository backend failed
    Storage { key: &'static str, message: String },
}

impl DomainError {
    pub fn invalid_value(key: &'static str, message: impl Into<String>) -> Self {
        DomainError::InvalidValue {
            key,
            message: message.into(),
        }
    }

    pub fn not_found(key: &'static str, message: impl Into<String>) -> Self {
        DomainError::NotFound {
            key,
            message: message.into(),
        }
    }

    pub fn duplicate(key: &'static str, message: impl Into<String>) -> Self {
        DomainError::Duplicate {
            key,
            message: message.into(),
        }
    }

    pub fn permission_denied(key: &'static str, message: impl Into<String>) -> Self {
        DomainError::PermissionDenied {
            key,
            message: message.into(),
        }
    }

    pub fn invalid_type(key: &'static str, message: impl Into<String>) -> Self {
        DomainError::InvalidType {
            key,
            message: message.into(),
        }
    }

    pub fn logic(key: &'static str, message: impl Into<String>) -> Self {
        DomainError::LogicViolation {
            key,
            message: message.into(),
        }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        DomainError::Storage {
            key: "error.storage",
            message: message.into(),
        }
    }

    /// The stable machine-readable key of this error
    pub fn key(&self) -> &'static str {
        match self {
            DomainError::InvalidValue { key, .. }
            | DomainError::NotFound { key, .. }
            | DomainError::Duplicate { key, .. }
            | DomainError::PermissionDenied { key, .. }
            | DomainError::InvalidType { key, .. }
            | DomainError::LogicViolation { key, .. }
            | DomainError::Storage { key, .. } => key,
        }
    }

    /// The human readable message without the kind prefix
    pub fn message(&self) -> &str {
        match self {
            DomainError::InvalidValue { message, .. }
            | DomainError::NotFound { message, .. }
            | DomainError::Duplicate { message, .. }
            | DomainError::PermissionDenied { message, .. }
            | DomainError::InvalidType { message, .. }
            | DomainError::LogicViolation { message, .. }
            | DomainError::Storage { message, .. } => message,
        }
    }
}

impl fmt::Display for DomainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DomainError::InvalidValue { message, .. } => write!(f, "Invalid value: {}", message),
            DomainError::NotFound { message, .. } => write!(f, "Not found: {}", message),
            DomainError::Duplicate { message, .. } => write!(f, "Duplicate: {}", message),
            DomainError::PermissionDenied { message, .. } => {
                write!(f, "Permission denied: {}", message)
            }
            DomainError::InvalidType { message, .. } => write!(f, "Invalid type: {}", message),
            DomainError::LogicViolation { message, .. } => {
                write!(f, "Business rule violation: {}", message)
            }
            DomainError::Storage { message, .. } => write!(f, "Storage error: {}", message),
        }
    }
}

impl std::error::Error for DomainError {}
