//! Domain-level errors (no external dependencies)

use thiserror::Error;

/// Domain errors represent business rule violations.
///
/// Missing ids are deliberately absent: a reference to a card or node that
/// no longer exists is a silent no-op, since ids may race with deletes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("invalid {field}: must not be empty")]
    InvalidInput { field: &'static str },

    #[error("duplicate id in snapshot: {0}")]
    DuplicateId(String),
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;

/// Trim a user-supplied title or name, rejecting empty and whitespace-only input.
pub fn normalize_label(field: &'static str, raw: &str) -> DomainResult<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(DomainError::InvalidInput { field });
    }
    Ok(trimmed.to_string())
}
