//! Typed error kinds for domain operations.
//!
//! Every externally visible operation fails with one of these kinds; the
//! HTTP boundary maps each to a status code and a JSON error body.
//! Ownership failures are reported as [`Error::NotFound`] so that plan
//! existence never leaks to non-owners.

use std::fmt;

/// Result alias for domain operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error kinds surfaced by domain operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The referenced entity has no matching row, or it exists but does not
    /// belong to the caller.
    #[error("{0} not found")]
    NotFound(String),

    /// The request payload is missing a required field or carries an
    /// invalid value. Rejected at the boundary, before any write.
    #[error("validation failed: {0}")]
    Validation(String),

    /// An external collaborator (plan generation, speech recognition,
    /// identity provider) errored or returned unusable data.
    #[error("collaborator failure: {0}")]
    Collaborator(String),

    /// A storage operation failed. Writes run inside transactions, so a
    /// failure mid-sequence rolls the whole operation back.
    #[error("persistence failure: {0}")]
    Persistence(#[source] anyhow::Error),
}

impl Error {
    /// NotFound for a given entity description, e.g. `not_found("plan")`.
    pub fn not_found(what: impl fmt::Display) -> Self {
        Self::NotFound(what.to_string())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn collaborator(msg: impl Into<String>) -> Self {
        Self::Collaborator(msg.into())
    }
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        Self::Persistence(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_message() {
        let err = Error::not_found("plan 123");
        assert_eq!(err.to_string(), "plan 123 not found");
    }

    #[test]
    fn validation_message() {
        let err = Error::validation("query must not be empty");
        assert_eq!(err.to_string(), "validation failed: query must not be empty");
    }
}
