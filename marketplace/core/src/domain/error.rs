// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Error Taxonomy
//!
//! | Variant | Raised when | Raised before any write |
//! |---------|-------------|-------------------------|
//! | `Validation` | a required field is missing or out of range | yes |
//! | `Conflict` | the current state forbids the operation | yes |
//! | `Authorization` | the caller is not the employer/applicant of record | yes |
//! | `Store` | the persistence gateway failed on a primary write or read | no |
//!
//! Failures of best-effort side steps never become a `MarketplaceError`;
//! they are logged and recorded in an effect log instead.

use thiserror::Error;

use crate::domain::application::TransitionError;
use crate::domain::repository::RepositoryError;

#[derive(Debug, Error)]
pub enum MarketplaceError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Not authorized: {0}")]
    Authorization(String),

    #[error("Store error: {0}")]
    Store(#[from] RepositoryError),
}

pub type MarketplaceResult<T> = Result<T, MarketplaceError>;

impl MarketplaceError {
    pub fn validation(message: impl Into<String>) -> Self {
        MarketplaceError::Validation(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        MarketplaceError::Conflict(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        MarketplaceError::Authorization(message.into())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        MarketplaceError::Store(RepositoryError::NotFound(what.into()))
    }

    /// Short sentence fit for showing to the person who triggered the error.
    pub fn user_message(&self) -> String {
        match self {
            MarketplaceError::Validation(message)
            | MarketplaceError::Conflict(message)
            | MarketplaceError::Authorization(message) => message.clone(),
            MarketplaceError::Store(RepositoryError::NotFound(what)) => format!("{what} not found."),
            MarketplaceError::Store(RepositoryError::PermissionDenied(_)) => {
                "You do not have access to this record.".to_string()
            }
            MarketplaceError::Store(_) => "Something went wrong. Please try again.".to_string(),
        }
    }
}

impl From<TransitionError> for MarketplaceError {
    fn from(err: TransitionError) -> Self {
        MarketplaceError::Conflict(err.to_string())
    }
}
