// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Identity Value Objects
//!
//! The identity provider is an external collaborator. The core only needs the
//! account identifier and a display name to attribute every mutating action,
//! so the caller is passed explicitly as a [`CurrentUser`] into each
//! operation instead of being read from ambient state.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque account identifier issued by the identity provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    pub fn new(uid: impl Into<String>) -> Self {
        Self(uid.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for UserId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// The signed-in account performing an operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentUser {
    pub uid: UserId,
    pub display_name: Option<String>,
    pub email: String,
}

impl CurrentUser {
    pub fn new(uid: impl Into<String>, display_name: Option<&str>, email: impl Into<String>) -> Self {
        Self {
            uid: UserId::new(uid),
            display_name: display_name.map(str::to_string),
            email: email.into(),
        }
    }

    /// Name stamped on documents the user creates: display name, else email.
    pub fn sender_name(&self) -> String {
        match &self.display_name {
            Some(name) if !name.trim().is_empty() => name.clone(),
            _ => self.email.clone(),
        }
    }
}

/// Which side of an application a user is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Participant {
    Employer,
    Applicant,
}

impl fmt::Display for Participant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Participant::Employer => write!(f, "employer"),
            Participant::Applicant => write!(f, "applicant"),
        }
    }
}
