// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use serde::{Deserialize, Serialize};

use crate::domain::identity::UserId;

/// Public profile of an account, owned by the account holder.
///
/// The core only reads profiles: skills drive job recommendations and
/// employers may view the profile of a short-listed applicant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub uid: UserId,
    pub full_name: String,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub about: String,
    #[serde(default)]
    pub contact_email: String,
    #[serde(default)]
    pub contact_link: String,
    #[serde(default)]
    pub school: String,
    #[serde(default)]
    pub major: String,
    #[serde(default)]
    pub organization_name: String,
}

impl UserProfile {
    pub fn new(uid: impl Into<String>, full_name: impl Into<String>) -> Self {
        Self {
            uid: UserId::new(uid),
            full_name: full_name.into(),
            ..Self::default()
        }
    }

    pub fn with_skills(mut self, skills: &[&str]) -> Self {
        self.skills = skills.iter().map(|s| s.to_string()).collect();
        self
    }
}
