// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Job Postings
//!
//! A job is owned by the account that posted it. Its `status` gates new
//! applications and follows two rules:
//!
//! - `open → closed` when a hire is confirmed, the proposal cap is reached,
//!   or the owner closes it by hand.
//! - `closed → open` only while no hire exists and the cap is not reached.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::domain::identity::{CurrentUser, UserId};
use crate::domain::payment::Money;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobId(pub Uuid);

impl JobId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_string(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Open,
    Closed,
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobStatus::Open => write!(f, "open"),
            JobStatus::Closed => write!(f, "closed"),
        }
    }
}

/// Denormalized snapshot of the posting account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobCreator {
    pub uid: UserId,
    pub full_name: String,
    pub email: String,
}

/// Fields an employer fills in when posting a job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobDraft {
    pub title: String,
    pub role: String,
    pub description: String,
    #[serde(default)]
    pub categories: Vec<String>,
    pub payout: Money,
    #[serde(default)]
    pub max_proposals: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: JobId,
    pub title: String,
    pub role: String,
    pub description: String,
    pub categories: Vec<String>,
    pub payout: Money,
    pub max_proposals: Option<u32>,
    pub status: JobStatus,
    pub created_by: JobCreator,
    pub created_at: DateTime<Utc>,
}

/// Aggregate view over the applications of one job.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationStats {
    pub total: usize,
    pub has_hire: bool,
}

impl Job {
    pub fn post(creator: &CurrentUser, draft: JobDraft) -> Self {
        Self {
            id: JobId::new(),
            title: draft.title.trim().to_string(),
            role: draft.role.trim().to_string(),
            description: draft.description.trim().to_string(),
            categories: draft.categories,
            payout: draft.payout,
            max_proposals: draft.max_proposals,
            status: JobStatus::Open,
            created_by: JobCreator {
                uid: creator.uid.clone(),
                full_name: creator.display_name.clone().unwrap_or_default(),
                email: creator.email.clone(),
            },
            created_at: Utc::now(),
        }
    }

    pub fn is_owned_by(&self, uid: &UserId) -> bool {
        &self.created_by.uid == uid
    }

    pub fn is_open(&self) -> bool {
        self.status == JobStatus::Open
    }

    /// Name shown to applicants: the poster's full name, else their email.
    pub fn employer_name(&self) -> String {
        if self.created_by.full_name.trim().is_empty() {
            self.created_by.email.clone()
        } else {
            self.created_by.full_name.clone()
        }
    }

    /// A cap of zero means "no cap".
    pub fn cap_reached(&self, total_applications: usize) -> bool {
        match self.max_proposals {
            Some(cap) if cap > 0 => total_applications >= cap as usize,
            _ => false,
        }
    }

    pub fn accepts_applications(&self, stats: &ApplicationStats) -> bool {
        self.is_open() && !stats.has_hire && !self.cap_reached(stats.total)
    }

    /// True when an open job already violates its closing rules.
    pub fn should_close(&self, stats: &ApplicationStats) -> bool {
        self.is_open() && (stats.has_hire || self.cap_reached(stats.total))
    }

    pub fn can_reopen(&self, stats: &ApplicationStats) -> bool {
        !stats.has_hire && !self.cap_reached(stats.total)
    }

    /// Case-insensitive count of categories that appear among `skills`.
    pub fn matching_categories(&self, skills: &[String]) -> usize {
        let skills: Vec<String> = skills.iter().map(|s| s.to_lowercase()).collect();
        self.categories
            .iter()
            .filter(|category| skills.contains(&category.to_lowercase()))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn job(max_proposals: Option<u32>) -> Job {
        let owner = CurrentUser::new("emp-1", Some("Acme"), "hr@acme.test");
        Job::post(
            &owner,
            JobDraft {
                title: " Landing page ".to_string(),
                role: "Frontend".to_string(),
                description: "Build a landing page".to_string(),
                categories: vec!["React".to_string(), "Design".to_string()],
                payout: Money::new(Decimal::new(1_000_000, 0), "IDR"),
                max_proposals,
            },
        )
    }

    #[test]
    fn test_post_trims_and_opens() {
        let job = job(None);
        assert_eq!(job.title, "Landing page");
        assert!(job.is_open());
        assert!(job.is_owned_by(&UserId::new("emp-1")));
        assert_eq!(job.employer_name(), "Acme");
    }

    #[test]
    fn test_cap_rules() {
        let capped = job(Some(2));
        let one = ApplicationStats { total: 1, has_hire: false };
        let two = ApplicationStats { total: 2, has_hire: false };

        assert!(capped.accepts_applications(&one));
        assert!(!capped.accepts_applications(&two));
        assert!(capped.should_close(&two));
        assert!(!capped.can_reopen(&two));

        let uncapped = job(Some(0));
        assert!(!uncapped.cap_reached(500));
    }

    #[test]
    fn test_hire_blocks_reopen() {
        let job = job(None);
        let hired = ApplicationStats { total: 1, has_hire: true };
        assert!(job.should_close(&hired));
        assert!(!job.can_reopen(&hired));
        assert!(!job.accepts_applications(&hired));
    }

    #[test]
    fn test_matching_categories_ignores_case() {
        let job = job(None);
        let skills = vec!["react".to_string(), "Rust".to_string()];
        assert_eq!(job.matching_categories(&skills), 1);
    }
}
