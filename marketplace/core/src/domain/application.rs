// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Application Aggregate
//!
//! A student's request to work a posted job. The aggregate guards its own
//! status transitions:
//!
//! ```text
//! Pending ──decide(Short-listed)──► Short-listed ──hire──► Hired ──complete──► Completed
//!    │
//!    └──decide(Rejected)──► Rejected
//! ```
//!
//! Siblings of a hired application are deleted from the store rather than
//! transitioned; deletion is not a modeled state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::identity::{CurrentUser, Participant, UserId};
use crate::domain::job::{Job, JobId};
use crate::domain::payment::Money;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ApplicationId(pub Uuid);

impl ApplicationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_string(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl Default for ApplicationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ApplicationStatus {
    Pending,
    #[serde(rename = "Short-listed")]
    ShortListed,
    Rejected,
    Hired,
    Completed,
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ApplicationStatus::Pending => "Pending",
            ApplicationStatus::ShortListed => "Short-listed",
            ApplicationStatus::Rejected => "Rejected",
            ApplicationStatus::Hired => "Hired",
            ApplicationStatus::Completed => "Completed",
        };
        f.write_str(label)
    }
}

/// Employer's verdict on a pending application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Decision {
    #[serde(rename = "Short-listed")]
    ShortList,
    Rejected,
}

impl Decision {
    pub fn target_status(&self) -> ApplicationStatus {
        match self {
            Decision::ShortList => ApplicationStatus::ShortListed,
            Decision::Rejected => ApplicationStatus::Rejected,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("application is {current}, expected {expected}")]
    InvalidTransition {
        current: ApplicationStatus,
        expected: ApplicationStatus,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    pub id: ApplicationId,
    pub job_id: JobId,
    pub job_title: String,
    pub job_role: String,
    pub employer_id: UserId,
    pub employer_name: String,
    pub applicant_id: UserId,
    pub applicant_name: String,
    pub applicant_email: String,
    pub cover_letter: String,
    pub links: Vec<String>,
    pub status: ApplicationStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hired_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payout: Option<Money>,
}

/// Trims links, drops blanks and keeps at most `max` of them.
pub fn normalize_links(links: &[String], max: usize) -> Vec<String> {
    links
        .iter()
        .map(|link| link.trim())
        .filter(|link| !link.is_empty())
        .take(max)
        .map(str::to_string)
        .collect()
}

impl Application {
    /// New `Pending` application of `applicant` to `job`.
    ///
    /// Callers are expected to have normalized `links` and checked the cover
    /// letter; the aggregate only trims it.
    pub fn submit(job: &Job, applicant: &CurrentUser, cover_letter: &str, links: Vec<String>) -> Self {
        let job_title = if job.title.is_empty() {
            "Untitled".to_string()
        } else {
            job.title.clone()
        };

        Self {
            id: ApplicationId::new(),
            job_id: job.id,
            job_title,
            job_role: job.role.clone(),
            employer_id: job.created_by.uid.clone(),
            employer_name: job.employer_name(),
            applicant_id: applicant.uid.clone(),
            applicant_name: applicant.sender_name(),
            applicant_email: applicant.email.clone(),
            cover_letter: cover_letter.trim().to_string(),
            links,
            status: ApplicationStatus::Pending,
            created_at: Utc::now(),
            hired_at: None,
            completed_at: None,
            payout: None,
        }
    }

    /// Side of the application `uid` is on, if any.
    pub fn participant(&self, uid: &UserId) -> Option<Participant> {
        if &self.employer_id == uid {
            Some(Participant::Employer)
        } else if &self.applicant_id == uid {
            Some(Participant::Applicant)
        } else {
            None
        }
    }

    fn expect_status(&self, expected: ApplicationStatus) -> Result<(), TransitionError> {
        if self.status == expected {
            Ok(())
        } else {
            Err(TransitionError::InvalidTransition {
                current: self.status,
                expected,
            })
        }
    }

    pub fn decide(&mut self, decision: Decision) -> Result<(), TransitionError> {
        self.expect_status(ApplicationStatus::Pending)?;
        self.status = decision.target_status();
        Ok(())
    }

    pub fn hire(&mut self, at: DateTime<Utc>) -> Result<(), TransitionError> {
        self.expect_status(ApplicationStatus::ShortListed)?;
        self.status = ApplicationStatus::Hired;
        self.hired_at = Some(at);
        Ok(())
    }

    pub fn complete(&mut self, payout: Option<Money>, at: DateTime<Utc>) -> Result<(), TransitionError> {
        self.expect_status(ApplicationStatus::Hired)?;
        self.status = ApplicationStatus::Completed;
        self.completed_at = Some(at);
        self.payout = payout;
        Ok(())
    }
}
