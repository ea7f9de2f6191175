// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Job Posting Gateway
//!
//! Supplies job metadata to the lifecycle engine and keeps each job's
//! `open`/`closed` status consistent with its applications.
//!
//! # Status rules
//!
//! - An open job with a hire, or with `maxProposals` applications, is closed
//!   by [`JobPostingService::reconcile_job_status`] and by the lifecycle side
//!   steps ([`JobPostingService::close_job`]).
//! - The owner may close a job at any time but may only reopen it while no
//!   hire exists and the cap is not reached.

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::domain::error::{MarketplaceError, MarketplaceResult};
use crate::domain::events::JobEvent;
use crate::domain::identity::CurrentUser;
use crate::domain::job::{ApplicationStats, Job, JobDraft, JobId, JobStatus};
use crate::domain::application::ApplicationStatus;
use crate::domain::repository::{ApplicationRepository, JobRepository, ProfileRepository};
use crate::infrastructure::event_bus::EventBus;

/// Jobs considered when building recommendations
const RECOMMENDATION_POOL: usize = 20;

#[async_trait]
pub trait JobPostingService: Send + Sync {
    async fn post_job(&self, creator: &CurrentUser, draft: JobDraft) -> MarketplaceResult<Job>;

    async fn get_job(&self, id: JobId) -> MarketplaceResult<Job>;

    async fn application_stats(&self, id: JobId) -> MarketplaceResult<ApplicationStats>;

    /// Owner-initiated open/close
    async fn set_job_status(&self, caller: &CurrentUser, id: JobId, status: JobStatus) -> MarketplaceResult<Job>;

    /// Close `id` if its applications say it should be closed
    async fn reconcile_job_status(&self, id: JobId) -> MarketplaceResult<Job>;

    /// The caller's postings, reconciled, newest first
    async fn jobs_for_owner(&self, caller: &CurrentUser) -> MarketplaceResult<Vec<Job>>;

    async fn recommended_jobs(&self, caller: &CurrentUser, limit: usize) -> MarketplaceResult<Vec<Job>>;

    /// System close used by lifecycle side steps. Returns whether the status
    /// changed.
    async fn close_job(&self, id: JobId) -> MarketplaceResult<bool>;

    /// System reopen used after a project completes. Leaves the job closed
    /// while the reopen rule forbids opening it.
    async fn reopen_job(&self, id: JobId) -> MarketplaceResult<bool>;
}

pub struct StandardJobPostingService {
    jobs: Arc<dyn JobRepository>,
    applications: Arc<dyn ApplicationRepository>,
    profiles: Arc<dyn ProfileRepository>,
    event_bus: EventBus,
    default_currency: String,
}

impl StandardJobPostingService {
    pub fn new(
        jobs: Arc<dyn JobRepository>,
        applications: Arc<dyn ApplicationRepository>,
        profiles: Arc<dyn ProfileRepository>,
        event_bus: EventBus,
        default_currency: impl Into<String>,
    ) -> Self {
        Self {
            jobs,
            applications,
            profiles,
            event_bus,
            default_currency: default_currency.into(),
        }
    }

    fn validate_draft(&self, mut draft: JobDraft) -> MarketplaceResult<JobDraft> {
        if draft.title.trim().is_empty() || draft.role.trim().is_empty() || draft.description.trim().is_empty() {
            return Err(MarketplaceError::validation("Please fill in the title, role and description."));
        }
        if draft.payout.amount <= Decimal::ZERO {
            return Err(MarketplaceError::validation("Please enter a valid pay amount above 0."));
        }

        draft.payout.currency = draft.payout.currency.trim().to_uppercase();
        if draft.payout.currency.is_empty() {
            draft.payout.currency = self.default_currency.clone();
        }
        draft.categories = draft
            .categories
            .iter()
            .map(|c| c.trim())
            .filter(|c| !c.is_empty())
            .map(str::to_string)
            .collect();
        Ok(draft)
    }

    async fn write_status(&self, mut job: Job, status: JobStatus) -> MarketplaceResult<Job> {
        job.status = status;
        self.jobs.save(&job).await?;
        self.event_bus.publish_job_event(JobEvent::JobStatusChanged {
            job_id: job.id,
            status,
            changed_at: Utc::now(),
        });
        info!(job_id = %job.id, status = %status, "Job status changed");
        Ok(job)
    }
}

#[async_trait]
impl JobPostingService for StandardJobPostingService {
    async fn post_job(&self, creator: &CurrentUser, draft: JobDraft) -> MarketplaceResult<Job> {
        let draft = self.validate_draft(draft)?;
        let job = Job::post(creator, draft);
        self.jobs.save(&job).await?;

        self.event_bus.publish_job_event(JobEvent::JobPosted {
            job_id: job.id,
            posted_at: job.created_at,
        });
        info!(job_id = %job.id, owner = %creator.uid, "Job posted");
        Ok(job)
    }

    async fn get_job(&self, id: JobId) -> MarketplaceResult<Job> {
        self.jobs
            .find_by_id(id)
            .await?
            .ok_or_else(|| MarketplaceError::not_found("Job"))
    }

    async fn application_stats(&self, id: JobId) -> MarketplaceResult<ApplicationStats> {
        let applications = self.applications.find_by_job(id).await?;
        Ok(ApplicationStats {
            total: applications.len(),
            has_hire: applications.iter().any(|a| a.status == ApplicationStatus::Hired),
        })
    }

    async fn set_job_status(&self, caller: &CurrentUser, id: JobId, status: JobStatus) -> MarketplaceResult<Job> {
        let job = self.get_job(id).await?;
        if !job.is_owned_by(&caller.uid) {
            return Err(MarketplaceError::unauthorized("Only the job owner can change its status."));
        }
        if job.status == status {
            return Ok(job);
        }

        if status == JobStatus::Open {
            let stats = self.application_stats(id).await?;
            if !job.can_reopen(&stats) {
                return Err(MarketplaceError::conflict(
                    "Cannot reopen: hire confirmed or proposal limit reached.",
                ));
            }
        }

        self.write_status(job, status).await
    }

    async fn reconcile_job_status(&self, id: JobId) -> MarketplaceResult<Job> {
        let job = self.get_job(id).await?;
        let stats = self.application_stats(id).await?;
        if job.should_close(&stats) {
            debug!(job_id = %id, total = stats.total, has_hire = stats.has_hire, "Auto-closing job");
            return self.write_status(job, JobStatus::Closed).await;
        }
        Ok(job)
    }

    async fn jobs_for_owner(&self, caller: &CurrentUser) -> MarketplaceResult<Vec<Job>> {
        let owned = self.jobs.find_by_owner(&caller.uid).await?;
        let mut reconciled = Vec::with_capacity(owned.len());

        for job in owned {
            if !job.is_open() {
                reconciled.push(job);
                continue;
            }
            match self.reconcile_job_status(job.id).await {
                Ok(current) => reconciled.push(current),
                Err(e) => {
                    warn!(job_id = %job.id, error = %e, "Failed to reconcile job status");
                    reconciled.push(job);
                }
            }
        }
        Ok(reconciled)
    }

    async fn recommended_jobs(&self, caller: &CurrentUser, limit: usize) -> MarketplaceResult<Vec<Job>> {
        let skills = self
            .profiles
            .find_by_uid(&caller.uid)
            .await?
            .map(|p| p.skills)
            .unwrap_or_default();

        let candidates = self
            .jobs
            .list_recent(RECOMMENDATION_POOL)
            .await?
            .into_iter()
            .filter(|job| !job.is_owned_by(&caller.uid) && job.is_open());

        if skills.is_empty() {
            return Ok(candidates.take(limit).collect());
        }

        // At least half of the caller's skills, rounded up
        let threshold = skills.len().div_ceil(2);
        Ok(candidates
            .filter(|job| job.matching_categories(&skills) >= threshold)
            .take(limit)
            .collect())
    }

    async fn close_job(&self, id: JobId) -> MarketplaceResult<bool> {
        let job = self.get_job(id).await?;
        if !job.is_open() {
            return Ok(false);
        }
        self.write_status(job, JobStatus::Closed).await?;
        Ok(true)
    }

    async fn reopen_job(&self, id: JobId) -> MarketplaceResult<bool> {
        let job = self.get_job(id).await?;
        if job.is_open() {
            return Ok(false);
        }
        let stats = self.application_stats(id).await?;
        if !job.can_reopen(&stats) {
            debug!(job_id = %id, total = stats.total, "Job stays closed after completion");
            return Ok(false);
        }
        self.write_status(job, JobStatus::Open).await?;
        Ok(true)
    }
}
