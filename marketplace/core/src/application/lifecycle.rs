// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Application Lifecycle Engine
//!
//! Owns the status transitions of applications and hire exclusivity per job.
//!
//! Every mutating operation checks its preconditions (validation, state,
//! caller of record) before the first write. Operations that touch several
//! documents perform one primary write, whose failure is surfaced, followed
//! by best-effort steps recorded in an [`EffectLog`]. Nothing is rolled back.

use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

use crate::application::claims::ClaimLocks;
use crate::application::jobs::JobPostingService;
use crate::domain::application::{normalize_links, Application, ApplicationId, ApplicationStatus, Decision};
use crate::domain::effects::EffectLog;
use crate::domain::error::{MarketplaceError, MarketplaceResult};
use crate::domain::events::ApplicationEvent;
use crate::domain::identity::{CurrentUser, Participant};
use crate::domain::job::JobId;
use crate::domain::message::Message;
use crate::domain::payment::{Milestones, Money, Stage};
use crate::domain::profile::UserProfile;
use crate::domain::repository::{ApplicationRepository, MessageRepository, ProfileRepository};
use crate::infrastructure::event_bus::EventBus;

/// Outcome of [`ApplicationLifecycleService::confirm_hire`]
#[derive(Debug, Clone, Serialize)]
pub struct HireReport {
    pub application: Application,
    /// Sibling applications deleted from the store
    pub removed: Vec<ApplicationId>,
    pub effects: EffectLog,
}

/// Outcome of [`ApplicationLifecycleService::complete_project`]
#[derive(Debug, Clone, Serialize)]
pub struct CompletionReport {
    pub application: Application,
    pub messages_removed: usize,
    pub effects: EffectLog,
}

/// An applicant's own applications, as shown on their dashboard
#[derive(Debug, Clone, Default, Serialize)]
pub struct ApplicantApplications {
    /// Pending or Short-listed
    pub active: Vec<Application>,
    pub rejected: Vec<Application>,
}

#[async_trait]
pub trait ApplicationLifecycleService: Send + Sync {
    async fn submit_application(
        &self,
        applicant: &CurrentUser,
        job_id: JobId,
        cover_letter: &str,
        links: &[String],
    ) -> MarketplaceResult<Application>;

    async fn decide(
        &self,
        caller: &CurrentUser,
        application_id: ApplicationId,
        decision: Decision,
    ) -> MarketplaceResult<Application>;

    async fn confirm_hire(&self, caller: &CurrentUser, application_id: ApplicationId) -> MarketplaceResult<HireReport>;

    async fn complete_project(
        &self,
        caller: &CurrentUser,
        application_id: ApplicationId,
    ) -> MarketplaceResult<CompletionReport>;

    /// Application visible to either participant
    async fn get_application(&self, caller: &CurrentUser, application_id: ApplicationId)
        -> MarketplaceResult<Application>;

    /// Review queue of an employer: applications not yet hired
    async fn applications_for_employer(&self, caller: &CurrentUser) -> MarketplaceResult<Vec<Application>>;

    async fn applications_for_applicant(&self, caller: &CurrentUser) -> MarketplaceResult<ApplicantApplications>;

    /// Applications the caller hired and that are still running
    async fn hires(&self, caller: &CurrentUser) -> MarketplaceResult<Vec<Application>>;

    /// Projects the caller finished as applicant
    async fn completed_projects(&self, caller: &CurrentUser) -> MarketplaceResult<Vec<Application>>;

    /// Profile of a short-listed applicant, for the employer of record
    async fn applicant_profile(&self, caller: &CurrentUser, application_id: ApplicationId)
        -> MarketplaceResult<UserProfile>;
}

pub struct StandardApplicationLifecycleService {
    applications: Arc<dyn ApplicationRepository>,
    messages: Arc<dyn MessageRepository>,
    profiles: Arc<dyn ProfileRepository>,
    jobs: Arc<dyn JobPostingService>,
    event_bus: EventBus,
    max_links: usize,
    job_claims: ClaimLocks<JobId>,
}

impl StandardApplicationLifecycleService {
    pub fn new(
        applications: Arc<dyn ApplicationRepository>,
        messages: Arc<dyn MessageRepository>,
        profiles: Arc<dyn ProfileRepository>,
        jobs: Arc<dyn JobPostingService>,
        event_bus: EventBus,
        max_links: usize,
    ) -> Self {
        Self {
            applications,
            messages,
            profiles,
            jobs,
            event_bus,
            max_links,
            job_claims: ClaimLocks::new(),
        }
    }

    async fn load(&self, application_id: ApplicationId) -> MarketplaceResult<Application> {
        self.applications
            .find_by_id(application_id)
            .await?
            .ok_or_else(|| MarketplaceError::not_found("Application"))
    }

    async fn load_as(
        &self,
        caller: &CurrentUser,
        application_id: ApplicationId,
        side: Participant,
    ) -> MarketplaceResult<Application> {
        let application = self.load(application_id).await?;
        if application.participant(&caller.uid) != Some(side) {
            return Err(match side {
                Participant::Employer => {
                    MarketplaceError::unauthorized("Only the employer of this job can do that.")
                }
                Participant::Applicant => {
                    MarketplaceError::unauthorized("Only the applicant of this application can do that.")
                }
            });
        }
        Ok(application)
    }

    async fn wipe_messages(&self, history: &[Message], effects: &mut EffectLog) -> usize {
        let mut removed = 0;
        for message in history {
            let step = format!("delete_message:{}", message.id);
            match self.messages.delete(message.application_id, message.id).await {
                Ok(()) => {
                    effects.succeeded(step);
                    removed += 1;
                }
                Err(e) => {
                    warn!(message_id = %message.id, error = %e, "Failed to delete message");
                    effects.failed(step, e);
                }
            }
        }
        removed
    }
}

#[async_trait]
impl ApplicationLifecycleService for StandardApplicationLifecycleService {
    /// Submit a Pending application.
    ///
    /// Step 1: load the job and refuse the owner
    /// Step 2: under the job claim, refuse duplicates and closed jobs
    /// Step 3: write the application
    /// Step 4: close the job if this submission reached its cap (best effort)
    async fn submit_application(
        &self,
        applicant: &CurrentUser,
        job_id: JobId,
        cover_letter: &str,
        links: &[String],
    ) -> MarketplaceResult<Application> {
        let job = self.jobs.get_job(job_id).await?;
        if job.is_owned_by(&applicant.uid) {
            return Err(MarketplaceError::unauthorized("You cannot apply to your own job."));
        }

        let _claim = self.job_claims.acquire(&job_id).await;

        if self
            .applications
            .find_by_job_and_applicant(job_id, &applicant.uid)
            .await?
            .is_some()
        {
            return Err(MarketplaceError::conflict("You already applied to this job."));
        }

        let stats = self.jobs.application_stats(job_id).await?;
        if !job.accepts_applications(&stats) {
            return Err(MarketplaceError::conflict("Applications are closed for this job."));
        }

        if cover_letter.trim().is_empty() {
            return Err(MarketplaceError::validation("Please add a cover letter."));
        }

        let links = normalize_links(links, self.max_links);
        let application = Application::submit(&job, applicant, cover_letter, links);
        self.applications.save(&application).await?;

        self.event_bus.publish_application_event(ApplicationEvent::ApplicationSubmitted {
            application_id: application.id,
            job_id,
            applicant_id: applicant.uid.clone(),
            submitted_at: application.created_at,
        });
        info!(
            application_id = %application.id,
            job_id = %job_id,
            applicant = %applicant.uid,
            "Application submitted"
        );

        if job.cap_reached(stats.total + 1) {
            if let Err(e) = self.jobs.close_job(job_id).await {
                warn!(job_id = %job_id, error = %e, "Failed to close job at proposal cap");
            }
        }

        Ok(application)
    }

    async fn decide(
        &self,
        caller: &CurrentUser,
        application_id: ApplicationId,
        decision: Decision,
    ) -> MarketplaceResult<Application> {
        let job_id = self.load_as(caller, application_id, Participant::Employer).await?.job_id;
        let _claim = self.job_claims.acquire(&job_id).await;

        // A concurrent hire may have removed this application meanwhile
        let mut application = self.load_as(caller, application_id, Participant::Employer).await?;
        application.decide(decision)?;
        self.applications.save(&application).await?;

        self.event_bus.publish_application_event(ApplicationEvent::ApplicationDecided {
            application_id,
            status: application.status,
            decided_at: Utc::now(),
        });
        info!(application_id = %application_id, status = %application.status, "Application decided");
        Ok(application)
    }

    /// Hire a short-listed applicant.
    ///
    /// Step 1: refuse if another application of the job is already Hired
    /// Step 2: set Hired + hiredAt (primary write)
    /// Step 3: close the job (best effort)
    /// Step 4: delete every other application of the job (best effort)
    async fn confirm_hire(&self, caller: &CurrentUser, application_id: ApplicationId) -> MarketplaceResult<HireReport> {
        let job_id = self.load_as(caller, application_id, Participant::Employer).await?.job_id;
        let _claim = self.job_claims.acquire(&job_id).await;

        // Re-read under the claim
        let mut application = self.load_as(caller, application_id, Participant::Employer).await?;
        let siblings: Vec<Application> = self
            .applications
            .find_by_job(job_id)
            .await?
            .into_iter()
            .filter(|a| a.id != application_id)
            .collect();

        if siblings.iter().any(|a| a.status == ApplicationStatus::Hired) {
            return Err(MarketplaceError::conflict("This job already has a hired applicant."));
        }

        let hired_at = Utc::now();
        application.hire(hired_at)?;
        self.applications.save(&application).await?;

        self.event_bus.publish_application_event(ApplicationEvent::HireConfirmed {
            application_id,
            job_id,
            hired_at,
        });
        info!(application_id = %application_id, job_id = %job_id, "Hire confirmed");

        let mut effects = EffectLog::new();
        match self.jobs.close_job(job_id).await {
            Ok(true) => effects.succeeded("close_job"),
            Ok(false) => effects.skipped("close_job", "job already closed"),
            Err(e) => {
                warn!(job_id = %job_id, error = %e, "Failed to close job after hire");
                effects.failed("close_job", e);
            }
        }

        let mut removed = Vec::new();
        for sibling in siblings {
            let step = format!("delete_application:{}", sibling.id);
            match self.applications.delete(sibling.id).await {
                Ok(()) => {
                    effects.succeeded(step);
                    removed.push(sibling.id);
                    self.event_bus.publish_application_event(ApplicationEvent::SiblingRemoved {
                        application_id: sibling.id,
                        job_id,
                        removed_at: Utc::now(),
                    });
                }
                Err(e) => {
                    warn!(application_id = %sibling.id, error = %e, "Failed to delete sibling application");
                    effects.failed(step, e);
                }
            }
        }

        Ok(HireReport {
            application,
            removed,
            effects,
        })
    }

    /// Close out a paid project.
    ///
    /// Step 1: require the applicant of record, status Hired and a `pay-full`
    /// Step 2: set Completed + completedAt + payout (primary write)
    /// Step 3: reopen the job (best effort)
    /// Step 4: delete every message of the conversation (best effort)
    async fn complete_project(
        &self,
        caller: &CurrentUser,
        application_id: ApplicationId,
    ) -> MarketplaceResult<CompletionReport> {
        let mut application = self.load_as(caller, application_id, Participant::Applicant).await?;
        if application.status != ApplicationStatus::Hired {
            return Err(MarketplaceError::conflict("Only hired projects can be completed."));
        }

        let history = self.messages.list_all(application_id).await?;
        let payout: Option<Money> = {
            let milestones = Milestones::scan(&history);
            if milestones.stage() != Stage::End {
                return Err(MarketplaceError::conflict(
                    "The project can only end after the full payment was sent.",
                ));
            }
            milestones.agreed()
        };

        let completed_at = Utc::now();
        application.complete(payout, completed_at)?;
        self.applications.save(&application).await?;

        self.event_bus.publish_application_event(ApplicationEvent::ProjectCompleted {
            application_id,
            job_id: application.job_id,
            completed_at,
        });
        info!(application_id = %application_id, job_id = %application.job_id, "Project completed");

        let mut effects = EffectLog::new();
        match self.jobs.reopen_job(application.job_id).await {
            Ok(true) => effects.succeeded("reopen_job"),
            Ok(false) => effects.skipped("reopen_job", "job stays closed"),
            Err(e) => {
                warn!(job_id = %application.job_id, error = %e, "Failed to reopen job after completion");
                effects.failed("reopen_job", e);
            }
        }

        let messages_removed = self.wipe_messages(&history, &mut effects).await;

        Ok(CompletionReport {
            application,
            messages_removed,
            effects,
        })
    }

    async fn get_application(
        &self,
        caller: &CurrentUser,
        application_id: ApplicationId,
    ) -> MarketplaceResult<Application> {
        let application = self.load(application_id).await?;
        if application.participant(&caller.uid).is_none() {
            return Err(MarketplaceError::unauthorized("You are not part of this application."));
        }
        Ok(application)
    }

    async fn applications_for_employer(&self, caller: &CurrentUser) -> MarketplaceResult<Vec<Application>> {
        Ok(self
            .applications
            .find_by_employer(&caller.uid)
            .await?
            .into_iter()
            .filter(|a| !matches!(a.status, ApplicationStatus::Hired | ApplicationStatus::Completed))
            .collect())
    }

    async fn applications_for_applicant(&self, caller: &CurrentUser) -> MarketplaceResult<ApplicantApplications> {
        let mut split = ApplicantApplications::default();
        for application in self.applications.find_by_applicant(&caller.uid).await? {
            match application.status {
                ApplicationStatus::Pending | ApplicationStatus::ShortListed => split.active.push(application),
                ApplicationStatus::Rejected => split.rejected.push(application),
                ApplicationStatus::Hired | ApplicationStatus::Completed => {}
            }
        }
        Ok(split)
    }

    async fn hires(&self, caller: &CurrentUser) -> MarketplaceResult<Vec<Application>> {
        Ok(self
            .applications
            .find_by_employer(&caller.uid)
            .await?
            .into_iter()
            .filter(|a| a.status == ApplicationStatus::Hired)
            .collect())
    }

    async fn completed_projects(&self, caller: &CurrentUser) -> MarketplaceResult<Vec<Application>> {
        Ok(self
            .applications
            .find_by_applicant(&caller.uid)
            .await?
            .into_iter()
            .filter(|a| a.status == ApplicationStatus::Completed)
            .collect())
    }

    async fn applicant_profile(
        &self,
        caller: &CurrentUser,
        application_id: ApplicationId,
    ) -> MarketplaceResult<UserProfile> {
        let application = self.load_as(caller, application_id, Participant::Employer).await?;
        if application.status != ApplicationStatus::ShortListed {
            return Err(MarketplaceError::conflict(
                "Applicant profiles are visible only for short-listed applications.",
            ));
        }
        self.profiles
            .find_by_uid(&application.applicant_id)
            .await?
            .ok_or_else(|| MarketplaceError::not_found("Profile"))
    }
}
