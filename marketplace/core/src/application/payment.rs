// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Payment Negotiation Protocol
//!
//! Drives the staged payment flow of a Hired application by appending
//! milestone messages to its conversation feed. The stage is never stored:
//! every action re-derives it from the feed and is accepted only when the
//! derived stage is the stage the action belongs to.
//!
//! | Action | Stage | Actor |
//! |--------|-------|-------|
//! | `propose_pay` | propose | employer |
//! | `respond_to_proposal` | await-response | applicant |
//! | `send_partial_pay` | partial-pay | employer |
//! | `confirm_partial_received` | partial-receipt | applicant |
//! | `mark_delivered` | delivery | applicant |
//! | `send_full_pay` | full-pay | employer |
//! | `end_project` | end | applicant |
//!
//! Appends for one application are serialized in-process by a claim lock,
//! so two racing clicks cannot both pass the stage check.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

use crate::application::claims::ClaimLocks;
use crate::application::feed::LiveFeed;
use crate::application::jobs::JobPostingService;
use crate::application::lifecycle::{ApplicationLifecycleService, CompletionReport};
use crate::domain::application::{Application, ApplicationId, ApplicationStatus};
use crate::domain::error::{MarketplaceError, MarketplaceResult};
use crate::domain::identity::{CurrentUser, Participant};
use crate::domain::message::{Message, MessageId, MessageKind};
use crate::domain::payment::{Milestones, Money, PaymentTerms, Stage};
use crate::domain::repository::{ApplicationRepository, MessageRepository};
use crate::infrastructure::event_bus::EventBus;

/// Where an engagement stands, as seen by one participant.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentSnapshot {
    pub stage: Stage,
    /// Whether the viewing participant is the one expected to act
    pub your_turn: bool,
    pub pending_proposal: Option<MessageId>,
    pub agreed: Option<Money>,
    /// Upfront instalment due (or paid) on the agreed price
    pub partial: Option<Money>,
    /// Final instalment due (or paid) on the agreed price
    pub full: Option<Money>,
}

#[async_trait]
pub trait PaymentProtocolService: Send + Sync {
    async fn send_chat(&self, caller: &CurrentUser, application_id: ApplicationId, text: &str)
        -> MarketplaceResult<Message>;

    /// `currency` falls back to the job's posted currency, then the default
    async fn propose_pay(
        &self,
        caller: &CurrentUser,
        application_id: ApplicationId,
        amount: Decimal,
        currency: Option<&str>,
    ) -> MarketplaceResult<Message>;

    async fn respond_to_proposal(
        &self,
        caller: &CurrentUser,
        application_id: ApplicationId,
        proposal_id: MessageId,
        accept: bool,
    ) -> MarketplaceResult<Message>;

    async fn send_partial_pay(&self, caller: &CurrentUser, application_id: ApplicationId) -> MarketplaceResult<Message>;

    async fn confirm_partial_received(
        &self,
        caller: &CurrentUser,
        application_id: ApplicationId,
    ) -> MarketplaceResult<Message>;

    async fn mark_delivered(&self, caller: &CurrentUser, application_id: ApplicationId) -> MarketplaceResult<Message>;

    async fn send_full_pay(&self, caller: &CurrentUser, application_id: ApplicationId) -> MarketplaceResult<Message>;

    async fn end_project(
        &self,
        caller: &CurrentUser,
        application_id: ApplicationId,
    ) -> MarketplaceResult<CompletionReport>;

    async fn snapshot(&self, caller: &CurrentUser, application_id: ApplicationId) -> MarketplaceResult<PaymentSnapshot>;

    async fn current_stage(&self, caller: &CurrentUser, application_id: ApplicationId) -> MarketplaceResult<Stage>;

    /// Paged conversation view with a live window over the newest page
    async fn open_feed(&self, caller: &CurrentUser, application_id: ApplicationId) -> MarketplaceResult<LiveFeed>;
}

pub struct StandardPaymentProtocolService {
    applications: Arc<dyn ApplicationRepository>,
    messages: Arc<dyn MessageRepository>,
    jobs: Arc<dyn JobPostingService>,
    lifecycle: Arc<dyn ApplicationLifecycleService>,
    event_bus: EventBus,
    terms: PaymentTerms,
    default_currency: String,
    page_size: usize,
    claims: ClaimLocks<ApplicationId>,
}

impl StandardPaymentProtocolService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        applications: Arc<dyn ApplicationRepository>,
        messages: Arc<dyn MessageRepository>,
        jobs: Arc<dyn JobPostingService>,
        lifecycle: Arc<dyn ApplicationLifecycleService>,
        event_bus: EventBus,
        terms: PaymentTerms,
        default_currency: impl Into<String>,
        page_size: usize,
    ) -> Self {
        Self {
            applications,
            messages,
            jobs,
            lifecycle,
            event_bus,
            terms,
            default_currency: default_currency.into(),
            page_size,
            claims: ClaimLocks::new(),
        }
    }

    async fn load_participant(
        &self,
        caller: &CurrentUser,
        application_id: ApplicationId,
    ) -> MarketplaceResult<(Application, Participant)> {
        let application = self
            .applications
            .find_by_id(application_id)
            .await?
            .ok_or_else(|| MarketplaceError::not_found("Application"))?;
        let side = application
            .participant(&caller.uid)
            .ok_or_else(|| MarketplaceError::unauthorized("You are not part of this conversation."))?;
        Ok((application, side))
    }

    /// Checks the caller may act at `stage` on a Hired application
    async fn load_for_stage(
        &self,
        caller: &CurrentUser,
        application_id: ApplicationId,
        stage: Stage,
    ) -> MarketplaceResult<Application> {
        let (application, side) = self.load_participant(caller, application_id).await?;
        match stage.actor() {
            Some(actor) if actor == side => {}
            Some(actor) => {
                return Err(MarketplaceError::unauthorized(format!(
                    "Only the {} can act at the {} stage.",
                    actor, stage
                )))
            }
            None => return Err(Self::stage_mismatch(stage)),
        }
        if application.status != ApplicationStatus::Hired {
            return Err(MarketplaceError::conflict("Payments are only available for hired applications."));
        }
        Ok(application)
    }

    fn stage_mismatch(current: Stage) -> MarketplaceError {
        MarketplaceError::conflict(format!("This action is not available at the {} stage.", current))
    }

    /// Appends the milestone built by `build` if the feed is at `stage`.
    ///
    /// Step 1: authorize the caller for `stage`
    /// Step 2: claim the application and re-derive the stage from the feed
    /// Step 3: build the milestone from the derived history and append it
    async fn append_milestone<F>(
        &self,
        caller: &CurrentUser,
        application_id: ApplicationId,
        stage: Stage,
        build: F,
    ) -> MarketplaceResult<Message>
    where
        F: FnOnce(&Milestones<'_>) -> MarketplaceResult<MessageKind> + Send,
    {
        self.load_for_stage(caller, application_id, stage).await?;
        let _claim = self.claims.acquire(&application_id).await;

        // Status may have moved while waiting for the claim
        self.load_for_stage(caller, application_id, stage).await?;
        let history = self.messages.list_all(application_id).await?;
        let kind = {
            let milestones = Milestones::scan(&history);
            let current = milestones.stage();
            if current != stage {
                return Err(Self::stage_mismatch(current));
            }
            build(&milestones)?
        };

        let message = Message::new(application_id, caller, kind);
        self.messages.append(&message).await?;
        info!(
            application_id = %application_id,
            message_id = %message.id,
            kind = message.kind.type_name(),
            sender = %caller.uid,
            "Milestone appended"
        );
        Ok(message)
    }

    async fn resolve_currency(&self, application: &Application, requested: Option<&str>) -> String {
        if let Some(currency) = requested.map(str::trim).filter(|c| !c.is_empty()) {
            return currency.to_uppercase();
        }
        match self.jobs.get_job(application.job_id).await {
            Ok(job) if !job.payout.currency.trim().is_empty() => job.payout.currency,
            Ok(_) => self.default_currency.clone(),
            Err(e) => {
                warn!(job_id = %application.job_id, error = %e, "Job lookup failed, using default currency");
                self.default_currency.clone()
            }
        }
    }

    fn agreed_price(milestones: &Milestones<'_>) -> MarketplaceResult<Money> {
        milestones
            .agreed()
            .ok_or_else(|| MarketplaceError::conflict("No accepted pay proposal was found."))
    }
}

#[async_trait]
impl PaymentProtocolService for StandardPaymentProtocolService {
    async fn send_chat(
        &self,
        caller: &CurrentUser,
        application_id: ApplicationId,
        text: &str,
    ) -> MarketplaceResult<Message> {
        let text = text.trim();
        if text.is_empty() {
            return Err(MarketplaceError::validation("Message cannot be empty."));
        }
        self.load_participant(caller, application_id).await?;

        let message = Message::new(
            application_id,
            caller,
            MessageKind::Chat {
                text: text.to_string(),
            },
        );
        self.messages.append(&message).await?;
        Ok(message)
    }

    async fn propose_pay(
        &self,
        caller: &CurrentUser,
        application_id: ApplicationId,
        amount: Decimal,
        currency: Option<&str>,
    ) -> MarketplaceResult<Message> {
        if amount <= Decimal::ZERO {
            return Err(MarketplaceError::validation("Please enter a valid pay amount above 0."));
        }
        let application = self.load_for_stage(caller, application_id, Stage::Propose).await?;
        let price = Money::new(amount, self.resolve_currency(&application, currency).await);

        self.append_milestone(caller, application_id, Stage::Propose, |_| {
            Ok(MessageKind::proposal(&price))
        })
        .await
    }

    async fn respond_to_proposal(
        &self,
        caller: &CurrentUser,
        application_id: ApplicationId,
        proposal_id: MessageId,
        accept: bool,
    ) -> MarketplaceResult<Message> {
        self.load_for_stage(caller, application_id, Stage::AwaitResponse).await?;
        let _claim = self.claims.acquire(&application_id).await;

        let history = self.messages.list_all(application_id).await?;
        let current = Milestones::scan(&history).stage();
        if current != Stage::AwaitResponse {
            return Err(Self::stage_mismatch(current));
        }

        let mut proposal = history
            .into_iter()
            .find(|m| m.id == proposal_id && m.proposal_status().is_some())
            .ok_or_else(|| MarketplaceError::not_found("Proposal"))?;
        if !proposal.respond(&caller.uid, accept) {
            return Err(MarketplaceError::conflict("This proposal was already answered."));
        }

        self.messages.update(&proposal).await?;
        info!(
            application_id = %application_id,
            message_id = %proposal_id,
            accepted = accept,
            "Pay proposal answered"
        );
        Ok(proposal)
    }

    async fn send_partial_pay(&self, caller: &CurrentUser, application_id: ApplicationId) -> MarketplaceResult<Message> {
        let terms = self.terms;
        self.append_milestone(caller, application_id, Stage::PartialPay, |milestones| {
            let agreed = Self::agreed_price(milestones)?;
            Ok(MessageKind::PayPartial {
                amount: terms.partial_amount(agreed.amount),
                currency: agreed.currency,
            })
        })
        .await
    }

    async fn confirm_partial_received(
        &self,
        caller: &CurrentUser,
        application_id: ApplicationId,
    ) -> MarketplaceResult<Message> {
        self.append_milestone(caller, application_id, Stage::PartialReceipt, |milestones| {
            let partial = milestones
                .partial_pay
                .and_then(Message::money)
                .ok_or_else(|| MarketplaceError::conflict("No partial payment was found."))?;
            Ok(MessageKind::PayPartialReceived {
                amount: partial.amount,
                currency: partial.currency,
            })
        })
        .await
    }

    async fn mark_delivered(&self, caller: &CurrentUser, application_id: ApplicationId) -> MarketplaceResult<Message> {
        self.append_milestone(caller, application_id, Stage::Delivery, |_| {
            Ok(MessageKind::ProjectDelivered)
        })
        .await
    }

    async fn send_full_pay(&self, caller: &CurrentUser, application_id: ApplicationId) -> MarketplaceResult<Message> {
        let terms = self.terms;
        self.append_milestone(caller, application_id, Stage::FullPay, |milestones| {
            let agreed = Self::agreed_price(milestones)?;
            Ok(MessageKind::PayFull {
                amount: terms.full_amount(agreed.amount),
                currency: agreed.currency,
            })
        })
        .await
    }

    async fn end_project(
        &self,
        caller: &CurrentUser,
        application_id: ApplicationId,
    ) -> MarketplaceResult<CompletionReport> {
        let _claim = self.claims.acquire(&application_id).await;
        self.lifecycle.complete_project(caller, application_id).await
    }

    async fn snapshot(&self, caller: &CurrentUser, application_id: ApplicationId) -> MarketplaceResult<PaymentSnapshot> {
        let (application, side) = self.load_participant(caller, application_id).await?;

        if application.status == ApplicationStatus::Completed {
            let agreed = application.payout.clone();
            return Ok(PaymentSnapshot {
                stage: Stage::Ended,
                your_turn: false,
                pending_proposal: None,
                partial: agreed
                    .as_ref()
                    .map(|m| Money::new(self.terms.partial_amount(m.amount), m.currency.clone())),
                full: agreed
                    .as_ref()
                    .map(|m| Money::new(self.terms.full_amount(m.amount), m.currency.clone())),
                agreed,
            });
        }

        let history = self.messages.list_all(application_id).await?;
        let milestones = Milestones::scan(&history);
        let stage = milestones.stage();
        let agreed = milestones.agreed();

        Ok(PaymentSnapshot {
            stage,
            your_turn: application.status == ApplicationStatus::Hired && stage.actor() == Some(side),
            pending_proposal: milestones.pending_proposal.map(|m| m.id),
            partial: agreed
                .as_ref()
                .map(|m| Money::new(self.terms.partial_amount(m.amount), m.currency.clone())),
            full: agreed
                .as_ref()
                .map(|m| Money::new(self.terms.full_amount(m.amount), m.currency.clone())),
            agreed,
        })
    }

    async fn current_stage(&self, caller: &CurrentUser, application_id: ApplicationId) -> MarketplaceResult<Stage> {
        Ok(self.snapshot(caller, application_id).await?.stage)
    }

    async fn open_feed(&self, caller: &CurrentUser, application_id: ApplicationId) -> MarketplaceResult<LiveFeed> {
        self.load_participant(caller, application_id).await?;
        LiveFeed::open(
            self.messages.clone(),
            &self.event_bus,
            application_id,
            self.page_size,
        )
        .await
    }
}
