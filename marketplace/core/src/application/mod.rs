// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Application layer: use-case services over the repository contracts.
//!
//! [`Marketplace`] wires every service to one set of repositories and one
//! event bus.

pub mod claims;
pub mod jobs;
pub mod lifecycle;
pub mod payment;
pub mod feed;
pub mod financials;

use std::sync::Arc;
use tracing::info;

use crate::domain::config::MarketplaceConfig;
use crate::domain::repository::{ApplicationRepository, JobRepository, MessageRepository, ProfileRepository};
use crate::infrastructure::event_bus::EventBus;
use crate::infrastructure::repositories::{
    InMemoryApplicationRepository, InMemoryJobRepository, InMemoryMessageRepository, InMemoryProfileRepository,
};

use self::financials::FinancialsService;
use self::jobs::{JobPostingService, StandardJobPostingService};
use self::lifecycle::{ApplicationLifecycleService, StandardApplicationLifecycleService};
use self::payment::{PaymentProtocolService, StandardPaymentProtocolService};

/// The persistence gateway, one repository per collection
#[derive(Clone)]
pub struct Repositories {
    pub jobs: Arc<dyn JobRepository>,
    pub applications: Arc<dyn ApplicationRepository>,
    pub messages: Arc<dyn MessageRepository>,
    pub profiles: Arc<dyn ProfileRepository>,
}

impl Repositories {
    /// In-memory gateway whose message store publishes feed changes on `event_bus`
    pub fn in_memory(event_bus: &EventBus) -> Self {
        Self {
            jobs: Arc::new(InMemoryJobRepository::new()),
            applications: Arc::new(InMemoryApplicationRepository::new()),
            messages: Arc::new(InMemoryMessageRepository::with_event_bus(event_bus.clone())),
            profiles: Arc::new(InMemoryProfileRepository::new()),
        }
    }
}

pub struct Marketplace {
    pub config: MarketplaceConfig,
    pub event_bus: EventBus,
    pub repositories: Repositories,
    pub jobs: Arc<dyn JobPostingService>,
    pub lifecycle: Arc<dyn ApplicationLifecycleService>,
    pub payments: Arc<dyn PaymentProtocolService>,
    pub financials: FinancialsService,
}

impl Marketplace {
    pub fn new(config: MarketplaceConfig, repositories: Repositories, event_bus: EventBus) -> Self {
        let spec = &config.spec;

        let jobs: Arc<dyn JobPostingService> = Arc::new(StandardJobPostingService::new(
            repositories.jobs.clone(),
            repositories.applications.clone(),
            repositories.profiles.clone(),
            event_bus.clone(),
            spec.payments.default_currency.clone(),
        ));

        let lifecycle: Arc<dyn ApplicationLifecycleService> = Arc::new(StandardApplicationLifecycleService::new(
            repositories.applications.clone(),
            repositories.messages.clone(),
            repositories.profiles.clone(),
            jobs.clone(),
            event_bus.clone(),
            spec.applications.max_links,
        ));

        let payments: Arc<dyn PaymentProtocolService> = Arc::new(StandardPaymentProtocolService::new(
            repositories.applications.clone(),
            repositories.messages.clone(),
            jobs.clone(),
            lifecycle.clone(),
            event_bus.clone(),
            spec.payments.terms(),
            spec.payments.default_currency.clone(),
            spec.chat.page_size,
        ));

        let financials = FinancialsService::new(repositories.applications.clone());

        info!(
            name = %config.metadata.name,
            partial_rate = %spec.payments.partial_rate,
            default_currency = %spec.payments.default_currency,
            "Marketplace services initialized"
        );

        Self {
            config,
            event_bus,
            repositories,
            jobs,
            lifecycle,
            payments,
            financials,
        }
    }

    /// All services over a fresh in-memory gateway
    pub fn in_memory(config: MarketplaceConfig) -> Self {
        let event_bus = EventBus::new(config.spec.events.capacity);
        let repositories = Repositories::in_memory(&event_bus);
        Self::new(config, repositories, event_bus)
    }
}
