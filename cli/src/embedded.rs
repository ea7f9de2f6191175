// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Embedded mode execution
//!
//! Creates the marketplace services in-process over the in-memory gateway and
//! taps the event bus so commands can show what happened.

use anyhow::{Context, Result};
use colored::Colorize;
use std::path::PathBuf;

use stutask_core::domain::config::MarketplaceConfig;
use stutask_core::domain::events::{ApplicationEvent, FeedEvent, JobEvent};
use stutask_core::infrastructure::event_bus::{DomainEvent, EventReceiver};
use stutask_core::Marketplace;

pub struct EmbeddedMarketplace {
    market: Marketplace,
    events: EventReceiver,
}

impl EmbeddedMarketplace {
    pub fn new(config_path: Option<PathBuf>) -> Result<Self> {
        let config = MarketplaceConfig::load_or_default(config_path).context("Failed to load configuration")?;
        Self::from_config(config)
    }

    pub fn from_config(config: MarketplaceConfig) -> Result<Self> {
        config.validate().context("Configuration validation failed")?;

        let market = Marketplace::in_memory(config);
        let events = market.event_bus.subscribe();
        Ok(Self { market, events })
    }

    pub fn marketplace(&self) -> &Marketplace {
        &self.market
    }

    /// Events published since the last drain, oldest first
    pub fn drain_events(&mut self) -> Vec<DomainEvent> {
        let mut drained = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            drained.push(event);
        }
        drained
    }

    pub fn print_events(&mut self) {
        for event in self.drain_events() {
            print_event(&event);
        }
    }
}

pub fn describe_event(event: &DomainEvent) -> String {
    match event {
        DomainEvent::Application(event) => match event {
            ApplicationEvent::ApplicationSubmitted { applicant_id, job_id, .. } => {
                format!("application submitted by {} for job {}", applicant_id, job_id)
            }
            ApplicationEvent::ApplicationDecided {
                application_id, status, ..
            } => format!("application {} is now {}", application_id, status),
            ApplicationEvent::HireConfirmed { application_id, .. } => {
                format!("hire confirmed for application {}", application_id)
            }
            ApplicationEvent::SiblingRemoved { application_id, .. } => {
                format!("competing application {} removed", application_id)
            }
            ApplicationEvent::ProjectCompleted { application_id, .. } => {
                format!("project {} completed", application_id)
            }
        },
        DomainEvent::Job(event) => match event {
            JobEvent::JobPosted { job_id, .. } => format!("job {} posted", job_id),
            JobEvent::JobStatusChanged { job_id, status, .. } => format!("job {} is now {}", job_id, status),
        },
        DomainEvent::Feed(event) => match event {
            FeedEvent::MessageAppended { message_id, .. } => format!("message {} appended", message_id),
            FeedEvent::MessageUpdated { message_id, .. } => format!("message {} updated", message_id),
            FeedEvent::MessageDeleted { message_id, .. } => format!("message {} deleted", message_id),
        },
    }
}

fn print_event(event: &DomainEvent) {
    let line = describe_event(event);
    match event {
        DomainEvent::Application(_) => println!("    {} {}", "event".cyan(), line),
        DomainEvent::Job(_) => println!("    {} {}", "event".blue(), line),
        DomainEvent::Feed(_) => println!("    {} {}", "event".dimmed(), line.dimmed()),
    }
}
