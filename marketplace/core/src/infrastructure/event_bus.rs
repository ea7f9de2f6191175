// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Event Bus - Pub/Sub for Marketplace Events
//
// In-memory fan-out over a tokio broadcast channel. Services publish
// lifecycle and job events; the message store publishes feed events after
// each write, which is what live conversation views subscribe to.
//
// Events are not persisted. A subscriber that falls more than `capacity`
// events behind loses the oldest ones and must re-read the store.

use crate::domain::application::ApplicationId;
use crate::domain::events::{ApplicationEvent, FeedEvent, JobEvent};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, warn};

/// Unified event type carried by the bus
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DomainEvent {
    Application(ApplicationEvent),
    Job(JobEvent),
    Feed(FeedEvent),
}

#[derive(Clone)]
pub struct EventBus {
    sender: Arc<broadcast::Sender<DomainEvent>>,
}

impl EventBus {
    /// Capacity is the number of events buffered per subscriber before the
    /// oldest are dropped.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender: Arc::new(sender),
        }
    }

    pub fn with_default_capacity() -> Self {
        Self::new(1000)
    }

    pub fn publish_application_event(&self, event: ApplicationEvent) {
        self.publish(DomainEvent::Application(event));
    }

    pub fn publish_job_event(&self, event: JobEvent) {
        self.publish(DomainEvent::Job(event));
    }

    pub fn publish_feed_event(&self, event: FeedEvent) {
        self.publish(DomainEvent::Feed(event));
    }

    fn publish(&self, event: DomainEvent) {
        debug!("Publishing event: {:?}", event);

        // send() only fails when nobody is subscribed
        let receiver_count = self.sender.send(event).unwrap_or(0);
        if receiver_count == 0 {
            debug!("No subscribers listening to event");
        }
    }

    /// Subscribe to every event on the bus
    pub fn subscribe(&self) -> EventReceiver {
        EventReceiver {
            receiver: self.sender.subscribe(),
        }
    }

    /// Subscribe to feed changes of a single conversation
    pub fn subscribe_feed(&self, application_id: ApplicationId) -> FeedEventReceiver {
        FeedEventReceiver {
            receiver: self.sender.subscribe(),
            application_id,
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::with_default_capacity()
    }
}

fn map_recv_error(e: broadcast::error::RecvError) -> EventBusError {
    match e {
        broadcast::error::RecvError::Closed => EventBusError::Closed,
        broadcast::error::RecvError::Lagged(n) => {
            warn!("Event receiver lagged by {} events", n);
            EventBusError::Lagged(n)
        }
    }
}

fn map_try_recv_error(e: broadcast::error::TryRecvError) -> EventBusError {
    match e {
        broadcast::error::TryRecvError::Empty => EventBusError::Empty,
        broadcast::error::TryRecvError::Closed => EventBusError::Closed,
        broadcast::error::TryRecvError::Lagged(n) => {
            warn!("Event receiver lagged by {} events", n);
            EventBusError::Lagged(n)
        }
    }
}

pub struct EventReceiver {
    receiver: broadcast::Receiver<DomainEvent>,
}

impl EventReceiver {
    pub async fn recv(&mut self) -> Result<DomainEvent, EventBusError> {
        self.receiver.recv().await.map_err(map_recv_error)
    }

    pub fn try_recv(&mut self) -> Result<DomainEvent, EventBusError> {
        self.receiver.try_recv().map_err(map_try_recv_error)
    }
}

/// Feed events of one application; everything else is skipped
pub struct FeedEventReceiver {
    receiver: broadcast::Receiver<DomainEvent>,
    application_id: ApplicationId,
}

impl FeedEventReceiver {
    pub fn application_id(&self) -> ApplicationId {
        self.application_id
    }

    pub async fn recv(&mut self) -> Result<FeedEvent, EventBusError> {
        loop {
            let event = self.receiver.recv().await.map_err(map_recv_error)?;
            if let Some(feed_event) = self.filter(event) {
                return Ok(feed_event);
            }
        }
    }

    /// Next matching event already buffered, or `EventBusError::Empty`
    pub fn try_recv(&mut self) -> Result<FeedEvent, EventBusError> {
        loop {
            let event = self.receiver.try_recv().map_err(map_try_recv_error)?;
            if let Some(feed_event) = self.filter(event) {
                return Ok(feed_event);
            }
        }
    }

    fn filter(&self, event: DomainEvent) -> Option<FeedEvent> {
        match event {
            DomainEvent::Feed(feed_event) if feed_event.application_id() == self.application_id => Some(feed_event),
            _ => None,
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum EventBusError {
    #[error("Event bus is closed")]
    Closed,

    #[error("No events available")]
    Empty,

    #[error("Receiver lagged by {0} events (events were dropped)")]
    Lagged(u64),
}
