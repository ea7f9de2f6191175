// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Conversation feed view
//!
//! A feed is read in fixed-size pages, newest first, and shown in
//! chronological order. Only the newest page (the live window) follows
//! store changes; pages loaded with [`MessageFeed::load_older`] are fetched
//! once and never refreshed.

use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

use crate::domain::application::ApplicationId;
use crate::domain::error::{MarketplaceError, MarketplaceResult};
use crate::domain::events::FeedEvent;
use crate::domain::message::{Message, MessageId};
use crate::domain::repository::{MessageRepository, RepositoryError};
use crate::infrastructure::event_bus::{EventBus, EventBusError, FeedEventReceiver};

pub struct MessageFeed {
    application_id: ApplicationId,
    store: Arc<dyn MessageRepository>,
    page_size: usize,
    /// Messages older than the live window, chronological
    history: Vec<Message>,
    /// Newest page, chronological
    live: Vec<Message>,
    /// Oldest message fetched so far
    cursor: Option<MessageId>,
    has_more: bool,
}

impl MessageFeed {
    pub async fn open(
        store: Arc<dyn MessageRepository>,
        application_id: ApplicationId,
        page_size: usize,
    ) -> MarketplaceResult<Self> {
        let mut feed = Self {
            application_id,
            store,
            page_size: page_size.max(1),
            history: Vec::new(),
            live: Vec::new(),
            cursor: None,
            has_more: false,
        };
        feed.reset().await?;
        Ok(feed)
    }

    async fn fetch_page(&self, before: Option<MessageId>) -> MarketplaceResult<Vec<Message>> {
        let mut page = self.store.page(self.application_id, before, self.page_size).await?;
        page.reverse();
        Ok(page)
    }

    /// Drops everything fetched and reads the newest page again
    pub async fn reset(&mut self) -> MarketplaceResult<()> {
        let window = self.fetch_page(None).await?;
        self.has_more = window.len() == self.page_size;
        self.cursor = window.first().map(|m| m.id);
        self.history.clear();
        self.live = window;
        Ok(())
    }

    /// Fetches the page before the oldest message loaded. Returns the number
    /// of messages added.
    pub async fn load_older(&mut self) -> MarketplaceResult<usize> {
        let Some(cursor) = self.cursor.filter(|_| self.has_more) else {
            return Ok(0);
        };

        let mut page = self.fetch_page(Some(cursor)).await?;
        self.has_more = page.len() == self.page_size;
        if let Some(oldest) = page.first() {
            self.cursor = Some(oldest.id);
        }

        let added = page.len();
        page.append(&mut self.history);
        self.history = page;
        debug!(application_id = %self.application_id, added, has_more = self.has_more, "Loaded older messages");
        Ok(added)
    }

    /// Re-reads the newest page. A message that left the window is kept as
    /// history only while the store still holds it (it slid out behind newer
    /// messages); otherwise it was deleted and is dropped.
    pub async fn refresh_live_window(&mut self) -> MarketplaceResult<()> {
        let window = self.fetch_page(None).await?;
        let window_ids: HashSet<MessageId> = window.iter().map(|m| m.id).collect();

        let previous = std::mem::replace(&mut self.live, window);
        let mut slid_out = Vec::new();
        for message in previous.into_iter().filter(|m| !window_ids.contains(&m.id)) {
            if self.store.find_by_id(self.application_id, message.id).await?.is_some() {
                slid_out.push(message);
            }
        }

        self.history.retain(|m| !window_ids.contains(&m.id));
        self.history.extend(slid_out);
        self.cursor = self.history.first().or(self.live.first()).map(|m| m.id);
        Ok(())
    }

    /// Everything loaded, merged by id, in chronological order
    pub fn messages(&self) -> Vec<Message> {
        let live_ids: HashSet<MessageId> = self.live.iter().map(|m| m.id).collect();
        self.history
            .iter()
            .filter(|m| !live_ids.contains(&m.id))
            .chain(self.live.iter())
            .cloned()
            .collect()
    }

    /// True while the last page fetched from the past was full
    pub fn has_more(&self) -> bool {
        self.has_more
    }

    pub fn application_id(&self) -> ApplicationId {
        self.application_id
    }
}

/// A [`MessageFeed`] whose live window follows store changes. Dropping it
/// ends the subscription.
pub struct LiveFeed {
    feed: MessageFeed,
    changes: FeedEventReceiver,
}

impl LiveFeed {
    pub async fn open(
        store: Arc<dyn MessageRepository>,
        event_bus: &EventBus,
        application_id: ApplicationId,
        page_size: usize,
    ) -> MarketplaceResult<Self> {
        // Subscribe first so no write between the read and the subscription is missed
        let changes = event_bus.subscribe_feed(application_id);
        let feed = MessageFeed::open(store, application_id, page_size).await?;
        Ok(Self { feed, changes })
    }

    pub fn feed(&self) -> &MessageFeed {
        &self.feed
    }

    pub fn messages(&self) -> Vec<Message> {
        self.feed.messages()
    }

    pub fn has_more(&self) -> bool {
        self.feed.has_more()
    }

    pub async fn load_older(&mut self) -> MarketplaceResult<usize> {
        self.feed.load_older().await
    }

    /// Waits for the next change to this conversation, then refreshes the
    /// live window.
    pub async fn next_change(&mut self) -> MarketplaceResult<FeedEvent> {
        loop {
            match self.changes.recv().await {
                Ok(event) => {
                    self.feed.refresh_live_window().await?;
                    return Ok(event);
                }
                Err(EventBusError::Lagged(_)) => self.feed.reset().await?,
                Err(e) => return Err(subscription_closed(e)),
            }
        }
    }

    /// Applies changes already published without waiting. Returns how many
    /// were seen.
    pub async fn sync(&mut self) -> MarketplaceResult<usize> {
        let mut seen = 0;
        let mut lagged = false;
        loop {
            match self.changes.try_recv() {
                Ok(_) => seen += 1,
                Err(EventBusError::Empty) => break,
                Err(EventBusError::Lagged(n)) => {
                    seen += n as usize;
                    lagged = true;
                }
                Err(e) => return Err(subscription_closed(e)),
            }
        }

        if lagged {
            self.feed.reset().await?;
        } else if seen > 0 {
            self.feed.refresh_live_window().await?;
        }
        Ok(seen)
    }
}

fn subscription_closed(e: EventBusError) -> MarketplaceError {
    MarketplaceError::Store(RepositoryError::Unavailable(format!("feed subscription ended: {}", e)))
}
