// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Conversation Messages
//!
//! Every hired engagement carries a chat feed stored as a child collection of
//! its application (`applications/{id}/messages`). Besides plain chat, the
//! feed holds typed milestone messages; the payment protocol reads them back
//! to derive where the engagement stands (see [`crate::domain::payment`]).
//!
//! | `type` | Sent by | Payload |
//! |--------|---------|---------|
//! | `chat` | either | `text` |
//! | `pay-proposal` | employer | `amount`, `currency`, `status`, `respondedBy?`, `respondedAt?` |
//! | `pay-partial` | employer | `amount`, `currency` |
//! | `pay-partial-received` | applicant | `amount`, `currency` of the partial pay acknowledged |
//! | `project-delivered` | applicant | none |
//! | `pay-full` | employer | `amount`, `currency` |

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::domain::application::ApplicationId;
use crate::domain::identity::{CurrentUser, UserId};
use crate::domain::payment::Money;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub Uuid);

impl MessageId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Response state of a pay proposal. `Accepted` and `Rejected` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProposalStatus {
    Pending,
    Accepted,
    Rejected,
}

/// Tagged payload of a message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum MessageKind {
    Chat {
        text: String,
    },
    PayProposal {
        amount: Decimal,
        currency: String,
        status: ProposalStatus,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        responded_by: Option<UserId>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        responded_at: Option<DateTime<Utc>>,
    },
    PayPartial {
        amount: Decimal,
        currency: String,
    },
    PayPartialReceived {
        amount: Decimal,
        currency: String,
    },
    ProjectDelivered,
    PayFull {
        amount: Decimal,
        currency: String,
    },
}

impl MessageKind {
    pub fn proposal(money: &Money) -> Self {
        MessageKind::PayProposal {
            amount: money.amount,
            currency: money.currency.clone(),
            status: ProposalStatus::Pending,
            responded_by: None,
            responded_at: None,
        }
    }

    /// Wire name of the kind, as stored in the `type` field.
    pub fn type_name(&self) -> &'static str {
        match self {
            MessageKind::Chat { .. } => "chat",
            MessageKind::PayProposal { .. } => "pay-proposal",
            MessageKind::PayPartial { .. } => "pay-partial",
            MessageKind::PayPartialReceived { .. } => "pay-partial-received",
            MessageKind::ProjectDelivered => "project-delivered",
            MessageKind::PayFull { .. } => "pay-full",
        }
    }
}

/// A single entry of an application's conversation feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: MessageId,
    pub application_id: ApplicationId,
    pub sender_id: UserId,
    pub sender_name: String,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub kind: MessageKind,
}

impl Message {
    pub fn new(application_id: ApplicationId, sender: &CurrentUser, kind: MessageKind) -> Self {
        Self {
            id: MessageId::new(),
            application_id,
            sender_id: sender.uid.clone(),
            sender_name: sender.sender_name(),
            created_at: Utc::now(),
            kind,
        }
    }

    /// Amount and currency carried by payment-bearing kinds.
    pub fn money(&self) -> Option<Money> {
        match &self.kind {
            MessageKind::PayProposal { amount, currency, .. }
            | MessageKind::PayPartial { amount, currency }
            | MessageKind::PayPartialReceived { amount, currency }
            | MessageKind::PayFull { amount, currency } => Some(Money::new(*amount, currency.clone())),
            MessageKind::Chat { .. } | MessageKind::ProjectDelivered => None,
        }
    }

    pub fn proposal_status(&self) -> Option<ProposalStatus> {
        match &self.kind {
            MessageKind::PayProposal { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Records the applicant's answer on a pending proposal.
    ///
    /// Returns `false` when the message is not a proposal or was already
    /// answered; the message is left untouched in that case.
    pub fn respond(&mut self, responder: &UserId, accepted: bool) -> bool {
        match &mut self.kind {
            MessageKind::PayProposal {
                status,
                responded_by,
                responded_at,
                ..
            } if *status == ProposalStatus::Pending => {
                *status = if accepted {
                    ProposalStatus::Accepted
                } else {
                    ProposalStatus::Rejected
                };
                *responded_by = Some(responder.clone());
                *responded_at = Some(Utc::now());
                true
            }
            _ => false,
        }
    }
}
