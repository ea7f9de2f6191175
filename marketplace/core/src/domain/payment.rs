// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Staged Payment Protocol
//!
//! The payment flow of a hired engagement is never stored as a state field.
//! It is derived from the conversation feed: each protocol step appends a
//! milestone message, and [`derive_stage`] scans the history for the latest
//! occurrence of each milestone kind.
//!
//! ```text
//! propose ─► await-response ─► partial-pay ─► partial-receipt ─► delivery ─► full-pay ─► end
//!  (employer)   (applicant)      (employer)      (applicant)      (applicant)  (employer)  (applicant)
//! ```
//!
//! Predicates are tested in reverse dependency order, so a history with gaps
//! (e.g. a `pay-full` without a recorded delivery) still yields the most
//! advanced stage it proves. Appending a message can therefore never move the
//! derived stage backwards.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::identity::Participant;
use crate::domain::message::{Message, MessageKind, ProposalStatus};

/// An exact amount in a named currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    pub amount: Decimal,
    pub currency: String,
}

impl Money {
    pub fn new(amount: Decimal, currency: impl Into<String>) -> Self {
        Self {
            amount,
            currency: currency.into(),
        }
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.currency, self.amount.round_dp(2))
    }
}

/// Rounds to cents, halves away from zero.
pub fn round_cents(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Split of an agreed price into the upfront and final instalments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaymentTerms {
    partial_rate: Decimal,
}

impl PaymentTerms {
    /// `partial_rate` must lie strictly between 0 and 1.
    pub fn new(partial_rate: Decimal) -> Self {
        Self { partial_rate }
    }

    pub fn partial_rate(&self) -> Decimal {
        self.partial_rate
    }

    /// Upfront instalment: `round(agreed × rate, 2)`.
    pub fn partial_amount(&self, agreed: Decimal) -> Decimal {
        round_cents(agreed * self.partial_rate)
    }

    /// Final instalment: `round(agreed × (1 − rate), 2)`, computed on its own
    /// rather than as `agreed − partial`.
    pub fn full_amount(&self, agreed: Decimal) -> Decimal {
        round_cents(agreed * (Decimal::ONE - self.partial_rate))
    }
}

impl Default for PaymentTerms {
    fn default() -> Self {
        Self::new(Decimal::new(25, 2))
    }
}

/// Position of a hired engagement in the payment flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Stage {
    /// No live proposal; the employer may propose a price.
    Propose,
    /// A proposal awaits the applicant's answer.
    AwaitResponse,
    /// A proposal was accepted; the employer owes the upfront instalment.
    PartialPay,
    /// Upfront instalment sent; the applicant confirms receipt.
    PartialReceipt,
    /// Receipt confirmed; the applicant delivers the work.
    Delivery,
    /// Work delivered; the employer owes the final instalment.
    FullPay,
    /// Final instalment sent; the applicant may end the project.
    End,
    /// Project completed and the feed cleared. Never produced by
    /// [`derive_stage`]; reported by the service once the application is
    /// `Completed`.
    Ended,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Propose => "propose",
            Stage::AwaitResponse => "await-response",
            Stage::PartialPay => "partial-pay",
            Stage::PartialReceipt => "partial-receipt",
            Stage::Delivery => "delivery",
            Stage::FullPay => "full-pay",
            Stage::End => "end",
            Stage::Ended => "ended",
        }
    }

    /// Side of the engagement allowed to act at this stage.
    pub fn actor(&self) -> Option<Participant> {
        match self {
            Stage::Propose | Stage::PartialPay | Stage::FullPay => Some(Participant::Employer),
            Stage::AwaitResponse | Stage::PartialReceipt | Stage::Delivery | Stage::End => {
                Some(Participant::Applicant)
            }
            Stage::Ended => None,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Latest occurrence of every milestone kind in a message history.
#[derive(Debug, Clone, Default)]
pub struct Milestones<'a> {
    /// Most recent proposal still awaiting an answer.
    pub pending_proposal: Option<&'a Message>,
    /// Earliest accepted proposal; later acceptances never override it.
    pub accepted_proposal: Option<&'a Message>,
    pub partial_pay: Option<&'a Message>,
    pub partial_received: Option<&'a Message>,
    pub delivered: Option<&'a Message>,
    pub full_pay: Option<&'a Message>,
}

impl<'a> Milestones<'a> {
    /// Single pass over the history, which must be in chronological order.
    pub fn scan(messages: &'a [Message]) -> Self {
        let mut found = Milestones::default();
        for message in messages {
            match &message.kind {
                MessageKind::PayProposal { status, .. } => match status {
                    ProposalStatus::Pending => found.pending_proposal = Some(message),
                    ProposalStatus::Accepted => {
                        found.accepted_proposal.get_or_insert(message);
                    }
                    ProposalStatus::Rejected => {}
                },
                MessageKind::PayPartial { .. } => found.partial_pay = Some(message),
                MessageKind::PayPartialReceived { .. } => found.partial_received = Some(message),
                MessageKind::ProjectDelivered => found.delivered = Some(message),
                MessageKind::PayFull { .. } => found.full_pay = Some(message),
                MessageKind::Chat { .. } => {}
            }
        }
        found
    }

    pub fn stage(&self) -> Stage {
        if self.full_pay.is_some() {
            Stage::End
        } else if self.delivered.is_some() {
            Stage::FullPay
        } else if self.partial_received.is_some() {
            Stage::Delivery
        } else if self.partial_pay.is_some() {
            Stage::PartialReceipt
        } else if self.accepted_proposal.is_some() {
            Stage::PartialPay
        } else if self.pending_proposal.is_some() {
            Stage::AwaitResponse
        } else {
            Stage::Propose
        }
    }

    /// Price agreed through the accepted proposal, if any.
    pub fn agreed(&self) -> Option<Money> {
        self.accepted_proposal.and_then(Message::money)
    }
}

/// Current stage of the payment flow for a chronological message history.
///
/// Total: every history, including an empty one or one with gaps, maps to a
/// stage.
pub fn derive_stage(messages: &[Message]) -> Stage {
    Milestones::scan(messages).stage()
}
