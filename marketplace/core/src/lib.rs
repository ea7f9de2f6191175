// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Stutask core
//!
//! Application lifecycle and staged payment protocol of a student/employer
//! gig marketplace.
//!
//! # Architecture
//!
//! - **domain:** aggregates, stage derivation, repository contracts
//! - **application:** use-case services driven by a [`domain::identity::CurrentUser`]
//! - **infrastructure:** event bus and in-memory persistence gateway

pub mod domain;
pub mod application;
pub mod infrastructure;

pub use application::Marketplace;
pub use domain::error::{MarketplaceError, MarketplaceResult};
