// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Domain layer: aggregates, value objects, the payment stage machine and
//! the persistence contracts they are stored through.

pub mod identity;
pub mod profile;
pub mod payment;
pub mod message;
pub mod job;
pub mod application;
pub mod events;
pub mod effects;
pub mod repository;
pub mod config;
pub mod error;
