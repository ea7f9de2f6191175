// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Multi-Document Effect Log
//!
//! Hire confirmation and project completion touch several documents without a
//! transaction. Each step is recorded here as it runs, so the caller (or a
//! later reconciliation pass) can tell exactly which writes landed when the
//! workflow stopped halfway.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "reason", rename_all = "snake_case")]
pub enum StepOutcome {
    Succeeded,
    Failed(String),
    Skipped(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectStep {
    pub name: String,
    #[serde(flatten)]
    pub outcome: StepOutcome,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectLog {
    steps: Vec<EffectStep>,
}

impl EffectLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, name: impl Into<String>, outcome: StepOutcome) {
        self.steps.push(EffectStep {
            name: name.into(),
            outcome,
        });
    }

    pub fn succeeded(&mut self, name: impl Into<String>) {
        self.push(name, StepOutcome::Succeeded);
    }

    pub fn failed(&mut self, name: impl Into<String>, reason: impl ToString) {
        self.push(name, StepOutcome::Failed(reason.to_string()));
    }

    pub fn skipped(&mut self, name: impl Into<String>, reason: impl Into<String>) {
        self.push(name, StepOutcome::Skipped(reason.into()));
    }

    pub fn steps(&self) -> &[EffectStep] {
        &self.steps
    }

    pub fn failures(&self) -> impl Iterator<Item = &EffectStep> {
        self.steps
            .iter()
            .filter(|step| matches!(step.outcome, StepOutcome::Failed(_)))
    }

    /// True when no recorded step failed.
    pub fn is_complete(&self) -> bool {
        self.failures().next().is_none()
    }
}
