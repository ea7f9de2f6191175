// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

use crate::domain::application::{Application, ApplicationId, ApplicationStatus};
use crate::domain::error::MarketplaceResult;
use crate::domain::identity::CurrentUser;
use crate::domain::payment::Money;
use crate::domain::repository::ApplicationRepository;

/// One completed project as it appears in a financial summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialEntry {
    pub application_id: ApplicationId,
    pub job_title: String,
    /// The other side of the engagement
    pub counterparty: String,
    pub amount: Money,
    pub completed_at: Option<DateTime<Utc>>,
}

impl FinancialEntry {
    fn from_application(application: &Application, counterparty: &str) -> Option<Self> {
        let amount = application.payout.clone()?;
        Some(Self {
            application_id: application.id,
            job_title: application.job_title.clone(),
            counterparty: counterparty.to_string(),
            amount,
            completed_at: application.completed_at,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrencyTotals {
    pub currency: String,
    pub gain: Decimal,
    pub spend: Decimal,
    pub net: Decimal,
    /// Earnings as a whole percentage of everything that moved, when
    /// anything moved
    pub gain_share_pct: Option<Decimal>,
}

/// Earnings and spending of one account over its completed projects.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialSummary {
    /// Projects completed as the applicant, newest first
    pub gains: Vec<FinancialEntry>,
    /// Projects completed as the employer, newest first
    pub spend: Vec<FinancialEntry>,
    /// Sorted by currency code
    pub totals: Vec<CurrencyTotals>,
}

impl FinancialSummary {
    pub fn totals_for(&self, currency: &str) -> Option<&CurrencyTotals> {
        self.totals.iter().find(|t| t.currency == currency)
    }
}

pub struct FinancialsService {
    applications: Arc<dyn ApplicationRepository>,
}

impl FinancialsService {
    pub fn new(applications: Arc<dyn ApplicationRepository>) -> Self {
        Self { applications }
    }

    pub async fn financial_summary(&self, caller: &CurrentUser) -> MarketplaceResult<FinancialSummary> {
        let completed = |applications: Vec<Application>| {
            applications
                .into_iter()
                .filter(|a| a.status == ApplicationStatus::Completed)
                .collect::<Vec<_>>()
        };

        let as_applicant = completed(self.applications.find_by_applicant(&caller.uid).await?);
        let as_employer = completed(self.applications.find_by_employer(&caller.uid).await?);

        let gains: Vec<FinancialEntry> = as_applicant
            .iter()
            .filter_map(|a| FinancialEntry::from_application(a, &a.employer_name))
            .collect();
        let spend: Vec<FinancialEntry> = as_employer
            .iter()
            .filter_map(|a| FinancialEntry::from_application(a, &a.applicant_name))
            .collect();

        let skipped = as_applicant.len() + as_employer.len() - gains.len() - spend.len();
        if skipped > 0 {
            debug!(uid = %caller.uid, skipped, "Completed applications without payout left out of summary");
        }

        Ok(summarize(gains, spend))
    }
}

fn summarize(gains: Vec<FinancialEntry>, spend: Vec<FinancialEntry>) -> FinancialSummary {
    let mut by_currency: BTreeMap<String, (Decimal, Decimal)> = BTreeMap::new();
    for entry in &gains {
        by_currency.entry(entry.amount.currency.clone()).or_default().0 += entry.amount.amount;
    }
    for entry in &spend {
        by_currency.entry(entry.amount.currency.clone()).or_default().1 += entry.amount.amount;
    }

    let totals = by_currency
        .into_iter()
        .map(|(currency, (gain, spend))| {
            let combined = gain + spend;
            let gain_share_pct = (combined > Decimal::ZERO).then(|| {
                (gain / combined * Decimal::ONE_HUNDRED)
                    .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            });
            CurrencyTotals {
                currency,
                gain,
                spend,
                net: gain - spend,
                gain_share_pct,
            }
        })
        .collect();

    FinancialSummary { gains, spend, totals }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(amount: i64, currency: &str) -> FinancialEntry {
        FinancialEntry {
            application_id: ApplicationId::new(),
            job_title: "Logo".to_string(),
            counterparty: "Acme".to_string(),
            amount: Money::new(Decimal::new(amount, 0), currency),
            completed_at: None,
        }
    }

    #[test]
    fn test_totals_per_currency() {
        let summary = summarize(
            vec![entry(300, "IDR"), entry(100, "IDR"), entry(50, "USD")],
            vec![entry(200, "IDR")],
        );

        let idr = summary.totals_for("IDR").unwrap();
        assert_eq!(idr.gain, Decimal::new(400, 0));
        assert_eq!(idr.spend, Decimal::new(200, 0));
        assert_eq!(idr.net, Decimal::new(200, 0));
        // 400 / 600 = 66.67% → 67
        assert_eq!(idr.gain_share_pct, Some(Decimal::new(67, 0)));

        let usd = summary.totals_for("USD").unwrap();
        assert_eq!(usd.gain_share_pct, Some(Decimal::ONE_HUNDRED));
        assert_eq!(summary.totals[0].currency, "IDR");
    }

    #[test]
    fn test_empty_summary_has_no_share() {
        let summary = summarize(vec![], vec![]);
        assert!(summary.totals.is_empty());
        assert!(summary.totals_for("IDR").is_none());
    }
}
