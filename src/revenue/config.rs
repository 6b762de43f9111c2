//! Versioned revenue split configuration.

use super::error::RevenueError;
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

/// One version of the revenue split rules. Configs are append-only; the
/// config in force for an enrollment is the one with the latest
/// `effective_from` on or before the enrollment date.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplitConfig {
    pub id: String,
    /// Lead bonus, integer percent of the enrollment amount. Paid only when
    /// the lead came from a coach.
    pub lead_pct: i64,
    /// Coaching-coach share, integer percent of the enrollment amount.
    pub coach_pct: i64,
    /// Tax-deducted-at-source rate, integer percent of the gross payout.
    pub tds_rate_pct: i64,
    /// Annual per-coach earnings threshold above which TDS withholding starts.
    pub tds_annual_threshold: i64,
    /// Day of month payouts land on, clamped to the end of short months.
    pub payout_day_of_month: u32,
    pub effective_from: NaiveDate,
    pub created_at: DateTime<Utc>,
}

impl SplitConfig {
    /// Sanity-check percentages and payout day. A config that fails here is
    /// rejected at insert time.
    pub fn validate(&self) -> std::result::Result<(), RevenueError> {
        if !(0..=100).contains(&self.lead_pct) {
            return Err(RevenueError::InvalidConfig(format!(
                "lead_pct out of range: {}",
                self.lead_pct
            )));
        }
        if !(0..=100).contains(&self.coach_pct) {
            return Err(RevenueError::InvalidConfig(format!(
                "coach_pct out of range: {}",
                self.coach_pct
            )));
        }
        if self.lead_pct + self.coach_pct > 100 {
            return Err(RevenueError::InvalidConfig(format!(
                "lead_pct + coach_pct exceeds 100: {} + {}",
                self.lead_pct, self.coach_pct
            )));
        }
        if !(0..=100).contains(&self.tds_rate_pct) {
            return Err(RevenueError::InvalidConfig(format!(
                "tds_rate_pct out of range: {}",
                self.tds_rate_pct
            )));
        }
        if self.tds_annual_threshold < 0 {
            return Err(RevenueError::InvalidConfig(
                "tds_annual_threshold is negative".to_string(),
            ));
        }
        if !(1..=31).contains(&self.payout_day_of_month) {
            return Err(RevenueError::InvalidConfig(format!(
                "payout_day_of_month out of range: {}",
                self.payout_day_of_month
            )));
        }
        Ok(())
    }
}

/// Lookup of the split config in force for a given date.
#[async_trait]
pub trait SplitConfigStore: Send + Sync {
    /// Insert a new config version. Validates before storing.
    async fn insert(&self, config: &SplitConfig) -> Result<()>;

    /// The config with the latest `effective_from <= as_of`; ties broken by
    /// `created_at`, newest wins.
    async fn active_config(&self, as_of: NaiveDate) -> Result<Option<SplitConfig>>;
}

/// In-memory [`SplitConfigStore`]. Cheap to clone.
#[derive(Default, Clone)]
pub struct InMemorySplitConfigStore {
    configs: Arc<Mutex<Vec<SplitConfig>>>,
}

impl InMemorySplitConfigStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SplitConfigStore for InMemorySplitConfigStore {
    async fn insert(&self, config: &SplitConfig) -> Result<()> {
        config.validate()?;
        self.configs.lock().unwrap().push(config.clone());
        Ok(())
    }

    async fn active_config(&self, as_of: NaiveDate) -> Result<Option<SplitConfig>> {
        let configs = self.configs.lock().unwrap();
        Ok(configs
            .iter()
            .filter(|c| c.effective_from <= as_of)
            .max_by(|a, b| {
                a.effective_from
                    .cmp(&b.effective_from)
                    .then(a.created_at.cmp(&b.created_at))
            })
            .cloned())
    }
}
