//! Revenue and payout persistence.

use super::config::SplitConfig;
use crate::error::{CoachwayError, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

/// What a payout row compensates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayoutType {
    /// The coaching coach's share of the enrollment.
    CoachCost,
    /// Bonus to the coach who sourced the lead.
    LeadBonus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayoutStatus {
    Scheduled,
    Paid,
    Failed,
}

/// The committed allocation of one enrollment's revenue. At most one row
/// exists per enrollment; insertion is the idempotency gate for the whole
/// calculation.
///
/// The lead cost is carved out of every enrollment. It is only payable when
/// a coach sourced the lead; otherwise `lead_payable` is false and the
/// platform retains the carved-out amount (`lead_net` is zero).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrollmentRevenue {
    pub enrollment_id: String,
    /// Snapshot of the split rules the calculation ran under. Later config
    /// versions never change what this record means.
    pub split_config: SplitConfig,
    pub total_amount: i64,
    pub coach_share: i64,
    pub coach_tds: i64,
    pub coach_net: i64,
    pub lead_share: i64,
    pub lead_payable: bool,
    pub lead_tds: i64,
    pub lead_net: i64,
    /// Remainder after coach and lead shares; absorbs rounding.
    pub platform_share: i64,
    pub calculated_at: DateTime<Utc>,
}

/// One scheduled installment owed to a coach.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoachPayout {
    pub id: String,
    pub enrollment_id: String,
    pub coach_id: String,
    pub payout_type: PayoutType,
    /// 1-based installment index within the three-month stagger.
    pub month_number: u32,
    pub gross_amount: i64,
    pub tds_amount: i64,
    pub net_amount: i64,
    pub scheduled_date: NaiveDate,
    pub status: PayoutStatus,
}

/// Persistence for revenue records and payout schedules.
#[async_trait]
pub trait RevenueLedger: Send + Sync {
    /// Insert a revenue record if none exists for the enrollment. Returns
    /// `true` if this call inserted the row, `false` if one was already
    /// there. This unique insert is what makes the calculation exactly-once.
    async fn try_insert_revenue(&self, revenue: &EnrollmentRevenue) -> Result<bool>;

    async fn get_revenue(&self, enrollment_id: &str) -> Result<Option<EnrollmentRevenue>>;

    /// Insert a batch of payout rows. All or nothing.
    async fn insert_payouts(&self, payouts: &[CoachPayout]) -> Result<()>;

    async fn list_payouts(&self, enrollment_id: &str) -> Result<Vec<CoachPayout>>;

    async fn mark_payout(&self, payout_id: &str, status: PayoutStatus) -> Result<()>;
}

#[derive(Default)]
struct LedgerState {
    revenues: Vec<EnrollmentRevenue>,
    payouts: Vec<CoachPayout>,
    fail_payout_inserts: bool,
}

/// In-memory [`RevenueLedger`]. Cheap to clone.
#[derive(Default, Clone)]
pub struct InMemoryRevenueLedger {
    state: Arc<Mutex<LedgerState>>,
}

impl InMemoryRevenueLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent `insert_payouts` calls fail, for exercising the
    /// committed-revenue-without-payouts remediation path.
    pub fn set_fail_payout_inserts(&self, fail: bool) {
        self.state.lock().unwrap().fail_payout_inserts = fail;
    }
}

#[async_trait]
impl RevenueLedger for InMemoryRevenueLedger {
    async fn try_insert_revenue(&self, revenue: &EnrollmentRevenue) -> Result<bool> {
        let mut state = self.state.lock().unwrap();
        if state
            .revenues
            .iter()
            .any(|r| r.enrollment_id == revenue.enrollment_id)
        {
            return Ok(false);
        }
        state.revenues.push(revenue.clone());
        Ok(true)
    }

    async fn get_revenue(&self, enrollment_id: &str) -> Result<Option<EnrollmentRevenue>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .revenues
            .iter()
            .find(|r| r.enrollment_id == enrollment_id)
            .cloned())
    }

    async fn insert_payouts(&self, payouts: &[CoachPayout]) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.fail_payout_inserts {
            return Err(CoachwayError::database("Payout insert failed"));
        }
        state.payouts.extend_from_slice(payouts);
        Ok(())
    }

    async fn list_payouts(&self, enrollment_id: &str) -> Result<Vec<CoachPayout>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .payouts
            .iter()
            .filter(|p| p.enrollment_id == enrollment_id)
            .cloned()
            .collect())
    }

    async fn mark_payout(&self, payout_id: &str, status: PayoutStatus) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        let payout = state
            .payouts
            .iter_mut()
            .find(|p| p.id == payout_id)
            .ok_or_else(|| CoachwayError::not_found(format!("Payout not found: {payout_id}")))?;
        payout.status = status;
        Ok(())
    }
}
