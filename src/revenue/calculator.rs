//! Enrollment revenue allocation.
//!
//! Splits the enrollment fee between the coaching coach, the lead-source
//! coach (when a coach sourced the lead), and the platform, withholds TDS
//! when a coach's fiscal-year earnings cross the annual threshold, and lays
//! the coach shares out as a three-month payout stagger.
//!
//! Idempotency lives in the ledger, not here: the calculation commits by a
//! unique insert of the revenue record, and a second call for the same
//! enrollment gets `AlreadyCalculated` without touching counters again.

use super::audit::{AuditSink, RevenueAuditEvent};
use super::config::{SplitConfig, SplitConfigStore};
use super::error::RevenueError;
use super::ledger::{
    CoachPayout, EnrollmentRevenue, PayoutStatus, PayoutType, RevenueLedger,
};
use super::payout::{payout_date, pct_of, stagger_three_months};
use crate::enrollment::{Coach, CoachStore, Enrollment, EnrollmentStore, LeadSource};
use crate::error::Result;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

/// The committed result of one calculation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevenueBreakdown {
    pub revenue: EnrollmentRevenue,
    pub payouts: Vec<CoachPayout>,
}

/// Runs the split for one enrollment.
pub struct RevenueCalculator {
    enrollments: Arc<dyn EnrollmentStore>,
    coaches: Arc<dyn CoachStore>,
    configs: Arc<dyn SplitConfigStore>,
    ledger: Arc<dyn RevenueLedger>,
    audit: Arc<dyn AuditSink>,
}

impl RevenueCalculator {
    #[must_use]
    pub fn new(
        enrollments: Arc<dyn EnrollmentStore>,
        coaches: Arc<dyn CoachStore>,
        configs: Arc<dyn SplitConfigStore>,
        ledger: Arc<dyn RevenueLedger>,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        Self {
            enrollments,
            coaches,
            configs,
            ledger,
            audit,
        }
    }

    /// Allocate revenue for an enrollment and schedule its payouts.
    ///
    /// Exactly-once: the revenue record is committed with a unique insert
    /// before any coach counter moves. If payout rows then fail to persist,
    /// the committed record stands and the caller gets
    /// [`RevenueError::PayoutInsertFailed`] for operator remediation; the
    /// calculation is never rolled back or silently retried.
    pub async fn calculate(&self, enrollment_id: &str) -> Result<RevenueBreakdown> {
        let enrollment = self
            .enrollments
            .get(enrollment_id)
            .await?
            .ok_or_else(|| RevenueError::EnrollmentNotFound(enrollment_id.to_string()))?;

        if enrollment.total_amount <= 0 {
            return Err(RevenueError::InvalidAmount(format!(
                "Enrollment {} has non-positive amount {}",
                enrollment.id, enrollment.total_amount
            ))
            .into());
        }

        let config = self
            .configs
            .active_config(enrollment.program_start)
            .await?
            .ok_or(RevenueError::NoSplitConfig(enrollment.program_start))?;

        let coach_id = enrollment
            .coaching_coach_id
            .clone()
            .ok_or_else(|| RevenueError::CoachNotFound("<unassigned>".to_string()))?;
        let coach = self
            .coaches
            .get(&coach_id)
            .await?
            .ok_or_else(|| RevenueError::CoachNotFound(coach_id.clone()))?;

        let lead_coach = self.lead_coach(&enrollment).await?;

        // Snapshot fiscal earnings before anything increments; TDS decisions
        // are made against pre-calculation state. The lead cost is carved
        // out unconditionally; it just isn't payable (the platform keeps it)
        // when no coach sourced the lead.
        let coach_share = pct_of(enrollment.total_amount, config.coach_pct);
        let lead_share = pct_of(enrollment.total_amount, config.lead_pct);
        let platform_share = enrollment.total_amount - coach_share - lead_share;

        let coach_tds = withholding(&coach, &config, coach_share);
        let (lead_payable, lead_tds) = match &lead_coach {
            Some(lead) => (true, withholding(lead, &config, lead_share)),
            None => (false, 0),
        };

        let revenue = EnrollmentRevenue {
            enrollment_id: enrollment.id.clone(),
            split_config: config.clone(),
            total_amount: enrollment.total_amount,
            coach_share,
            coach_tds,
            coach_net: coach_share - coach_tds,
            lead_share,
            lead_payable,
            lead_tds,
            lead_net: if lead_payable { lead_share - lead_tds } else { 0 },
            platform_share,
            calculated_at: Utc::now(),
        };

        // The idempotency gate. Losing this race means another call already
        // committed; report it as a conflict and change nothing.
        if !self.ledger.try_insert_revenue(&revenue).await? {
            return Err(RevenueError::AlreadyCalculated(enrollment.id.clone()).into());
        }

        self.audit
            .record(RevenueAuditEvent::new(
                &enrollment.id,
                "revenue_committed",
                json!({
                    "split_config_id": config.id,
                    "total_amount": revenue.total_amount,
                    "coach_share": coach_share,
                    "lead_share": lead_share,
                    "lead_payable": lead_payable,
                    "platform_share": platform_share,
                }),
            ))
            .await;

        let mut payouts = Vec::new();
        payouts.extend(self.build_payouts(
            &enrollment,
            &coach,
            &config,
            PayoutType::CoachCost,
            coach_share,
        ).await);
        if let (Some(lead), true) = (&lead_coach, lead_payable && lead_share > 0) {
            payouts.extend(self.build_payouts(
                &enrollment,
                lead,
                &config,
                PayoutType::LeadBonus,
                lead_share,
            ).await);
        }

        // Earnings counters move exactly once, only after the unique insert
        // succeeded.
        self.coaches
            .add_fiscal_earnings(&coach.id, coach_share)
            .await?;
        if let Some(lead) = &lead_coach {
            if lead_share > 0 {
                self.coaches.add_fiscal_earnings(&lead.id, lead_share).await?;
            }
        }

        if let Err(e) = self.ledger.insert_payouts(&payouts).await {
            tracing::error!(
                enrollment_id = %enrollment.id,
                error = %e,
                "Revenue committed but payout schedule failed to persist; \
                 needs operator remediation"
            );
            return Err(
                RevenueError::PayoutInsertFailed(enrollment.id.clone(), e.to_string()).into(),
            );
        }

        self.audit
            .record(RevenueAuditEvent::new(
                &enrollment.id,
                "payouts_scheduled",
                json!({ "count": payouts.len() }),
            ))
            .await;

        tracing::info!(
            enrollment_id = %enrollment.id,
            coach_id = %coach.id,
            coach_share,
            lead_share,
            platform_share,
            payouts = payouts.len(),
            "Revenue calculated"
        );

        Ok(RevenueBreakdown { revenue, payouts })
    }

    /// The lead-source coach, when the lead came from a coach. A coach lead
    /// whose coach record is missing is an error; any other lead source
    /// yields no lead payout.
    async fn lead_coach(&self, enrollment: &Enrollment) -> Result<Option<Coach>> {
        if enrollment.lead_source != LeadSource::Coach {
            return Ok(None);
        }
        let Some(lead_id) = &enrollment.lead_source_coach_id else {
            return Ok(None);
        };
        let coach = self
            .coaches
            .get(lead_id)
            .await?
            .ok_or_else(|| RevenueError::CoachNotFound(lead_id.clone()))?;
        Ok(Some(coach))
    }

    /// Lay a gross share out as three monthly installments, withholding TDS
    /// when this share pushes the coach's fiscal-year earnings strictly past
    /// the annual threshold. Reaching the threshold exactly does not trigger
    /// withholding.
    async fn build_payouts(
        &self,
        enrollment: &Enrollment,
        coach: &Coach,
        config: &SplitConfig,
        payout_type: PayoutType,
        gross_total: i64,
    ) -> Vec<CoachPayout> {
        let withhold = coach.fiscal_year_earnings + gross_total > config.tds_annual_threshold;
        let tds_total = withholding(coach, config, gross_total);

        self.audit
            .record(RevenueAuditEvent::new(
                &enrollment.id,
                if withhold { "tds_withheld" } else { "tds_not_applicable" },
                json!({
                    "coach_id": coach.id,
                    "payout_type": payout_type,
                    "fiscal_year_earnings": coach.fiscal_year_earnings,
                    "gross": gross_total,
                    "threshold": config.tds_annual_threshold,
                    "tds": tds_total,
                }),
            ))
            .await;

        let gross_parts = stagger_three_months(gross_total);
        let tds_parts = stagger_three_months(tds_total);

        (0..3)
            .map(|i| {
                let month_number = (i + 1) as u32;
                CoachPayout {
                    id: uuid::Uuid::new_v4().to_string(),
                    enrollment_id: enrollment.id.clone(),
                    coach_id: coach.id.clone(),
                    payout_type,
                    month_number,
                    gross_amount: gross_parts[i],
                    tds_amount: tds_parts[i],
                    net_amount: gross_parts[i] - tds_parts[i],
                    scheduled_date: payout_date(
                        enrollment.program_start,
                        month_number,
                        config.payout_day_of_month,
                    ),
                    status: PayoutStatus::Scheduled,
                }
            })
            .collect()
    }
}

/// TDS withheld on a gross share, given the coach's pre-calculation
/// fiscal-year earnings. Landing exactly on the threshold withholds
/// nothing; strictly past it, the full gross is taxed.
fn withholding(coach: &Coach, config: &SplitConfig, gross: i64) -> i64 {
    if coach.fiscal_year_earnings + gross > config.tds_annual_threshold {
        pct_of(gross, config.tds_rate_pct)
    } else {
        0
    }
}
