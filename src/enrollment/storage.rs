//! Enrollment and coach records plus the storage traits behind them.
//!
//! Implement [`EnrollmentStore`] and [`CoachStore`] to persist to your
//! database. In-memory implementations live in [`crate::enrollment::memory`].

use crate::error::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Attribution of who generated an enrollment. Drives the revenue split:
/// only `coach`-sourced enrollments pay the lead share out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeadSource {
    /// Platform-generated lead.
    Yestoryd,
    /// A coach brought the enrollment in themselves.
    Coach,
    /// Referred by another parent through a referral code.
    Referral,
    /// Parent signed up directly.
    Parent,
}

impl LeadSource {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Yestoryd => "yestoryd",
            Self::Coach => "coach",
            Self::Referral => "referral",
            Self::Parent => "parent",
        }
    }

    /// Parse from the wire form. Unknown values fall back to `yestoryd`
    /// (platform-attributed, no lead payout).
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s {
            "coach" => Self::Coach,
            "referral" => Self::Referral,
            "parent" => Self::Parent,
            _ => Self::Yestoryd,
        }
    }
}

impl std::fmt::Display for LeadSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Lifecycle of an enrollment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnrollmentStatus {
    PendingStart,
    Active,
    Completed,
    Cancelled,
}

impl EnrollmentStatus {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PendingStart => "pending_start",
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for EnrollmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One program purchase by a parent for a child.
///
/// `total_amount` is in whole currency units and is immutable once revenue
/// has been calculated for the enrollment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Enrollment {
    pub id: String,
    pub child_id: String,
    pub child_name: String,
    pub parent_email: String,
    pub total_amount: i64,
    pub lead_source: LeadSource,
    /// The referring coach, when `lead_source` is `coach`.
    pub lead_source_coach_id: Option<String>,
    /// Assigned coaching coach. `None` until assignment runs.
    pub coaching_coach_id: Option<String>,
    pub program_start: NaiveDate,
    pub program_end: NaiveDate,
    pub status: EnrollmentStatus,
}

/// A coach, including the running counters the engine maintains.
///
/// `current_students` feeds assignment; `fiscal_year_earnings` feeds the TDS
/// threshold check. Both are mutated exactly once per enrollment under the
/// revenue calculation's idempotency guard.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Coach {
    pub id: String,
    pub name: String,
    pub email: String,
    pub is_active: bool,
    pub max_capacity: u32,
    pub current_students: u32,
    /// Cumulative earnings this fiscal year, in whole currency units.
    pub fiscal_year_earnings: i64,
}

impl Coach {
    /// Whether the coach can take another student.
    #[must_use]
    pub fn has_capacity(&self) -> bool {
        self.current_students < self.max_capacity
    }
}

/// Storage for enrollments.
#[async_trait]
pub trait EnrollmentStore: Send + Sync {
    async fn get(&self, enrollment_id: &str) -> Result<Option<Enrollment>>;

    async fn insert(&self, enrollment: &Enrollment) -> Result<()>;

    async fn set_status(&self, enrollment_id: &str, status: EnrollmentStatus) -> Result<()>;

    /// Record the assigned coaching coach.
    async fn set_coaching_coach(&self, enrollment_id: &str, coach_id: &str) -> Result<()>;
}

/// Storage for coaches and their running counters.
#[async_trait]
pub trait CoachStore: Send + Sync {
    async fn get(&self, coach_id: &str) -> Result<Option<Coach>>;

    /// All active coaches, in no particular order.
    async fn list_active(&self) -> Result<Vec<Coach>>;

    async fn insert(&self, coach: &Coach) -> Result<()>;

    async fn set_active(&self, coach_id: &str, is_active: bool) -> Result<()>;

    /// Adjust `current_students` by `delta` (may be negative), clamped at 0.
    async fn adjust_student_count(&self, coach_id: &str, delta: i32) -> Result<()>;

    /// Add to the coach's fiscal-year cumulative earnings.
    ///
    /// Not idempotent; callers must hold an exactly-once guard (the revenue
    /// ledger's unique insert).
    async fn add_fiscal_earnings(&self, coach_id: &str, amount: i64) -> Result<()>;
}
