//! Revenue split, TDS withholding, and payout staggering.

pub mod audit;
pub mod calculator;
pub mod config;
pub mod error;
pub mod ledger;
pub mod payout;

pub use audit::{AuditSink, NoOpAuditSink, RevenueAuditEvent, TracingAuditSink};
pub use calculator::{RevenueBreakdown, RevenueCalculator};
pub use config::{InMemorySplitConfigStore, SplitConfig, SplitConfigStore};
pub use error::RevenueError;
pub use ledger::{
    CoachPayout, EnrollmentRevenue, InMemoryRevenueLedger, PayoutStatus, PayoutType,
    RevenueLedger,
};
