//! Coachway - enrollment revenue and session scheduling engine
//!
//! Coachway is the backend core for a reading-coaching program: when a
//! parent pays for an enrollment, it assigns a coach, books the full
//! session schedule against an external calendar, allocates the revenue
//! between coach, lead source, and platform, and then drives the session
//! lifecycle through an idempotent event dispatch surface.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use coachway::{AppContext, ConfigBuilder};
//! use coachway::scheduling::calendar::HttpCalendarClient;
//! use coachway::scheduling::bot::HttpRecordingBotClient;
//!
//! #[tokio::main]
//! async fn main() {
//!     coachway::init_tracing();
//!
//!     let config = ConfigBuilder::new().from_env().build();
//!     let addr = config.server.addr().unwrap();
//!
//!     let context = AppContext::builder(config)
//!         .with_calendar(Arc::new(HttpCalendarClient::new(
//!             "https://calendar-bridge.internal",
//!             "token",
//!         )))
//!         .with_bot(Arc::new(HttpRecordingBotClient::new(
//!             "https://bot-bridge.internal",
//!             "token",
//!         )))
//!         .build()
//!         .unwrap();
//!
//!     let app = coachway::http::router(context);
//!     let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
//!     axum::serve(listener, app).await.unwrap();
//! }
//! ```

#![allow(async_fn_in_trait)] // async_trait macro handles Send/Sync bounds properly

mod app;
pub mod cache;
mod config;
pub mod enrollment;
mod error;
pub mod http;
pub mod notify;
pub mod revenue;
pub mod scheduling;
pub mod testing;

// Re-exports for public API
pub use app::{AppContext, AppContextBuilder};
pub use cache::{Cache, CacheExt, InMemoryCache};
pub use config::{
    Config, ConfigBuilder, InternalAuthConfig, LoggingConfig, OrchestratorConfig,
    SchedulingConfig, ServerConfig,
};
pub use enrollment::{
    Coach, CoachAssignment, CoachStore, Enrollment, EnrollmentOnboarding, EnrollmentStatus,
    EnrollmentStore, LeadSource, OnboardingOutcome,
};
pub use error::{CoachwayError, ErrorResponse, Result};
pub use http::{ApiResponse, JsonResponse};
pub use revenue::{
    CoachPayout, EnrollmentRevenue, PayoutStatus, PayoutType, RevenueBreakdown,
    RevenueCalculator, RevenueLedger, SplitConfig, SplitConfigStore,
};
pub use scheduling::{
    Curriculum, DispatchResult, EventOrchestrator, ScheduleGenerator, ScheduleReport,
    ScheduledSession, SchedulingContext, SessionStatus, SessionStore, SessionType,
};

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing/logging with sensible defaults
///
/// This should be called early in your application, typically in main()
/// before building the AppContext.
///
/// # Environment Variables
///
/// - `RUST_LOG`: Set log level (e.g., "info", "debug", "coachway=debug")
/// - `COACHWAY_LOG_JSON`: Set to "true" for JSON formatted logs
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let json_logs = std::env::var("COACHWAY_LOG_JSON")
        .map(|v| v.parse::<bool>().unwrap_or(false))
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

/// Initialize tracing with a custom configuration
pub fn init_tracing_with_config(config: &Config) {
    let env_filter = EnvFilter::new(&config.logging.level);

    if config.logging.json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}
