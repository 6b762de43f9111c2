//! Application context wiring.
//!
//! [`AppContext`] holds the shared state behind the HTTP surface: storage
//! trait objects, external collaborators, and the engine services built on
//! top of them. Construction goes through [`AppContextBuilder`], which
//! defaults every store to its in-memory implementation and requires the
//! two external collaborators (calendar, recording bot) to be supplied
//! explicitly.

use crate::cache::{Cache, InMemoryCache};
use crate::config::Config;
use crate::enrollment::{
    CoachStore, EnrollmentOnboarding, EnrollmentStore, InMemoryCoachStore,
    InMemoryEnrollmentStore,
};
use crate::error::{CoachwayError, Result};
use crate::notify::{ConsoleNotifier, Notifier};
use crate::revenue::{
    AuditSink, InMemoryRevenueLedger, InMemorySplitConfigStore, RevenueCalculator,
    RevenueLedger, SplitConfigStore, TracingAuditSink,
};
use crate::scheduling::bot::RecordingBotClient;
use crate::scheduling::calendar::CalendarClient;
use crate::scheduling::completion::{
    CompletionRecorder, InMemoryIntelligenceStore, IntelligenceSink, IntelligenceStore,
    TracingIntelligenceSink,
};
use crate::scheduling::generator::ScheduleGenerator;
use crate::scheduling::handlers::register_default_handlers;
use crate::scheduling::orchestrator::{EventOrchestrator, SchedulingContext};
use crate::scheduling::session::{InMemorySessionStore, SessionStore};
use std::sync::Arc;

/// Shared application state.
#[derive(Clone)]
pub struct AppContext {
    pub config: Config,
    pub enrollments: Arc<dyn EnrollmentStore>,
    pub coaches: Arc<dyn CoachStore>,
    pub sessions: Arc<dyn SessionStore>,
    pub split_configs: Arc<dyn SplitConfigStore>,
    pub ledger: Arc<dyn RevenueLedger>,
    pub orchestrator: Arc<EventOrchestrator>,
    pub calculator: Arc<RevenueCalculator>,
    pub onboarding: Arc<EnrollmentOnboarding>,
    pub completion: Arc<CompletionRecorder>,
}

impl AppContext {
    pub fn builder(config: Config) -> AppContextBuilder {
        AppContextBuilder::new(config)
    }
}

/// Builder for [`AppContext`].
pub struct AppContextBuilder {
    config: Config,
    enrollments: Option<Arc<dyn EnrollmentStore>>,
    coaches: Option<Arc<dyn CoachStore>>,
    sessions: Option<Arc<dyn SessionStore>>,
    split_configs: Option<Arc<dyn SplitConfigStore>>,
    ledger: Option<Arc<dyn RevenueLedger>>,
    intelligence: Option<Arc<dyn IntelligenceStore>>,
    intelligence_sink: Option<Arc<dyn IntelligenceSink>>,
    audit: Option<Arc<dyn AuditSink>>,
    cache: Option<Arc<dyn Cache>>,
    notifier: Option<Arc<dyn Notifier>>,
    calendar: Option<Arc<dyn CalendarClient>>,
    bot: Option<Arc<dyn RecordingBotClient>>,
}

impl AppContextBuilder {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            enrollments: None,
            coaches: None,
            sessions: None,
            split_configs: None,
            ledger: None,
            intelligence: None,
            intelligence_sink: None,
            audit: None,
            cache: None,
            notifier: None,
            calendar: None,
            bot: None,
        }
    }

    pub fn with_enrollments(mut self, store: Arc<dyn EnrollmentStore>) -> Self {
        self.enrollments = Some(store);
        self
    }

    pub fn with_coaches(mut self, store: Arc<dyn CoachStore>) -> Self {
        self.coaches = Some(store);
        self
    }

    pub fn with_sessions(mut self, store: Arc<dyn SessionStore>) -> Self {
        self.sessions = Some(store);
        self
    }

    pub fn with_split_configs(mut self, store: Arc<dyn SplitConfigStore>) -> Self {
        self.split_configs = Some(store);
        self
    }

    pub fn with_ledger(mut self, ledger: Arc<dyn RevenueLedger>) -> Self {
        self.ledger = Some(ledger);
        self
    }

    pub fn with_intelligence(mut self, store: Arc<dyn IntelligenceStore>) -> Self {
        self.intelligence = Some(store);
        self
    }

    pub fn with_intelligence_sink(mut self, sink: Arc<dyn IntelligenceSink>) -> Self {
        self.intelligence_sink = Some(sink);
        self
    }

    pub fn with_audit(mut self, sink: Arc<dyn AuditSink>) -> Self {
        self.audit = Some(sink);
        self
    }

    pub fn with_cache(mut self, cache: Arc<dyn Cache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn with_calendar(mut self, calendar: Arc<dyn CalendarClient>) -> Self {
        self.calendar = Some(calendar);
        self
    }

    pub fn with_bot(mut self, bot: Arc<dyn RecordingBotClient>) -> Self {
        self.bot = Some(bot);
        self
    }

    /// Assemble the context and wire the engine services.
    ///
    /// # Errors
    /// Fails when the calendar or recording-bot collaborator is missing;
    /// there are no sensible defaults for either.
    pub fn build(self) -> Result<AppContext> {
        let calendar = self
            .calendar
            .ok_or_else(|| CoachwayError::internal("Calendar client not configured"))?;
        let bot = self
            .bot
            .ok_or_else(|| CoachwayError::internal("Recording bot client not configured"))?;

        let enrollments = self
            .enrollments
            .unwrap_or_else(|| Arc::new(InMemoryEnrollmentStore::new()));
        let coaches = self
            .coaches
            .unwrap_or_else(|| Arc::new(InMemoryCoachStore::new()));
        let sessions = self
            .sessions
            .unwrap_or_else(|| Arc::new(InMemorySessionStore::new()));
        let split_configs = self
            .split_configs
            .unwrap_or_else(|| Arc::new(InMemorySplitConfigStore::new()));
        let ledger = self
            .ledger
            .unwrap_or_else(|| Arc::new(InMemoryRevenueLedger::new()));
        let intelligence = self
            .intelligence
            .unwrap_or_else(|| Arc::new(InMemoryIntelligenceStore::new()));
        let intelligence_sink = self
            .intelligence_sink
            .unwrap_or_else(|| Arc::new(TracingIntelligenceSink));
        let audit = self.audit.unwrap_or_else(|| Arc::new(TracingAuditSink));
        let cache = self.cache.unwrap_or_else(|| {
            Arc::new(InMemoryCache::new(self.config.orchestrator.max_cache_entries))
        });
        let notifier = self.notifier.unwrap_or_else(|| Arc::new(ConsoleNotifier));

        let generator = ScheduleGenerator::new(
            sessions.clone(),
            calendar.clone(),
            bot.clone(),
            self.config.scheduling.clone(),
        );
        let calculator = Arc::new(RevenueCalculator::new(
            enrollments.clone(),
            coaches.clone(),
            split_configs.clone(),
            ledger.clone(),
            audit,
        ));
        let onboarding = Arc::new(EnrollmentOnboarding::new(
            enrollments.clone(),
            coaches.clone(),
            Arc::new(ScheduleGenerator::new(
                sessions.clone(),
                calendar.clone(),
                bot.clone(),
                self.config.scheduling.clone(),
            )),
            calculator.clone(),
            notifier.clone(),
        ));
        let completion = Arc::new(CompletionRecorder::new(
            sessions.clone(),
            intelligence,
            intelligence_sink,
        ));

        let scheduling_context = Arc::new(SchedulingContext {
            enrollments: enrollments.clone(),
            coaches: coaches.clone(),
            sessions: sessions.clone(),
            calendar,
            bot,
            notifier,
            generator,
        });
        let mut orchestrator = EventOrchestrator::new(
            scheduling_context,
            cache,
            self.config.orchestrator.clone(),
        );
        register_default_handlers(&mut orchestrator);

        Ok(AppContext {
            config: self.config,
            enrollments,
            coaches,
            sessions,
            split_configs,
            ledger,
            orchestrator: Arc::new(orchestrator),
            calculator,
            onboarding,
            completion,
        })
    }
}
