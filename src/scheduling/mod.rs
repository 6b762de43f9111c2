//! Session scheduling: curriculum expansion, calendar booking, event-driven
//! lifecycle management, and completion capture.

pub mod bot;
pub mod calendar;
pub mod completion;
pub mod curriculum;
pub mod error;
pub mod generator;
pub mod handlers;
pub mod orchestrator;
pub mod session;

pub use bot::{HttpRecordingBotClient, MockRecordingBotClient, RecordingBotClient};
pub use calendar::{
    CalendarClient, CalendarEventChanges, CalendarEventHandle, CalendarEventRequest,
    HttpCalendarClient, MockCalendarClient,
};
pub use completion::{
    CompletionRecorder, CompletionReport, InMemoryIntelligenceStore, IntelligenceSink,
    IntelligenceStore, SessionIntelligence, TracingIntelligenceSink,
};
pub use curriculum::{Curriculum, CurriculumEntry, TimeOfDay};
pub use error::SchedulingError;
pub use generator::{ScheduleFailure, ScheduleGenerator, ScheduleReport};
pub use handlers::register_default_handlers;
pub use orchestrator::{DispatchResult, EventHandler, EventOrchestrator, SchedulingContext};
pub use session::{
    InMemorySessionStore, ScheduledSession, SessionStatus, SessionStore, SessionType,
};
