//! Built-in handlers for the session event set.
//!
//! Each handler owns one event's semantics; [`register_default_handlers`]
//! wires them into an orchestrator. Collaborator failures follow the same
//! policy everywhere: calendar and recording-bot problems during teardown
//! are logged and the state change proceeds, because the session row is the
//! source of truth and the external systems reconcile from it.

use super::calendar::CalendarEventChanges;
use super::curriculum::Curriculum;
use super::error::SchedulingError;
use super::orchestrator::{EventOrchestrator, SchedulingContext};
use super::session::{ScheduledSession, SessionStatus};
use crate::enrollment::Enrollment;
use crate::error::Result;
use crate::notify::{send_best_effort, Channel, Notification, NotificationTemplate};
use chrono::{NaiveDate, NaiveTime, Utc};
use serde_json::{json, Value};
use std::sync::Arc;

/// Register the full built-in event set on an orchestrator.
pub fn register_default_handlers(orchestrator: &mut EventOrchestrator) {
    orchestrator.register("session.cancel", |payload, ctx| {
        Box::pin(cancel_session(payload, ctx))
    });
    orchestrator.register("session.reschedule", |payload, ctx| {
        Box::pin(reschedule_session(payload, ctx))
    });
    orchestrator.register("session.no_show", |payload, ctx| {
        Box::pin(record_no_show(payload, ctx))
    });
    orchestrator.register("coach.unavailable", |payload, ctx| {
        Box::pin(coach_unavailable(payload, ctx))
    });
    orchestrator.register("coach.return", |payload, ctx| {
        Box::pin(coach_return(payload, ctx))
    });
    orchestrator.register("coach.exit", |payload, ctx| {
        Box::pin(coach_exit(payload, ctx))
    });
    orchestrator.register("enrollment.schedule_sessions", |payload, ctx| {
        Box::pin(schedule_enrollment_sessions(payload, ctx))
    });
}

fn str_field(payload: &Value, field: &str) -> Result<String> {
    match payload.get(field).and_then(Value::as_str) {
        Some(s) if !s.is_empty() => Ok(s.to_string()),
        _ => Err(SchedulingError::MissingField {
            field: field.to_string(),
        }
        .into()),
    }
}

async fn load_session(ctx: &SchedulingContext, session_id: &str) -> Result<ScheduledSession> {
    ctx.sessions.get(session_id).await?.ok_or_else(|| {
        SchedulingError::SessionNotFound {
            session_id: session_id.to_string(),
        }
        .into()
    })
}

async fn load_enrollment(ctx: &SchedulingContext, enrollment_id: &str) -> Result<Option<Enrollment>> {
    ctx.enrollments.get(enrollment_id).await
}

/// Tear down the external artifacts of a session. Never fails; the session
/// row is the source of truth and external systems reconcile from it.
async fn teardown_externals(ctx: &SchedulingContext, session: &ScheduledSession) {
    if let Some(event_id) = &session.calendar_event_id {
        if let Err(e) = ctx.calendar.cancel_event(event_id).await {
            tracing::warn!(
                session_id = %session.id,
                event_id = %event_id,
                error = %e,
                "Calendar cancellation failed; session state updated anyway"
            );
        }
    }
    if let Some(bot_id) = &session.bot_id {
        if let Err(e) = ctx.bot.cancel(bot_id).await {
            tracing::warn!(
                session_id = %session.id,
                bot_id = %bot_id,
                error = %e,
                "Recording bot cancellation failed"
            );
        }
    }
}

async fn notify_parent(
    ctx: &SchedulingContext,
    session: &ScheduledSession,
    template: NotificationTemplate,
    extra: &[(&str, String)],
) {
    let Ok(Some(enrollment)) = load_enrollment(ctx, &session.enrollment_id).await else {
        tracing::warn!(
            session_id = %session.id,
            enrollment_id = %session.enrollment_id,
            "Enrollment missing; skipping notification"
        );
        return;
    };
    let mut notification = Notification::new(template, Channel::Whatsapp, &enrollment.parent_email)
        .variable("child_name", &enrollment.child_name)
        .variable("session_date", session.scheduled_date.to_string())
        .variable("session_time", session.scheduled_time.format("%H:%M").to_string());
    for (key, value) in extra {
        notification = notification.variable(*key, value.clone());
    }
    send_best_effort(ctx.notifier.as_ref(), notification).await;
}

/// `session.cancel` — mark a session cancelled and tear down its calendar
/// event and recording bot. Cancelling an already-cancelled session is a
/// no-op success.
async fn cancel_session(payload: Value, ctx: Arc<SchedulingContext>) -> Result<Value> {
    let session_id = str_field(&payload, "sessionId")?;
    let session = load_session(&ctx, &session_id).await?;

    if session.status == SessionStatus::Cancelled {
        return Ok(json!({ "sessionId": session_id, "alreadyCancelled": true }));
    }
    if !session.status.occupies_slot() {
        return Err(SchedulingError::InvalidTransition {
            session_id,
            from: session.status.to_string(),
            to: SessionStatus::Cancelled.to_string(),
        }
        .into());
    }

    teardown_externals(&ctx, &session).await;
    ctx.sessions
        .set_status(&session.id, SessionStatus::Cancelled)
        .await?;
    notify_parent(&ctx, &session, NotificationTemplate::SessionCancelled, &[]).await;

    tracing::info!(session_id = %session.id, "Session cancelled");
    Ok(json!({ "sessionId": session.id, "status": "cancelled" }))
}

/// `session.reschedule` — supersede a session with a replacement row at a
/// new date and time, keeping the sequence number and reusing the calendar
/// event by moving it.
async fn reschedule_session(payload: Value, ctx: Arc<SchedulingContext>) -> Result<Value> {
    let session_id = str_field(&payload, "sessionId")?;
    let new_date = parse_date(&payload, "newDate")?;
    let new_time = parse_time(&payload, "newTime")?;

    let session = load_session(&ctx, &session_id).await?;
    if !session.status.occupies_slot() {
        return Err(SchedulingError::InvalidTransition {
            session_id,
            from: session.status.to_string(),
            to: SessionStatus::Rescheduled.to_string(),
        }
        .into());
    }

    // Vacate the slot before the replacement claims it.
    ctx.sessions
        .set_status(&session.id, SessionStatus::Rescheduled)
        .await?;

    let replacement = ScheduledSession {
        id: uuid::Uuid::new_v4().to_string(),
        scheduled_date: new_date,
        scheduled_time: new_time,
        status: SessionStatus::Scheduled,
        ..session.clone()
    };
    ctx.sessions.insert(&replacement).await?;

    // Move the existing calendar event rather than booking a new one.
    if let Some(event_id) = &session.calendar_event_id {
        let start = new_date.and_time(new_time);
        let changes = CalendarEventChanges {
            start: Some(start),
            end: Some(start + chrono::Duration::minutes(session.duration_minutes as i64)),
            ..CalendarEventChanges::default()
        };
        if let Err(e) = ctx.calendar.update_event(event_id, &changes).await {
            tracing::warn!(
                session_id = %replacement.id,
                event_id = %event_id,
                error = %e,
                "Calendar move failed; replacement session stands"
            );
        }
    }

    // Re-point the recording bot at the new time.
    if let Some(bot_id) = &session.bot_id {
        if let Err(e) = ctx.bot.cancel(bot_id).await {
            tracing::warn!(bot_id = %bot_id, error = %e, "Old recording bot cancellation failed");
        }
    }
    if let Some(link) = &replacement.meeting_link {
        match ctx
            .bot
            .schedule(&replacement.id, link, replacement.starts_at())
            .await
        {
            Ok(bot_id) => ctx.sessions.set_bot(&replacement.id, Some(bot_id)).await?,
            Err(e) => {
                tracing::warn!(session_id = %replacement.id, error = %e, "Recording bot rebooking failed");
            }
        }
    }

    notify_parent(
        &ctx,
        &replacement,
        NotificationTemplate::SessionRescheduled,
        &[
            ("new_date", new_date.to_string()),
            ("new_time", new_time.format("%H:%M").to_string()),
        ],
    )
    .await;

    tracing::info!(
        old_session_id = %session.id,
        new_session_id = %replacement.id,
        %new_date,
        "Session rescheduled"
    );
    Ok(json!({
        "oldSessionId": session.id,
        "newSessionId": replacement.id,
        "newDate": new_date.to_string(),
        "newTime": new_time.format("%H:%M").to_string(),
    }))
}

/// `session.no_show` — record that a party failed to attend. The optional
/// `party` field ("coach" or "child") picks which status applies; the
/// default is a child/parent no-show.
async fn record_no_show(payload: Value, ctx: Arc<SchedulingContext>) -> Result<Value> {
    let session_id = str_field(&payload, "sessionId")?;
    let session = load_session(&ctx, &session_id).await?;
    if !session.status.occupies_slot() {
        return Err(SchedulingError::InvalidTransition {
            session_id,
            from: session.status.to_string(),
            to: SessionStatus::NoShow.to_string(),
        }
        .into());
    }

    let status = match payload.get("party").and_then(Value::as_str) {
        Some("coach") => SessionStatus::CoachNoShow,
        _ => SessionStatus::NoShow,
    };
    ctx.sessions.set_status(&session.id, status).await?;

    if status == SessionStatus::NoShow {
        notify_parent(&ctx, &session, NotificationTemplate::NoShowFollowUp, &[]).await;
    }

    tracing::info!(session_id = %session.id, status = %status, "No-show recorded");
    Ok(json!({ "sessionId": session.id, "status": status }))
}

/// `coach.unavailable` — take a coach out of the assignment pool and report
/// the upcoming sessions that need operator attention. Sessions are not
/// auto-reassigned.
async fn coach_unavailable(payload: Value, ctx: Arc<SchedulingContext>) -> Result<Value> {
    deactivate_coach(payload, ctx, "unavailable").await
}

/// `coach.exit` — permanent version of unavailability. Same mechanics; the
/// distinction matters to upstream HR automation, not the engine.
async fn coach_exit(payload: Value, ctx: Arc<SchedulingContext>) -> Result<Value> {
    deactivate_coach(payload, ctx, "exited").await
}

async fn deactivate_coach(
    payload: Value,
    ctx: Arc<SchedulingContext>,
    reason: &str,
) -> Result<Value> {
    let coach_id = str_field(&payload, "coachId")?;
    ctx.coaches.set_active(&coach_id, false).await?;

    let today = Utc::now().date_naive();
    let upcoming = ctx.sessions.list_scheduled_by_coach(&coach_id, today).await?;
    for session in &upcoming {
        notify_parent(&ctx, session, NotificationTemplate::CoachReassigned, &[]).await;
    }

    tracing::info!(
        coach_id = %coach_id,
        reason,
        affected_sessions = upcoming.len(),
        "Coach removed from assignment pool"
    );
    Ok(json!({
        "coachId": coach_id,
        "active": false,
        "upcomingSessions": upcoming.iter().map(|s| s.id.clone()).collect::<Vec<_>>(),
    }))
}

/// `coach.return` — put a coach back in the assignment pool.
async fn coach_return(payload: Value, ctx: Arc<SchedulingContext>) -> Result<Value> {
    let coach_id = str_field(&payload, "coachId")?;
    ctx.coaches.set_active(&coach_id, true).await?;
    tracing::info!(coach_id = %coach_id, "Coach returned to assignment pool");
    Ok(json!({ "coachId": coach_id, "active": true }))
}

/// `enrollment.schedule_sessions` — expand the standard curriculum into
/// booked sessions for an enrollment's assigned coach.
async fn schedule_enrollment_sessions(payload: Value, ctx: Arc<SchedulingContext>) -> Result<Value> {
    let enrollment_id = str_field(&payload, "enrollmentId")?;
    let enrollment = ctx
        .enrollments
        .get(&enrollment_id)
        .await?
        .ok_or_else(|| crate::error::CoachwayError::not_found(format!(
            "Enrollment not found: {enrollment_id}"
        )))?;
    let coach_id = enrollment.coaching_coach_id.clone().ok_or_else(|| {
        crate::error::CoachwayError::conflict(format!(
            "Enrollment {enrollment_id} has no assigned coach"
        ))
    })?;
    let coach = ctx
        .coaches
        .get(&coach_id)
        .await?
        .ok_or_else(|| crate::error::CoachwayError::not_found(format!(
            "Coach not found: {coach_id}"
        )))?;

    let report = ctx
        .generator
        .generate(&enrollment, &coach, &Curriculum::standard_12_week())
        .await?;

    if !report.scheduled.is_empty() {
        let notification = Notification::new(
            NotificationTemplate::ScheduleConfirmed,
            Channel::Whatsapp,
            &enrollment.parent_email,
        )
        .variable("child_name", &enrollment.child_name)
        .variable("coach_name", &coach.name)
        .variable("session_count", report.scheduled.len().to_string());
        send_best_effort(ctx.notifier.as_ref(), notification).await;
    }

    Ok(json!({
        "enrollmentId": enrollment.id,
        "scheduled": report.scheduled.len(),
        "failures": report.failures,
    }))
}

fn parse_date(payload: &Value, field: &str) -> Result<NaiveDate> {
    let raw = str_field(payload, field)?;
    raw.parse().map_err(|_| {
        SchedulingError::InvalidField {
            field: field.to_string(),
            reason: format!("expected YYYY-MM-DD, got {raw:?}"),
        }
        .into()
    })
}

fn parse_time(payload: &Value, field: &str) -> Result<NaiveTime> {
    let raw = str_field(payload, field)?;
    NaiveTime::parse_from_str(&raw, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(&raw, "%H:%M:%S"))
        .map_err(|_| {
            SchedulingError::InvalidField {
                field: field.to_string(),
                reason: format!("expected HH:MM, got {raw:?}"),
            }
            .into()
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::InMemoryCache;
    use crate::config::{OrchestratorConfig, SchedulingConfig};
    use crate::enrollment::{
        Coach, CoachStore, EnrollmentStatus, EnrollmentStore, InMemoryCoachStore,
        InMemoryEnrollmentStore, LeadSource,
    };
    use crate::notify::ConsoleNotifier;
    use crate::scheduling::bot::MockRecordingBotClient;
    use crate::scheduling::calendar::MockCalendarClient;
    use crate::scheduling::generator::ScheduleGenerator;
    use crate::scheduling::session::{InMemorySessionStore, SessionStore, SessionType};

    struct Fixture {
        enrollments: InMemoryEnrollmentStore,
        coaches: InMemoryCoachStore,
        sessions: InMemorySessionStore,
        calendar: Arc<MockCalendarClient>,
        orchestrator: EventOrchestrator,
    }

    fn fixture() -> Fixture {
        let enrollments = InMemoryEnrollmentStore::new();
        let coaches = InMemoryCoachStore::new();
        let sessions = InMemorySessionStore::new();
        let calendar = Arc::new(MockCalendarClient::new());
        let bot = Arc::new(MockRecordingBotClient::new());
        let config = SchedulingConfig {
            throttle_ms: 0,
            ..SchedulingConfig::default()
        };
        let context = Arc::new(SchedulingContext {
            enrollments: Arc::new(enrollments.clone()),
            coaches: Arc::new(coaches.clone()),
            sessions: Arc::new(sessions.clone()),
            calendar: calendar.clone(),
            bot: bot.clone(),
            notifier: Arc::new(ConsoleNotifier),
            generator: ScheduleGenerator::new(
                Arc::new(sessions.clone()),
                calendar.clone(),
                bot,
                config,
            ),
        });
        let mut orchestrator = EventOrchestrator::new(
            context,
            Arc::new(InMemoryCache::new(100)),
            OrchestratorConfig::default(),
        );
        register_default_handlers(&mut orchestrator);
        Fixture {
            enrollments,
            coaches,
            sessions,
            calendar,
            orchestrator,
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn enrollment(id: &str) -> Enrollment {
        Enrollment {
            id: id.to_string(),
            child_id: format!("ch-{id}"),
            child_name: "Meera".to_string(),
            parent_email: "parent@example.com".to_string(),
            total_amount: 5999,
            lead_source: LeadSource::Parent,
            lead_source_coach_id: None,
            coaching_coach_id: Some("c1".to_string()),
            program_start: date(2026, 9, 1),
            program_end: date(2026, 11, 24),
            status: EnrollmentStatus::Active,
        }
    }

    fn coach(id: &str) -> Coach {
        Coach {
            id: id.to_string(),
            name: "Asha".to_string(),
            email: "asha@example.com".to_string(),
            is_active: true,
            max_capacity: 10,
            current_students: 0,
            fiscal_year_earnings: 0,
        }
    }

    fn session(id: &str, seq: u32) -> ScheduledSession {
        ScheduledSession {
            id: id.to_string(),
            enrollment_id: "e1".to_string(),
            coach_id: "c1".to_string(),
            session_type: SessionType::Coaching,
            sequence_number: seq,
            scheduled_date: date(2026, 9, 8),
            scheduled_time: NaiveTime::from_hms_opt(17, 30, 0).unwrap(),
            duration_minutes: 45,
            calendar_event_id: Some("evt-1".to_string()),
            meeting_link: Some("https://meet.example.com/1".to_string()),
            bot_id: None,
            status: SessionStatus::Scheduled,
        }
    }

    #[tokio::test]
    async fn test_cancel_marks_and_tears_down() {
        let f = fixture();
        f.enrollments.insert(&enrollment("e1")).await.unwrap();
        f.sessions.insert(&session("s1", 1)).await.unwrap();

        let result = f
            .orchestrator
            .dispatch(
                "session.cancel",
                json!({"requestId": "r1", "sessionId": "s1"}),
            )
            .await
            .unwrap();
        assert!(result.success);

        let s = f.sessions.get("s1").await.unwrap().unwrap();
        assert_eq!(s.status, SessionStatus::Cancelled);
        assert_eq!(f.calendar.cancelled_events(), vec!["evt-1".to_string()]);
    }

    #[tokio::test]
    async fn test_cancel_missing_session_fails() {
        let f = fixture();
        let result = f
            .orchestrator
            .dispatch(
                "session.cancel",
                json!({"requestId": "r1", "sessionId": "ghost"}),
            )
            .await
            .unwrap();
        assert!(!result.success);
        assert!(result.error.unwrap().contains("not found"));
    }

    #[tokio::test]
    async fn test_reschedule_replaces_row() {
        let f = fixture();
        f.enrollments.insert(&enrollment("e1")).await.unwrap();
        f.sessions.insert(&session("s1", 3)).await.unwrap();

        let result = f
            .orchestrator
            .dispatch(
                "session.reschedule",
                json!({
                    "requestId": "r1",
                    "sessionId": "s1",
                    "newDate": "2026-09-10",
                    "newTime": "18:00",
                }),
            )
            .await
            .unwrap();
        assert!(result.success, "{:?}", result.error);

        let old = f.sessions.get("s1").await.unwrap().unwrap();
        assert_eq!(old.status, SessionStatus::Rescheduled);

        let active: Vec<_> = f
            .sessions
            .list_by_enrollment("e1")
            .await
            .unwrap()
            .into_iter()
            .filter(|s| s.status.occupies_slot())
            .collect();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].sequence_number, 3);
        assert_eq!(active[0].scheduled_date, date(2026, 9, 10));
        assert_eq!(f.calendar.updated_events(), vec!["evt-1".to_string()]);
    }

    #[tokio::test]
    async fn test_reschedule_rejects_bad_date() {
        let f = fixture();
        f.sessions.insert(&session("s1", 1)).await.unwrap();

        let result = f
            .orchestrator
            .dispatch(
                "session.reschedule",
                json!({
                    "requestId": "r1",
                    "sessionId": "s1",
                    "newDate": "tomorrow",
                    "newTime": "18:00",
                }),
            )
            .await
            .unwrap();
        assert!(!result.success);
        assert!(result.error.unwrap().contains("newDate"));
        // Nothing changed.
        let s = f.sessions.get("s1").await.unwrap().unwrap();
        assert_eq!(s.status, SessionStatus::Scheduled);
    }

    #[tokio::test]
    async fn test_no_show_party_selection() {
        let f = fixture();
        f.enrollments.insert(&enrollment("e1")).await.unwrap();
        f.sessions.insert(&session("s1", 1)).await.unwrap();
        f.sessions.insert(&session("s2", 2)).await.unwrap();

        f.orchestrator
            .dispatch(
                "session.no_show",
                json!({"requestId": "r1", "sessionId": "s1"}),
            )
            .await
            .unwrap();
        f.orchestrator
            .dispatch(
                "session.no_show",
                json!({"requestId": "r2", "sessionId": "s2", "party": "coach"}),
            )
            .await
            .unwrap();

        assert_eq!(
            f.sessions.get("s1").await.unwrap().unwrap().status,
            SessionStatus::NoShow
        );
        assert_eq!(
            f.sessions.get("s2").await.unwrap().unwrap().status,
            SessionStatus::CoachNoShow
        );
    }

    #[tokio::test]
    async fn test_coach_unavailable_and_return() {
        let f = fixture();
        f.coaches.insert(&coach("c1")).await.unwrap();
        f.enrollments.insert(&enrollment("e1")).await.unwrap();
        let mut s = session("s1", 1);
        s.scheduled_date = Utc::now().date_naive() + chrono::Duration::days(7);
        f.sessions.insert(&s).await.unwrap();

        let result = f
            .orchestrator
            .dispatch(
                "coach.unavailable",
                json!({"requestId": "r1", "coachId": "c1"}),
            )
            .await
            .unwrap();
        assert!(result.success);
        let data = result.data.unwrap();
        assert_eq!(data["upcomingSessions"].as_array().unwrap().len(), 1);
        assert!(!f.coaches.get("c1").await.unwrap().unwrap().is_active);

        let result = f
            .orchestrator
            .dispatch("coach.return", json!({"requestId": "r2", "coachId": "c1"}))
            .await
            .unwrap();
        assert!(result.success);
        assert!(f.coaches.get("c1").await.unwrap().unwrap().is_active);
    }

    #[tokio::test]
    async fn test_schedule_sessions_event() {
        let f = fixture();
        f.coaches.insert(&coach("c1")).await.unwrap();
        f.enrollments.insert(&enrollment("e1")).await.unwrap();

        let result = f
            .orchestrator
            .dispatch(
                "enrollment.schedule_sessions",
                json!({"requestId": "r1", "enrollmentId": "e1"}),
            )
            .await
            .unwrap();
        assert!(result.success, "{:?}", result.error);
        assert_eq!(result.data.unwrap()["scheduled"], 15);
        assert_eq!(f.sessions.list_by_enrollment("e1").await.unwrap().len(), 15);
    }

    #[tokio::test]
    async fn test_schedule_sessions_reports_partial_failure() {
        let f = fixture();
        f.coaches.insert(&coach("c1")).await.unwrap();
        f.enrollments.insert(&enrollment("e1")).await.unwrap();
        f.calendar.fail_create_at(5);

        let result = f
            .orchestrator
            .dispatch(
                "enrollment.schedule_sessions",
                json!({"requestId": "r1", "enrollmentId": "e1"}),
            )
            .await
            .unwrap();
        assert!(result.success);
        let data = result.data.unwrap();
        assert_eq!(data["scheduled"], 14);
        assert_eq!(data["failures"].as_array().unwrap().len(), 1);
        assert_eq!(data["failures"][0]["sequence_number"], 5);
    }
}
