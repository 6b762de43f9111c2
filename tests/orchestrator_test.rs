//! Event dispatch tests: validation, routing, and cache-backed idempotency,
//! exercised through a fully wired application context.

use chrono::NaiveDate;
use coachway::enrollment::{Coach, Enrollment, EnrollmentStatus, LeadSource};
use coachway::scheduling::bot::MockRecordingBotClient;
use coachway::scheduling::calendar::MockCalendarClient;
use coachway::{AppContext, Config, ConfigBuilder};
use serde_json::json;
use std::sync::Arc;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

struct Harness {
    context: AppContext,
    calendar: Arc<MockCalendarClient>,
}

fn harness_with_config(config: Config) -> Harness {
    let calendar = Arc::new(MockCalendarClient::new());
    let context = AppContext::builder(config)
        .with_calendar(calendar.clone())
        .with_bot(Arc::new(MockRecordingBotClient::new()))
        .build()
        .unwrap();
    Harness { context, calendar }
}

fn harness() -> Harness {
    harness_with_config(ConfigBuilder::new().with_throttle_ms(0).build())
}

async fn seed_enrollment(context: &AppContext) {
    context
        .coaches
        .insert(&Coach {
            id: "c1".to_string(),
            name: "Asha".to_string(),
            email: "asha@example.com".to_string(),
            is_active: true,
            max_capacity: 10,
            current_students: 0,
            fiscal_year_earnings: 0,
        })
        .await
        .unwrap();
    context
        .enrollments
        .insert(&Enrollment {
            id: "e1".to_string(),
            child_id: "ch1".to_string(),
            child_name: "Meera".to_string(),
            parent_email: "parent@example.com".to_string(),
            total_amount: 5999,
            lead_source: LeadSource::Parent,
            lead_source_coach_id: None,
            coaching_coach_id: Some("c1".to_string()),
            program_start: date(2026, 9, 1),
            program_end: date(2026, 11, 24),
            status: EnrollmentStatus::Active,
        })
        .await
        .unwrap();
}

#[tokio::test]
async fn test_default_handler_set_is_registered() {
    let h = harness();
    assert_eq!(
        h.context.orchestrator.registered_events(),
        vec![
            "coach.exit",
            "coach.return",
            "coach.unavailable",
            "enrollment.schedule_sessions",
            "session.cancel",
            "session.no_show",
            "session.reschedule",
        ]
    );
}

#[tokio::test]
async fn test_unknown_event_rejected_without_side_effects() {
    let h = harness();
    let result = h
        .context
        .orchestrator
        .dispatch("session.explode", json!({"requestId": "r1"}))
        .await
        .unwrap();
    assert!(!result.success);
    assert!(result.error.unwrap().contains("Unknown event"));
    assert_eq!(h.calendar.create_count(), 0);
}

#[tokio::test]
async fn test_missing_identifier_rejected() {
    let h = harness();
    let result = h
        .context
        .orchestrator
        .dispatch("session.cancel", json!({"requestId": "r1"}))
        .await
        .unwrap();
    assert!(!result.success);
    assert!(result.error.unwrap().contains("sessionId"));

    // requestId itself is mandatory on every event.
    let result = h
        .context
        .orchestrator
        .dispatch("session.cancel", json!({"sessionId": "s1"}))
        .await
        .unwrap();
    assert!(!result.success);
    assert!(result.error.unwrap().contains("requestId"));
}

#[tokio::test]
async fn test_replayed_event_runs_side_effects_once() {
    let h = harness();
    seed_enrollment(&h.context).await;

    let first = h
        .context
        .orchestrator
        .dispatch(
            "enrollment.schedule_sessions",
            json!({"requestId": "r1", "enrollmentId": "e1"}),
        )
        .await
        .unwrap();
    assert!(first.success, "{:?}", first.error);
    assert_eq!(h.calendar.create_count(), 15);

    // A retried delivery with a fresh requestId must not book again.
    let replay = h
        .context
        .orchestrator
        .dispatch(
            "enrollment.schedule_sessions",
            json!({"requestId": "r2", "enrollmentId": "e1"}),
        )
        .await
        .unwrap();
    assert!(replay.success);
    assert_eq!(h.calendar.create_count(), 15);
    assert_eq!(
        h.context.sessions.list_by_enrollment("e1").await.unwrap().len(),
        15
    );

    // The replayed result is byte-for-byte the original.
    assert_eq!(
        serde_json::to_value(&first).unwrap(),
        serde_json::to_value(&replay).unwrap()
    );
}

#[tokio::test]
async fn test_failed_dispatch_retries_by_default() {
    let h = harness();
    // No enrollment seeded yet, so the handler fails.
    let payload = json!({"requestId": "r1", "enrollmentId": "e1"});
    let first = h
        .context
        .orchestrator
        .dispatch("enrollment.schedule_sessions", payload.clone())
        .await
        .unwrap();
    assert!(!first.success);

    // Default config does not cache failures; once the enrollment exists,
    // the identical logical request runs the handler again and succeeds.
    seed_enrollment(&h.context).await;
    let retry = h
        .context
        .orchestrator
        .dispatch("enrollment.schedule_sessions", payload)
        .await
        .unwrap();
    assert!(retry.success);
}

#[tokio::test]
async fn test_cached_failure_when_ttl_configured() {
    let config = ConfigBuilder::new()
        .with_throttle_ms(0)
        .with_failure_ttl_secs(300)
        .build();
    let h = harness_with_config(config);

    let payload = json!({"requestId": "r1", "enrollmentId": "ghost"});
    h.context
        .orchestrator
        .dispatch("enrollment.schedule_sessions", payload.clone())
        .await
        .unwrap();

    // The failure is replayed from cache even after the data problem is
    // fixed, until the TTL lapses.
    seed_enrollment(&h.context).await;
    let replay = h
        .context
        .orchestrator
        .dispatch("enrollment.schedule_sessions", payload)
        .await
        .unwrap();
    assert!(!replay.success);
    assert_eq!(h.calendar.create_count(), 0);
}
