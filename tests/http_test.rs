//! HTTP surface tests: the internal-secret guard and the JSON envelopes of
//! the dispatch and revenue endpoints.

use chrono::{NaiveDate, Utc};
use coachway::enrollment::{Coach, Enrollment, EnrollmentStatus, LeadSource};
use coachway::revenue::SplitConfig;
use coachway::scheduling::bot::MockRecordingBotClient;
use coachway::scheduling::calendar::MockCalendarClient;
use coachway::testing;
use coachway::{AppContext, ConfigBuilder};
use serde_json::{json, Value};
use std::sync::Arc;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

async fn context() -> AppContext {
    let config = ConfigBuilder::new()
        .with_internal_secret("test-secret")
        .with_throttle_ms(0)
        .build();
    let context = AppContext::builder(config)
        .with_calendar(Arc::new(MockCalendarClient::new()))
        .with_bot(Arc::new(MockRecordingBotClient::new()))
        .build()
        .unwrap();

    context
        .split_configs
        .insert(&SplitConfig {
            id: "v1".to_string(),
            lead_pct: 10,
            coach_pct: 50,
            tds_rate_pct: 10,
            tds_annual_threshold: 30_000,
            payout_day_of_month: 5,
            effective_from: date(2026, 1, 1),
            created_at: Utc::now(),
        })
        .await
        .unwrap();
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
            status: EnrollmentStatus::PendingStart,
        })
        .await
        .unwrap();
    context
}

#[tokio::test]
async fn test_health_is_public() {
    let app = coachway::http::router(context().await);
    let body: Value = testing::get(app, "/health").execute().await.assert_ok().json().await;
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_internal_endpoints_require_secret() {
    let app = coachway::http::router(context().await);

    // No header at all.
    testing::post(app.clone(), "/internal/dispatch")
        .json_body(&json!({"event": "coach.return", "requestId": "r1", "coachId": "c1"}))
        .execute()
        .await
        .assert_unauthorized();

    // Wrong secret.
    testing::post(app.clone(), "/internal/dispatch")
        .header("x-internal-secret", "wrong")
        .json_body(&json!({"event": "coach.return", "requestId": "r1", "coachId": "c1"}))
        .execute()
        .await
        .assert_forbidden();

    // Correct secret.
    testing::post(app, "/internal/dispatch")
        .header("x-internal-secret", "test-secret")
        .json_body(&json!({"event": "coach.return", "requestId": "r1", "coachId": "c1"}))
        .execute()
        .await
        .assert_ok();
}

#[tokio::test]
async fn test_dispatch_reports_handler_failure_in_body() {
    let app = coachway::http::router(context().await);

    // Unknown event is a 200 with success: false, not a transport error.
    let body: Value = testing::post(app.clone(), "/internal/dispatch")
        .header("x-internal-secret", "test-secret")
        .json_body(&json!({"event": "session.launch", "requestId": "r1"}))
        .execute()
        .await
        .assert_ok()
        .json()
        .await;
    assert_eq!(body["success"], false);

    // A missing event name is a malformed envelope.
    testing::post(app, "/internal/dispatch")
        .header("x-internal-secret", "test-secret")
        .json_body(&json!({"requestId": "r1"}))
        .execute()
        .await
        .assert_bad_request();
}

#[tokio::test]
async fn test_onboard_and_revenue_flow() {
    let ctx = context().await;
    let app = coachway::http::router(ctx.clone());

    let body: Value = testing::post(app.clone(), "/internal/enrollments/e1/onboard")
        .header("x-internal-secret", "test-secret")
        .json_body(&json!({}))
        .execute()
        .await
        .assert_ok()
        .json()
        .await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["sessions_scheduled"], 15);
    assert_eq!(body["data"]["revenue"]["revenue"]["coach_share"], 3000);

    // Onboarding already allocated revenue; the explicit endpoint conflicts.
    testing::post(app, "/internal/revenue/calculate")
        .header("x-internal-secret", "test-secret")
        .json_body(&json!({"enrollmentId": "e1"}))
        .execute()
        .await
        .assert_conflict();
}

#[tokio::test]
async fn test_revenue_endpoint_returns_breakdown() {
    let ctx = context().await;
    let app = coachway::http::router(ctx.clone());

    let body: Value = testing::post(app.clone(), "/internal/revenue/calculate")
        .header("x-internal-secret", "test-secret")
        .json_body(&json!({"enrollmentId": "e1"}))
        .execute()
        .await
        .assert_ok()
        .json()
        .await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["revenue"]["coach_share"], 3000);
    assert_eq!(body["data"]["payouts"].as_array().unwrap().len(), 3);

    // Unknown enrollment is a 404.
    testing::post(app, "/internal/revenue/calculate")
        .header("x-internal-secret", "test-secret")
        .json_body(&json!({"enrollmentId": "ghost"}))
        .execute()
        .await
        .assert_not_found();
}
