use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use valetdesk::config::AppConfig;
use valetdesk::db;
use valetdesk::events::EventBus;
use valetdesk::handlers;
use valetdesk::models::{Booking, BookingStatus, Invoice};
use valetdesk::services::gateway::{BookingGateway, SqliteGateway};
use valetdesk::services::messaging::MessagingProvider;
use valetdesk::state::AppState;

// ── Mock Providers ──

struct MockMessaging {
    sent: Arc<Mutex<Vec<(String, String)>>>,
}

#[async_trait]
impl MessagingProvider for MockMessaging {
    async fn send_message(&self, to: &str, body: &str) -> anyhow::Result<()> {
        self.sent
            .lock()
            .unwrap()
            .push((to.to_string(), body.to_string()));
        Ok(())
    }
}

// ── Helpers ──

fn test_config() -> AppConfig {
    AppConfig {
        port: 3000,
        database_url: ":memory:".to_string(),
        local_store_url: ":memory:".to_string(),
        admin_token: "test-token".to_string(),
        remote_url: None,
        remote_api_key: "".to_string(),
        remote_poll_secs: 15,
        refresh_throttle_ms: 10,
        default_job_minutes: 120,
        business_name: "Shine Co".to_string(),
        twilio_account_sid: "".to_string(),
        twilio_auth_token: "".to_string(),
        twilio_phone_number: "".to_string(),
    }
}

struct TestEnv {
    state: Arc<AppState>,
    remote: Arc<SqliteGateway>,
    sent: Arc<Mutex<Vec<(String, String)>>>,
}

fn test_env() -> TestEnv {
    let bus = EventBus::default();
    let local = db::shared(db::init_db(":memory:").unwrap());
    let remote = Arc::new(SqliteGateway::new(
        db::shared(db::init_db(":memory:").unwrap()),
        bus.clone(),
    ));
    let sent = Arc::new(Mutex::new(vec![]));
    let messaging = MockMessaging {
        sent: Arc::clone(&sent),
    };

    let state = Arc::new(AppState::new(
        test_config(),
        bus,
        local,
        Arc::clone(&remote) as Arc<dyn BookingGateway>,
        Arc::new(messaging),
    ));
    TestEnv {
        state,
        remote,
        sent,
    }
}

fn app(env: &TestEnv) -> Router {
    handlers::router(Arc::clone(&env.state))
}

fn authed(method: &str, uri: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("Authorization", "Bearer test-token");
    match body {
        Some(json) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn send(env: &TestEnv, req: Request<Body>) -> (StatusCode, Value) {
    let res = app(env).oneshot(req).await.unwrap();
    let status = res.status();
    let body = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}

fn intake(customer: &str, date: &str) -> Value {
    json!({
        "customer": customer,
        "vehicle": "VW Golf",
        "packageType": "Full Valet",
        "date": date,
        "location": "Depot",
        "phone": "07700900123",
        "staff": ["Sam"],
    })
}

async fn create(env: &TestEnv, customer: &str, date: &str) -> String {
    let (status, json) = send(env, authed("POST", "/api/bookings", Some(intake(customer, date)))).await;
    assert_eq!(status, StatusCode::CREATED);
    json["id"].as_str().unwrap().to_string()
}

// ── Auth ──

#[tokio::test]
async fn test_health() {
    let env = test_env();
    let res = app(&env)
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_api_requires_auth() {
    let env = test_env();
    let res = app(&env)
        .oneshot(
            Request::builder()
                .uri("/api/bookings")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = app(&env)
        .oneshot(
            Request::builder()
                .uri("/api/bookings")
                .header("Authorization", "Bearer wrong-token")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_events_stream_requires_token() {
    let env = test_env();
    let res = app(&env)
        .oneshot(
            Request::builder()
                .uri("/api/events?token=nope")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

// ── Intake ──

#[tokio::test]
async fn test_intake_lands_in_pending() {
    let env = test_env();
    let id = create(&env, "Alice", "2024-06-01T09:00").await;

    let (status, json) = send(&env, authed("GET", "/api/bookings?status=pending", None)).await;
    assert_eq!(status, StatusCode::OK);
    let list = json.as_array().unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["id"], id.as_str());
    assert_eq!(list[0]["status"], "pending");
    assert_eq!(list[0]["date"], "2024-06-01T09:00:00");
}

#[tokio::test]
async fn test_intake_rejects_missing_fields() {
    let env = test_env();
    let (status, json) = send(
        &env,
        authed("POST", "/api/bookings", Some(json!({"customer": "Alice"}))),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(json["error"].as_str().unwrap().contains("vehicle"));

    let (_, json) = send(&env, authed("GET", "/api/bookings", None)).await;
    assert!(json.as_array().unwrap().is_empty());
}

// ── Status transitions ──

#[tokio::test]
async fn test_confirm_moves_bucket_and_writes_remote() {
    let env = test_env();
    let id = create(&env, "Alice", "2024-06-01T09:00").await;

    let (status, json) = send(&env, authed("POST", &format!("/api/bookings/{id}/confirm"), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["booking"]["status"], "confirmed");
    assert_eq!(json["notification"]["level"], "success");
    assert_eq!(json["notification"]["message"], "Booking confirmed");

    let (_, pending) = send(&env, authed("GET", "/api/bookings?status=pending", None)).await;
    assert!(pending.as_array().unwrap().is_empty());

    let remote = env.remote.get(&id).await.unwrap().unwrap();
    assert_eq!(remote.status, BookingStatus::Confirmed);
    assert_eq!(remote.customer, "Alice");
}

#[tokio::test]
async fn test_status_transition_to_inspecting() {
    let env = test_env();
    let id = create(&env, "Alice", "2024-06-01T09:00").await;
    send(&env, authed("POST", &format!("/api/bookings/{id}/confirm"), None)).await;

    let (status, json) = send(
        &env,
        authed(
            "POST",
            &format!("/api/bookings/{id}/status"),
            Some(json!({"status": "inspecting"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["booking"]["status"], "inspecting");
    assert_eq!(json["booking"]["customer"], "Alice");
    assert_eq!(json["notification"]["message"], "Pre-inspection started");

    let (_, json) = send(&env, authed("GET", &format!("/api/bookings/{id}"), None)).await;
    assert_eq!(json["status"], "inspecting");
    let remote = env.remote.get(&id).await.unwrap().unwrap();
    assert_eq!(remote.status, BookingStatus::Inspecting);
}

#[tokio::test]
async fn test_status_rejects_unknown_value() {
    let env = test_env();
    let id = create(&env, "Alice", "2024-06-01T09:00").await;
    let (status, _) = send(
        &env,
        authed(
            "POST",
            &format!("/api/bookings/{id}/status"),
            Some(json!({"status": "archived"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_cancel_pending_before_sync() {
    let env = test_env();
    let id = create(&env, "Alice", "2024-06-01T09:00").await;
    assert!(env.remote.get(&id).await.unwrap().is_none());

    let (status, json) = send(
        &env,
        authed(
            "POST",
            &format!("/api/bookings/{id}/status"),
            Some(json!({"status": "cancelled", "placement": "both"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["notification"]["message"], "Booking cancelled");

    let (_, json) = send(&env, authed("GET", &format!("/api/bookings/{id}"), None)).await;
    assert_eq!(json["status"], "cancelled");
    let remote = env.remote.get(&id).await.unwrap().unwrap();
    assert_eq!(remote.status, BookingStatus::Cancelled);
}

#[tokio::test]
async fn test_local_only_transition() {
    let env = test_env();
    let id = create(&env, "Alice", "2024-06-01T09:00").await;
    let (status, json) = send(
        &env,
        authed(
            "POST",
            &format!("/api/bookings/{id}/status"),
            Some(json!({"status": "in-progress", "placement": "local"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["notification"]["message"], "Job started");
    assert!(env.remote.get(&id).await.unwrap().is_none());
}

// ── Planner ──

#[tokio::test]
async fn test_planner_lists_same_day_with_conflicts() {
    let env = test_env();
    let morning = create(&env, "Alice", "2024-06-01T09:00").await;
    create(&env, "Bob", "2024-06-01T10:00").await;
    create(&env, "Carol", "2024-06-02T09:00").await;

    let (status, json) = send(&env, authed("GET", "/api/planner?date=2024-06-01", None)).await;
    assert_eq!(status, StatusCode::OK);
    let plan = json.as_array().unwrap();
    assert_eq!(plan.len(), 2);
    assert_eq!(plan[0]["booking"]["id"], morning.as_str());
    assert_eq!(plan[0]["start"], "09:00");
    assert_eq!(plan[0]["end"], "11:00");
    assert_eq!(plan[0]["conflicts"][0]["staff"], "Sam");

    let (status, _) = send(&env, authed("GET", "/api/planner?date=June", None)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

// ── Progress & photos ──

#[tokio::test]
async fn test_progress_tracking() {
    let env = test_env();
    let id = create(&env, "Alice", "2024-06-01T09:00").await;

    let (status, _) = send(&env, authed("GET", &format!("/api/bookings/{id}/progress"), None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let tasks = json!({"tasks": [
        {"id": "wash", "name": "Wash", "duration": 30},
        {"id": "polish", "name": "Polish", "duration": 60}
    ]});
    let (status, _) = send(
        &env,
        authed("PUT", &format!("/api/bookings/{id}/progress"), Some(tasks)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, json) = send(
        &env,
        authed(
            "POST",
            &format!("/api/bookings/{id}/progress/tasks/wash/complete"),
            Some(json!({"actualMinutes": 25})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["tasks"][0]["completed"], true);
    assert_eq!(json["tasks"][0]["actualDuration"], 25);
    assert_eq!(json["tasks"][1]["completed"], false);
}

#[tokio::test]
async fn test_photos_add_list_delete() {
    let env = test_env();
    let photo = json!({"type": "before", "image": "https://cdn.example.test/1.jpg"});
    let (status, json) = send(
        &env,
        authed("POST", "/api/bookings/b-1/photos", Some(photo)),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let photo_id = json["id"].as_str().unwrap().to_string();

    let (_, json) = send(&env, authed("GET", "/api/bookings/b-1/photos?type=before", None)).await;
    assert_eq!(json.as_array().unwrap().len(), 1);
    let (_, json) = send(&env, authed("GET", "/api/bookings/b-1/photos?type=after", None)).await;
    assert!(json.as_array().unwrap().is_empty());

    let (status, _) = send(&env, authed("DELETE", &format!("/api/photos/{photo_id}"), None)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&env, authed("DELETE", &format!("/api/photos/{photo_id}"), None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// ── Remote sync & invoices ──

fn remote_booking(id: &str, status: BookingStatus) -> Booking {
    let mut booking: Booking = serde_json::from_value(json!({
        "id": id,
        "customer": "Dana",
        "vehicle": "Mini",
        "packageType": "Mini Valet",
        "date": "2024-06-03T11:00:00",
        "phone": "07700900999",
    }))
    .unwrap();
    booking.status = status;
    booking
}

#[tokio::test]
async fn test_sync_pulls_remote_bookings() {
    let env = test_env();
    env.remote
        .insert(&remote_booking("r-1", BookingStatus::Confirmed))
        .await
        .unwrap();
    let local_id = create(&env, "Alice", "2024-06-01T09:00").await;

    let (status, json) = send(&env, authed("POST", "/api/sync", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["pushed"], 1);
    assert_eq!(json["pending"], 1);
    assert_eq!(json["confirmed"], 1);

    let (_, json) = send(&env, authed("GET", "/api/bookings?status=confirmed", None)).await;
    assert_eq!(json[0]["id"], "r-1");
    assert!(env.remote.get(&local_id).await.unwrap().is_some());
}

#[tokio::test]
async fn test_paid_invoice_requests_feedback() {
    let env = test_env();
    env.remote
        .insert(&remote_booking("r-1", BookingStatus::Finished))
        .await
        .unwrap();
    env.remote
        .insert_invoice(&Invoice {
            id: "inv-1".to_string(),
            booking_id: "r-1".to_string(),
            amount: 45.0,
            paid: false,
        })
        .unwrap();
    env.state.start_listeners().await;

    let (status, _) = send(&env, authed("POST", "/api/invoices/inv-1/paid", None)).await;
    assert_eq!(status, StatusCode::OK);

    tokio::time::sleep(Duration::from_millis(200)).await;
    {
        let sent = env.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "07700900999");
        assert!(sent[0].1.contains("Shine Co"));
    }

    let (_, json) = send(&env, authed("GET", "/api/invoices", None)).await;
    assert_eq!(json[0]["paid"], true);

    env.state.shutdown();
    assert!(env.state.listener_names().is_empty());
}

#[tokio::test]
async fn test_feedback_submit_and_list() {
    let env = test_env();
    let (status, _) = send(
        &env,
        authed(
            "POST",
            "/api/feedback",
            Some(json!({"bookingId": "r-1", "rating": 5, "comment": "Spotless"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = send(
        &env,
        authed(
            "POST",
            "/api/feedback",
            Some(json!({"bookingId": "r-1", "rating": 9})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (_, json) = send(&env, authed("GET", "/api/feedback?bookingId=r-1", None)).await;
    assert_eq!(json.as_array().unwrap().len(), 1);
    assert_eq!(json[0]["rating"], 5);
}

// ── Calendar ──

#[tokio::test]
async fn test_calendar_download() {
    let env = test_env();
    let id = create(&env, "Alice", "2024-06-01T09:00").await;

    let res = app(&env)
        .oneshot(
            Request::builder()
                .uri(format!("/calendar/{id}.ics"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(
        res.headers().get("content-type").unwrap(),
        "text/calendar; charset=utf-8"
    );
    let body = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .unwrap();
    let ics = String::from_utf8(body.to_vec()).unwrap();
    assert!(ics.contains("DTSTART:20240601T090000"));
    assert!(ics.contains("DTEND:20240601T110000"));

    let res = app(&env)
        .oneshot(
            Request::builder()
                .uri("/calendar/missing.ics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}
