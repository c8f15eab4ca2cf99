//! Tests for friendship HTTP handlers.

use super::*;
use crate::domain::{ErrorCode, FriendStatusLabel, UserId};
use crate::inbound::http::test_utils::{MockPorts, anonymous_app, signed_in_app};
use actix_web::http::StatusCode;
use actix_web::{test as actix_test, web};
use chrono::{TimeZone, Utc};
use rstest::{fixture, rstest};
use serde_json::{Value, json};

const ACTOR: &str = "11111111-1111-1111-1111-111111111111";
const FRIEND: &str = "22222222-2222-2222-2222-222222222222";

#[fixture]
fn actor() -> UserId {
    UserId::new(ACTOR).expect("actor id")
}

#[fixture]
fn friend() -> UserId {
    UserId::new(FRIEND).expect("friend id")
}

fn friend_view(id: UserId, status: FriendStatusLabel) -> FriendView {
    FriendView {
        user: UserSummary {
            id,
            display_name: "Grace".to_owned(),
            avatar_url: None,
        },
        status,
        message: Some("hi".to_owned()),
        checked_in_today: true,
        streak_days: 4,
    }
}

fn routes() -> actix_web::Scope {
    web::scope("/api/v1")
        .service(request_friend)
        .service(accept_friend)
        .service(list_friends)
        .service(get_friend)
        .service(get_permission)
        .service(update_permission)
        .service(remind_friend)
        .service(encourage_friend)
}

fn error_field(body: &Value) -> Option<&str> {
    body.get("details")
        .and_then(|details| details.get("field"))
        .and_then(Value::as_str)
}

#[rstest]
#[actix_web::test]
async fn request_friend_trims_phone_and_returns_view(actor: UserId, friend: UserId) {
    let mut ports = MockPorts::default();
    ports
        .friendships
        .expect_request_friend()
        .withf(move |request| {
            request.actor == actor
                && request.target_phone == "5550100"
                && request.message.as_deref() == Some("let's streak")
        })
        .times(1)
        .returning(move |_| Ok(friend_view(friend, FriendStatusLabel::PendingOut)));

    let app = actix_test::init_service(signed_in_app(ports, actor).service(routes())).await;
    let request = actix_test::TestRequest::post()
        .uri("/api/v1/friends/request")
        .set_json(json!({"phone": " 5550100 ", "message": " let's streak "}))
        .to_request();
    let body: Value = actix_test::call_and_read_body_json(&app, request).await;

    assert_eq!(body["status"], "pending_out");
    assert_eq!(body["user"]["id"], FRIEND);
    assert_eq!(body["user"]["displayName"], "Grace");
    assert_eq!(body["streakDays"], 4);
}

#[rstest]
#[case(json!({}), "phone")]
#[case(json!({"phone": "   "}), "phone")]
#[case(json!({"phone": "5550100", "message": "x".repeat(201)}), "message")]
#[actix_web::test]
async fn request_friend_rejects_invalid_payloads(
    actor: UserId,
    #[case] payload: Value,
    #[case] field: &str,
) {
    let app =
        actix_test::init_service(signed_in_app(MockPorts::default(), actor).service(routes()))
            .await;
    let request = actix_test::TestRequest::post()
        .uri("/api/v1/friends/request")
        .set_json(payload)
        .to_request();
    let response = actix_test::call_service(&app, request).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = actix_test::read_body_json(response).await;
    assert_eq!(error_field(&body), Some(field));
}

#[actix_web::test]
async fn anonymous_callers_are_unauthorised() {
    let app = actix_test::init_service(anonymous_app(MockPorts::default()).service(routes())).await;
    let request = actix_test::TestRequest::get()
        .uri("/api/v1/friends")
        .to_request();
    let response = actix_test::call_service(&app, request).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[rstest]
#[actix_web::test]
async fn accept_friend_parses_requester(actor: UserId, friend: UserId) {
    let mut ports = MockPorts::default();
    ports
        .friendships
        .expect_accept_friend()
        .withf(move |caller, requester| *caller == actor && *requester == friend)
        .times(1)
        .returning(move |_, _| Ok(friend_view(friend, FriendStatusLabel::Accepted)));

    let app = actix_test::init_service(signed_in_app(ports, actor).service(routes())).await;
    let request = actix_test::TestRequest::post()
        .uri("/api/v1/friends/accept")
        .set_json(json!({"requesterId": FRIEND}))
        .to_request();
    let body: Value = actix_test::call_and_read_body_json(&app, request).await;
    assert_eq!(body["status"], "accepted");
}

#[rstest]
#[actix_web::test]
async fn malformed_friend_id_is_rejected_before_the_port(actor: UserId) {
    let app =
        actix_test::init_service(signed_in_app(MockPorts::default(), actor).service(routes()))
            .await;
    let request = actix_test::TestRequest::post()
        .uri("/api/v1/friends/not-a-uuid/remind")
        .to_request();
    let response = actix_test::call_service(&app, request).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = actix_test::read_body_json(response).await;
    assert_eq!(body["details"]["code"], "invalid_uuid");
}

#[rstest]
#[actix_web::test]
async fn hidden_detail_surfaces_forbidden(actor: UserId, friend: UserId) {
    let mut ports = MockPorts::default();
    ports
        .friendships_query
        .expect_friend_detail()
        .withf(move |_, target| *target == friend)
        .times(1)
        .returning(|_, _| Err(Error::forbidden("friend hides their details")));

    let app = actix_test::init_service(signed_in_app(ports, actor).service(routes())).await;
    let request = actix_test::TestRequest::get()
        .uri(&format!("/api/v1/friends/{FRIEND}"))
        .to_request();
    let response = actix_test::call_service(&app, request).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[rstest]
#[actix_web::test]
async fn friend_detail_serialises_checkin_time(actor: UserId, friend: UserId) {
    let last = Utc.with_ymd_and_hms(2024, 3, 10, 7, 30, 0).single().expect("time");
    let mut ports = MockPorts::default();
    ports
        .friendships_query
        .expect_friend_detail()
        .times(1)
        .returning(move |_, _| {
            Ok(FriendDetailView {
                friend: friend_view(friend, FriendStatusLabel::Accepted),
                phone: "5550100".to_owned(),
                permission: FriendPermission {
                    can_view_detail: true,
                    can_remind: false,
                },
                last_checkin_at: Some(last),
            })
        });

    let app = actix_test::init_service(signed_in_app(ports, actor).service(routes())).await;
    let request = actix_test::TestRequest::get()
        .uri(&format!("/api/v1/friends/{FRIEND}"))
        .to_request();
    let body: Value = actix_test::call_and_read_body_json(&app, request).await;
    assert_eq!(body["phone"], "5550100");
    assert_eq!(body["permission"]["canRemind"], false);
    assert_eq!(body["lastCheckinAt"], "2024-03-10T07:30:00+00:00");
}

#[rstest]
#[actix_web::test]
async fn permission_patch_forwards_only_present_fields(actor: UserId, friend: UserId) {
    let mut ports = MockPorts::default();
    ports
        .friendships
        .expect_update_permission()
        .withf(move |_, target, patch| {
            *target == friend
                && *patch
                    == FriendPermissionPatch {
                        can_view_detail: Some(true),
                        can_remind: None,
                    }
        })
        .times(1)
        .returning(|_, _, patch| Ok(FriendPermission::default().apply(patch)));

    let app = actix_test::init_service(signed_in_app(ports, actor).service(routes())).await;
    let request = actix_test::TestRequest::post()
        .uri(&format!("/api/v1/friends/{FRIEND}/permission"))
        .set_json(json!({"canViewDetail": true}))
        .to_request();
    let body: Value = actix_test::call_and_read_body_json(&app, request).await;
    assert_eq!(body, json!({"canViewDetail": true, "canRemind": true}));
}

#[rstest]
#[case(RemindOutcome::sent(), json!({"sent": true, "limited": false}))]
#[case(RemindOutcome::limited(), json!({"sent": false, "limited": true}))]
#[actix_web::test]
async fn remind_reports_outcome(
    actor: UserId,
    #[case] outcome: RemindOutcome,
    #[case] expected: Value,
) {
    let mut ports = MockPorts::default();
    ports
        .interactions
        .expect_remind_friend()
        .times(1)
        .returning(move |_, _| Ok(outcome));

    let app = actix_test::init_service(signed_in_app(ports, actor).service(routes())).await;
    let request = actix_test::TestRequest::post()
        .uri(&format!("/api/v1/friends/{FRIEND}/remind"))
        .to_request();
    let body: Value = actix_test::call_and_read_body_json(&app, request).await;
    assert_eq!(body, expected);
}

#[rstest]
#[actix_web::test]
async fn encourage_returns_no_content(actor: UserId, friend: UserId) {
    let mut ports = MockPorts::default();
    ports
        .interactions
        .expect_encourage_friend()
        .withf(move |request| {
            request.friend == friend && request.emoji == "🔥" && request.message.is_none()
        })
        .times(1)
        .returning(|_| Ok(()));

    let app = actix_test::init_service(signed_in_app(ports, actor).service(routes())).await;
    let request = actix_test::TestRequest::post()
        .uri(&format!("/api/v1/friends/{FRIEND}/encourage"))
        .set_json(json!({"emoji": " 🔥 ", "message": "  "}))
        .to_request();
    let response = actix_test::call_service(&app, request).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[rstest]
#[case(EncourageBody { emoji: None, message: None })]
#[case(EncourageBody { emoji: Some(String::new()), message: None })]
#[case(EncourageBody { emoji: Some("🎉".repeat(17)), message: None })]
fn encourage_body_requires_bounded_emoji(#[case] body: EncourageBody) {
    let error = parse_encourage_body(body)
        .err()
        .expect("emoji validation fails");
    assert_eq!(error.code(), ErrorCode::InvalidRequest);
    assert_eq!(
        error
            .details()
            .and_then(|details| details.get("field"))
            .and_then(Value::as_str),
        Some("emoji")
    );
}
