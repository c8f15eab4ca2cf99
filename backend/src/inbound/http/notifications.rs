//! Notification inbox HTTP handlers.
//!
//! ```text
//! GET  /api/v1/notifications
//! POST /api/v1/notifications/{id}/read
//! POST /api/v1/notifications/read-all
//! ```

use actix_web::{get, post, web};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::ports::ListNotificationsRequest;
use crate::domain::{MarkAllReadOutcome, NotificationId, NotificationView};
use crate::inbound::http::ApiResult;
use crate::inbound::http::friends::UserSummaryResponse;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, parse_numeric_id};

const NOTIFICATION_ID: FieldName = FieldName::new("id");

/// Inbox entry.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NotificationResponse {
    pub id: i64,
    #[schema(example = "group_join_request")]
    pub kind: String,
    pub message: String,
    /// The triggering user, when one exists and still resolves.
    pub from_user: Option<UserSummaryResponse>,
    pub related_group_id: Option<i64>,
    pub related_user_id: Option<String>,
    pub created_at: String,
    pub read_at: Option<String>,
}

impl From<NotificationView> for NotificationResponse {
    fn from(value: NotificationView) -> Self {
        Self {
            id: value.id.get(),
            kind: value.kind.as_str().to_owned(),
            message: value.message,
            from_user: value.from_user.map(Into::into),
            related_group_id: value.related_group_id.map(|id| id.get()),
            related_user_id: value.related_user_id.map(|id| id.to_string()),
            created_at: value.created_at.to_rfc3339(),
            read_at: value.read_at.map(|at| at.to_rfc3339()),
        }
    }
}

/// Acknowledgement of a single notification.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MarkReadResponse {
    pub id: i64,
    /// First time the notification was read; repeat calls return it unchanged.
    pub read_at: String,
}

/// Acknowledgement of a whole inbox.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MarkAllReadResponse {
    /// Notifications that were unread before this call.
    pub count: u64,
    pub read_at: String,
}

impl From<MarkAllReadOutcome> for MarkAllReadResponse {
    fn from(value: MarkAllReadOutcome) -> Self {
        Self {
            count: value.count,
            read_at: value.read_at.to_rfc3339(),
        }
    }
}

/// Query parameters for listing the inbox.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct InboxQuery {
    /// Page size, clamped to 1..=100; defaults to 30.
    pub limit: Option<u32>,
    /// Only return notifications without a read time.
    pub unread_only: Option<bool>,
}

/// List the caller's notifications, newest first.
#[utoipa::path(
    get,
    path = "/api/v1/notifications",
    params(InboxQuery),
    responses(
        (status = 200, description = "Inbox page", body = [NotificationResponse]),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 503, description = "Service unavailable", body = ErrorSchema)
    ),
    tags = ["notifications"],
    operation_id = "listNotifications"
)]
#[get("/notifications")]
pub async fn list_notifications(
    state: web::Data<HttpState>,
    session: SessionContext,
    query: web::Query<InboxQuery>,
) -> ApiResult<web::Json<Vec<NotificationResponse>>> {
    let actor = session.require_user_id()?;
    let InboxQuery { limit, unread_only } = query.into_inner();
    let views = state
        .notifications_query
        .list_notifications(ListNotificationsRequest {
            actor,
            limit,
            unread_only: unread_only.unwrap_or(false),
        })
        .await?;
    Ok(web::Json(views.into_iter().map(Into::into).collect()))
}

/// Mark one of the caller's notifications read.
#[utoipa::path(
    post,
    path = "/api/v1/notifications/{id}/read",
    params(("id" = i64, Path, description = "Notification id")),
    responses(
        (status = 200, description = "Read time", body = MarkReadResponse),
        (status = 400, description = "Invalid notification id", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 404, description = "Not found in the caller's inbox", body = ErrorSchema)
    ),
    tags = ["notifications"],
    operation_id = "markNotificationRead"
)]
#[post("/notifications/{id}/read")]
pub async fn mark_read(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<MarkReadResponse>> {
    let actor = session.require_user_id()?;
    let id = NotificationId::new(parse_numeric_id(&path.into_inner(), NOTIFICATION_ID)?);
    let read_at = state.notifications.mark_read(&actor, id).await?;
    Ok(web::Json(MarkReadResponse {
        id: id.get(),
        read_at: read_at.to_rfc3339(),
    }))
}

/// Mark every unread notification in the caller's inbox read.
#[utoipa::path(
    post,
    path = "/api/v1/notifications/read-all",
    responses(
        (status = 200, description = "Rows stamped", body = MarkAllReadResponse),
        (status = 401, description = "Unauthorised", body = ErrorSchema)
    ),
    tags = ["notifications"],
    operation_id = "markAllNotificationsRead"
)]
#[post("/notifications/read-all")]
pub async fn mark_all_read(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<MarkAllReadResponse>> {
    let actor = session.require_user_id()?;
    let outcome = state.notifications.mark_all_read(&actor).await?;
    Ok(web::Json(outcome.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Error, GroupId, NotificationKind, UserId, UserSummary};
    use crate::inbound::http::test_utils::{MockPorts, signed_in_app};
    use actix_web::http::StatusCode;
    use actix_web::test as actix_test;
    use chrono::{TimeZone, Utc};
    use rstest::{fixture, rstest};
    use serde_json::{Value, json};

    #[fixture]
    fn actor() -> UserId {
        UserId::new("11111111-1111-1111-1111-111111111111").expect("actor id")
    }

    fn routes() -> actix_web::Scope {
        web::scope("/api/v1")
            .service(list_notifications)
            .service(mark_all_read)
            .service(mark_read)
    }

    #[rstest]
    #[case("/api/v1/notifications", None, false)]
    #[case("/api/v1/notifications?limit=5&unreadOnly=true", Some(5), true)]
    #[actix_web::test]
    async fn list_forwards_paging(
        actor: UserId,
        #[case] uri: &str,
        #[case] limit: Option<u32>,
        #[case] unread_only: bool,
    ) {
        let mut ports = MockPorts::default();
        ports
            .notifications_query
            .expect_list_notifications()
            .withf(move |request| request.limit == limit && request.unread_only == unread_only)
            .times(1)
            .returning(|_| Ok(Vec::new()));

        let app = actix_test::init_service(signed_in_app(ports, actor).service(routes())).await;
        let request = actix_test::TestRequest::get().uri(uri).to_request();
        let body: Value = actix_test::call_and_read_body_json(&app, request).await;
        assert_eq!(body, json!([]));
    }

    #[rstest]
    #[actix_web::test]
    async fn list_maps_views(actor: UserId) {
        let created = Utc
            .with_ymd_and_hms(2024, 3, 10, 9, 0, 0)
            .single()
            .expect("time");
        let sender = UserId::new("22222222-2222-2222-2222-222222222222").expect("sender id");
        let mut ports = MockPorts::default();
        ports
            .notifications_query
            .expect_list_notifications()
            .times(1)
            .returning(move |_| {
                Ok(vec![NotificationView {
                    id: NotificationId::new(3),
                    kind: NotificationKind::GroupJoinRequest,
                    message: "Grace asked to join Early birds".to_owned(),
                    from_user: Some(UserSummary {
                        id: sender,
                        display_name: "Grace".to_owned(),
                        avatar_url: None,
                    }),
                    related_group_id: Some(GroupId::new(7)),
                    related_user_id: Some(sender),
                    created_at: created,
                    read_at: None,
                }])
            });

        let app = actix_test::init_service(signed_in_app(ports, actor).service(routes())).await;
        let request = actix_test::TestRequest::get()
            .uri("/api/v1/notifications")
            .to_request();
        let body: Value = actix_test::call_and_read_body_json(&app, request).await;
        let entry = &body[0];
        assert_eq!(entry["kind"], "group_join_request");
        assert_eq!(entry["fromUser"]["displayName"], "Grace");
        assert_eq!(entry["relatedGroupId"], 7);
        assert!(entry["readAt"].is_null());
    }

    #[rstest]
    #[actix_web::test]
    async fn mark_read_returns_stamp(actor: UserId) {
        let read_at = Utc
            .with_ymd_and_hms(2024, 3, 10, 9, 5, 0)
            .single()
            .expect("time");
        let mut ports = MockPorts::default();
        ports
            .notifications
            .expect_mark_read()
            .withf(|_, id| *id == NotificationId::new(12))
            .times(1)
            .returning(move |_, _| Ok(read_at));

        let app = actix_test::init_service(signed_in_app(ports, actor).service(routes())).await;
        let request = actix_test::TestRequest::post()
            .uri("/api/v1/notifications/12/read")
            .to_request();
        let body: Value = actix_test::call_and_read_body_json(&app, request).await;
        assert_eq!(
            body,
            json!({"id": 12, "readAt": "2024-03-10T09:05:00+00:00"})
        );
    }

    #[rstest]
    #[actix_web::test]
    async fn foreign_notification_is_not_found(actor: UserId) {
        let mut ports = MockPorts::default();
        ports
            .notifications
            .expect_mark_read()
            .times(1)
            .returning(|_, _| Err(Error::not_found("notification 4 not found")));

        let app = actix_test::init_service(signed_in_app(ports, actor).service(routes())).await;
        let request = actix_test::TestRequest::post()
            .uri("/api/v1/notifications/4/read")
            .to_request();
        let response = actix_test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[rstest]
    #[actix_web::test]
    async fn read_all_reports_count(actor: UserId) {
        let read_at = Utc
            .with_ymd_and_hms(2024, 3, 10, 9, 5, 0)
            .single()
            .expect("time");
        let mut ports = MockPorts::default();
        ports
            .notifications
            .expect_mark_all_read()
            .times(1)
            .returning(move |_| Ok(MarkAllReadOutcome { count: 3, read_at }));

        let app = actix_test::init_service(signed_in_app(ports, actor).service(routes())).await;
        let request = actix_test::TestRequest::post()
            .uri("/api/v1/notifications/read-all")
            .to_request();
        let body: Value = actix_test::call_and_read_body_json(&app, request).await;
        assert_eq!(body["count"], 3);
    }
}
