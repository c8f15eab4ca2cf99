//! Friendship HTTP handlers.
//!
//! ```text
//! POST /api/v1/friends/request
//! POST /api/v1/friends/accept
//! GET  /api/v1/friends
//! GET  /api/v1/friends/{id}
//! GET  /api/v1/friends/{id}/permission
//! POST /api/v1/friends/{id}/permission
//! POST /api/v1/friends/{id}/remind
//! POST /api/v1/friends/{id}/encourage
//! ```

use actix_web::{HttpResponse, get, post, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::ports::{EncourageFriendRequest, FriendRequest};
use crate::domain::{
    Error, FriendDetailView, FriendPermission, FriendPermissionPatch, FriendView, RemindOutcome,
    UserSummary,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    EMOJI_LENGTH, FieldName, MESSAGE_MAX_CHARS, bounded_text, missing_field_error,
    optional_text, parse_user_id, required_text,
};

const PHONE: FieldName = FieldName::new("phone");
const MESSAGE: FieldName = FieldName::new("message");
const REQUESTER_ID: FieldName = FieldName::new("requesterId");
const FRIEND_ID: FieldName = FieldName::new("id");
const EMOJI: FieldName = FieldName::new("emoji");

/// Public identity of another user.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserSummaryResponse {
    pub id: String,
    pub display_name: String,
    pub avatar_url: Option<String>,
}

impl From<UserSummary> for UserSummaryResponse {
    fn from(value: UserSummary) -> Self {
        Self {
            id: value.id.to_string(),
            display_name: value.display_name,
            avatar_url: value.avatar_url,
        }
    }
}

/// Friend list entry.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FriendResponse {
    pub user: UserSummaryResponse,
    /// `pending_out`, `pending_in` or `accepted`.
    #[schema(example = "accepted")]
    pub status: String,
    pub message: Option<String>,
    pub checked_in_today: bool,
    pub streak_days: u32,
}

impl From<FriendView> for FriendResponse {
    fn from(value: FriendView) -> Self {
        Self {
            user: value.user.into(),
            status: value.status.as_str().to_owned(),
            message: value.message,
            checked_in_today: value.checked_in_today,
            streak_days: value.streak_days,
        }
    }
}

/// Directed permission settings the caller holds about a friend.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PermissionResponse {
    pub can_view_detail: bool,
    pub can_remind: bool,
}

impl From<FriendPermission> for PermissionResponse {
    fn from(value: FriendPermission) -> Self {
        Self {
            can_view_detail: value.can_view_detail,
            can_remind: value.can_remind,
        }
    }
}

/// Friend entry enriched with contact details and permissions.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FriendDetailResponse {
    pub friend: FriendResponse,
    pub phone: String,
    pub permission: PermissionResponse,
    pub last_checkin_at: Option<String>,
}

impl From<FriendDetailView> for FriendDetailResponse {
    fn from(value: FriendDetailView) -> Self {
        Self {
            friend: value.friend.into(),
            phone: value.phone,
            permission: value.permission.into(),
            last_checkin_at: value.last_checkin_at.map(|at| at.to_rfc3339()),
        }
    }
}

/// Result of a reminder attempt.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RemindResponse {
    pub sent: bool,
    /// True when a reminder for the same local day already existed.
    pub limited: bool,
}

impl From<RemindOutcome> for RemindResponse {
    fn from(value: RemindOutcome) -> Self {
        Self {
            sent: value.sent,
            limited: value.limited,
        }
    }
}

/// Request payload for sending a friend request.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FriendRequestBody {
    pub phone: Option<String>,
    pub message: Option<String>,
}

/// Request payload for accepting a pending request.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AcceptFriendBody {
    pub requester_id: Option<String>,
}

/// Partial permission update; omitted fields keep their stored value.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PermissionPatchBody {
    pub can_view_detail: Option<bool>,
    pub can_remind: Option<bool>,
}

/// Request payload for encouraging a friend or a group.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EncourageBody {
    #[schema(example = "💪")]
    pub emoji: Option<String>,
    pub message: Option<String>,
}

/// Validated encouragement content shared with the group handlers.
pub(crate) struct EncouragementContent {
    pub(crate) emoji: String,
    pub(crate) message: Option<String>,
}

pub(crate) fn parse_encourage_body(body: EncourageBody) -> Result<EncouragementContent, Error> {
    let emoji = body.emoji.ok_or_else(|| missing_field_error(EMOJI))?;
    Ok(EncouragementContent {
        emoji: bounded_text(&emoji, EMOJI, EMOJI_LENGTH)?,
        message: optional_text(body.message.as_deref(), MESSAGE, MESSAGE_MAX_CHARS)?,
    })
}

fn parse_friend_request(body: FriendRequestBody) -> Result<(String, Option<String>), Error> {
    let phone = body.phone.ok_or_else(|| missing_field_error(PHONE))?;
    Ok((
        required_text(&phone, PHONE)?,
        optional_text(body.message.as_deref(), MESSAGE, MESSAGE_MAX_CHARS)?,
    ))
}

/// Send a friend request to the user registered with `phone`.
#[utoipa::path(
    post,
    path = "/api/v1/friends/request",
    request_body = FriendRequestBody,
    responses(
        (status = 200, description = "Pending or accepted friendship", body = FriendResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 404, description = "No user with that phone", body = ErrorSchema),
        (status = 409, description = "Already friends, pending or blocked", body = ErrorSchema)
    ),
    tags = ["friends"],
    operation_id = "requestFriend"
)]
#[post("/friends/request")]
pub async fn request_friend(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<FriendRequestBody>,
) -> ApiResult<web::Json<FriendResponse>> {
    let actor = session.require_user_id()?;
    let (target_phone, message) = parse_friend_request(payload.into_inner())?;
    let view = state
        .friendships
        .request_friend(FriendRequest {
            actor,
            target_phone,
            message,
        })
        .await?;
    Ok(web::Json(view.into()))
}

/// Accept a pending request addressed to the caller.
#[utoipa::path(
    post,
    path = "/api/v1/friends/accept",
    request_body = AcceptFriendBody,
    responses(
        (status = 200, description = "Accepted friendship", body = FriendResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 404, description = "No pending request from that user", body = ErrorSchema)
    ),
    tags = ["friends"],
    operation_id = "acceptFriend"
)]
#[post("/friends/accept")]
pub async fn accept_friend(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<AcceptFriendBody>,
) -> ApiResult<web::Json<FriendResponse>> {
    let actor = session.require_user_id()?;
    let raw = payload
        .into_inner()
        .requester_id
        .ok_or_else(|| missing_field_error(REQUESTER_ID))?;
    let requester = parse_user_id(&raw, REQUESTER_ID)?;
    let view = state.friendships.accept_friend(&actor, &requester).await?;
    Ok(web::Json(view.into()))
}

/// List the caller's accepted and pending relationships.
#[utoipa::path(
    get,
    path = "/api/v1/friends",
    responses(
        (status = 200, description = "Friend list", body = [FriendResponse]),
        (status = 401, description = "Unauthorised", body = ErrorSchema)
    ),
    tags = ["friends"],
    operation_id = "listFriends"
)]
#[get("/friends")]
pub async fn list_friends(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<Vec<FriendResponse>>> {
    let actor = session.require_user_id()?;
    let friends = state.friendships_query.list_friends(&actor).await?;
    Ok(web::Json(friends.into_iter().map(Into::into).collect()))
}

/// Fetch one friend with the caller's own permission settings toward them.
#[utoipa::path(
    get,
    path = "/api/v1/friends/{id}",
    params(("id" = String, Path, description = "Friend user id")),
    responses(
        (status = 200, description = "Friend detail", body = FriendDetailResponse),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 404, description = "Not friends", body = ErrorSchema)
    ),
    tags = ["friends"],
    operation_id = "getFriend"
)]
#[get("/friends/{id}")]
pub async fn get_friend(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<FriendDetailResponse>> {
    let actor = session.require_user_id()?;
    let friend = parse_user_id(&path.into_inner(), FRIEND_ID)?;
    let detail = state.friendships_query.friend_detail(&actor, &friend).await?;
    Ok(web::Json(detail.into()))
}

/// Read the caller's permission settings about a friend.
#[utoipa::path(
    get,
    path = "/api/v1/friends/{id}/permission",
    params(("id" = String, Path, description = "Friend user id")),
    responses(
        (status = 200, description = "Permission settings", body = PermissionResponse),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 404, description = "Not friends", body = ErrorSchema)
    ),
    tags = ["friends"],
    operation_id = "getFriendPermission"
)]
#[get("/friends/{id}/permission")]
pub async fn get_permission(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<PermissionResponse>> {
    let actor = session.require_user_id()?;
    let friend = parse_user_id(&path.into_inner(), FRIEND_ID)?;
    let permission = state.friendships_query.permission(&actor, &friend).await?;
    Ok(web::Json(permission.into()))
}

/// Update the caller's permission settings about a friend.
#[utoipa::path(
    post,
    path = "/api/v1/friends/{id}/permission",
    params(("id" = String, Path, description = "Friend user id")),
    request_body = PermissionPatchBody,
    responses(
        (status = 200, description = "Updated permission settings", body = PermissionResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 404, description = "Not friends", body = ErrorSchema)
    ),
    tags = ["friends"],
    operation_id = "updateFriendPermission"
)]
#[post("/friends/{id}/permission")]
pub async fn update_permission(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    payload: web::Json<PermissionPatchBody>,
) -> ApiResult<web::Json<PermissionResponse>> {
    let actor = session.require_user_id()?;
    let friend = parse_user_id(&path.into_inner(), FRIEND_ID)?;
    let PermissionPatchBody {
        can_view_detail,
        can_remind,
    } = payload.into_inner();
    let permission = state
        .friendships
        .update_permission(
            &actor,
            &friend,
            FriendPermissionPatch {
                can_view_detail,
                can_remind,
            },
        )
        .await?;
    Ok(web::Json(permission.into()))
}

/// Remind a friend to check in; at most once per local day.
#[utoipa::path(
    post,
    path = "/api/v1/friends/{id}/remind",
    params(("id" = String, Path, description = "Friend user id")),
    responses(
        (status = 200, description = "Reminder outcome", body = RemindResponse),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Friend does not accept reminders", body = ErrorSchema),
        (status = 404, description = "Not friends", body = ErrorSchema)
    ),
    tags = ["friends"],
    operation_id = "remindFriend"
)]
#[post("/friends/{id}/remind")]
pub async fn remind_friend(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<RemindResponse>> {
    let actor = session.require_user_id()?;
    let friend = parse_user_id(&path.into_inner(), FRIEND_ID)?;
    let outcome = state.interactions.remind_friend(&actor, &friend).await?;
    Ok(web::Json(outcome.into()))
}

/// Send an emoji encouragement to a friend.
#[utoipa::path(
    post,
    path = "/api/v1/friends/{id}/encourage",
    params(("id" = String, Path, description = "Friend user id")),
    request_body = EncourageBody,
    responses(
        (status = 204, description = "Encouragement sent"),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 404, description = "Not friends", body = ErrorSchema)
    ),
    tags = ["friends"],
    operation_id = "encourageFriend"
)]
#[post("/friends/{id}/encourage")]
pub async fn encourage_friend(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    payload: web::Json<EncourageBody>,
) -> ApiResult<HttpResponse> {
    let actor = session.require_user_id()?;
    let friend = parse_user_id(&path.into_inner(), FRIEND_ID)?;
    let content = parse_encourage_body(payload.into_inner())?;
    state
        .interactions
        .encourage_friend(EncourageFriendRequest {
            actor,
            friend,
            emoji: content.emoji,
            message: content.message,
        })
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

#[cfg(test)]
#[path = "friends_tests.rs"]
mod tests;
