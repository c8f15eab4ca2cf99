//! Group HTTP handlers.
//!
//! ```text
//! GET  /api/v1/groups
//! POST /api/v1/groups
//! POST /api/v1/groups/join
//! GET  /api/v1/groups/{id}
//! POST /api/v1/groups/{id}/name
//! POST /api/v1/groups/{id}/announcement
//! POST /api/v1/groups/{id}/invite-code
//! POST /api/v1/groups/{id}/members/{user}/approve
//! POST /api/v1/groups/{id}/members/{user}/reject
//! GET  /api/v1/groups/{id}/encouragements
//! POST /api/v1/groups/{id}/encourage
//! POST /api/v1/groups/{id}/remind
//! ```

use std::str::FromStr;

use actix_web::{HttpResponse, get, post, web};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::ports::{CreateGroupRequest, GroupEncourageRequest};
use crate::domain::{
    Error, GroupDetailView, GroupEncouragementView, GroupId, GroupMemberView, GroupPrivacy,
    GroupSummaryView,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::friends::{EncourageBody, UserSummaryResponse, parse_encourage_body};
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    ANNOUNCEMENT_MAX_CHARS, FieldName, GROUP_NAME_LENGTH, bounded_text, invalid_choice_error,
    missing_field_error, optional_text, parse_numeric_id, parse_user_id, required_text,
};

const GROUP_ID: FieldName = FieldName::new("id");
const USER_ID: FieldName = FieldName::new("user");
const NAME: FieldName = FieldName::new("name");
const PRIVACY: FieldName = FieldName::new("privacy");
const ANNOUNCEMENT: FieldName = FieldName::new("announcement");
const CODE_OR_ID: FieldName = FieldName::new("codeOrId");

/// Group list entry.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GroupSummaryResponse {
    pub id: i64,
    pub name: String,
    #[schema(example = "public")]
    pub privacy: String,
    pub requires_approval: bool,
    pub members_count: u32,
    /// Accepted members who have checked in on the caller's local today.
    pub active_today: u32,
    /// `none`, `pending` or `member`.
    #[schema(example = "member")]
    pub status: String,
}

impl From<GroupSummaryView> for GroupSummaryResponse {
    fn from(value: GroupSummaryView) -> Self {
        Self {
            id: value.id.get(),
            name: value.name,
            privacy: value.privacy.as_str().to_owned(),
            requires_approval: value.requires_approval,
            members_count: value.members_count,
            active_today: value.active_today,
            status: value.status.as_str().to_owned(),
        }
    }
}

/// Roster entry.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GroupMemberResponse {
    pub user: UserSummaryResponse,
    #[schema(example = "member")]
    pub role: String,
    pub checked_in_today: bool,
}

impl From<GroupMemberView> for GroupMemberResponse {
    fn from(value: GroupMemberView) -> Self {
        Self {
            user: value.user.into(),
            role: value.role.as_str().to_owned(),
            checked_in_today: value.checked_in_today,
        }
    }
}

/// Group detail as seen by the caller.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GroupDetailResponse {
    pub id: i64,
    pub name: String,
    pub privacy: String,
    pub requires_approval: bool,
    pub announcement: Option<String>,
    pub status: String,
    pub members: Vec<GroupMemberResponse>,
    /// Present only for accepted members of private groups.
    pub join_code: Option<String>,
}

impl From<GroupDetailView> for GroupDetailResponse {
    fn from(value: GroupDetailView) -> Self {
        Self {
            id: value.id.get(),
            name: value.name,
            privacy: value.privacy.as_str().to_owned(),
            requires_approval: value.requires_approval,
            announcement: value.announcement,
            status: value.status.as_str().to_owned(),
            members: value.members.into_iter().map(Into::into).collect(),
            join_code: value.join_code,
        }
    }
}

/// Encouragement wall entry.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GroupEncouragementResponse {
    pub id: i64,
    pub author_name: String,
    #[schema(example = "💪 keep going")]
    pub text: String,
    pub created_at: String,
}

impl From<GroupEncouragementView> for GroupEncouragementResponse {
    fn from(value: GroupEncouragementView) -> Self {
        Self {
            id: value.id.get(),
            author_name: value.author_name,
            text: value.text,
            created_at: value.created_at.to_rfc3339(),
        }
    }
}

/// Request payload for creating a group.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateGroupBody {
    pub name: Option<String>,
    /// `public` (default) or `private`.
    pub privacy: Option<String>,
    pub requires_approval: Option<bool>,
}

/// Request payload for joining by numeric id or join code.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct JoinGroupBody {
    #[schema(example = "7KQ2MX")]
    pub code_or_id: Option<String>,
}

/// Request payload for renaming a group.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GroupNameBody {
    pub name: Option<String>,
}

/// Request payload for replacing the announcement; blank clears it.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnnouncementBody {
    pub announcement: Option<String>,
}

/// Query parameters for the encouragement wall.
#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct WallQuery {
    /// Page size, clamped to 1..=100; defaults to 20.
    pub limit: Option<u32>,
}

fn parse_group_id(raw: &str) -> Result<GroupId, Error> {
    parse_numeric_id(raw, GROUP_ID).map(GroupId::new)
}

fn parse_privacy(raw: Option<String>) -> Result<GroupPrivacy, Error> {
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(GroupPrivacy::Public),
        Some(value) => GroupPrivacy::from_str(value)
            .map_err(|_| invalid_choice_error(PRIVACY, value, "public, private")),
    }
}

fn parse_create_group(body: CreateGroupBody) -> Result<(String, GroupPrivacy, bool), Error> {
    let name = body.name.ok_or_else(|| missing_field_error(NAME))?;
    Ok((
        bounded_text(&name, NAME, GROUP_NAME_LENGTH)?,
        parse_privacy(body.privacy)?,
        body.requires_approval.unwrap_or(false),
    ))
}

/// List groups visible to the caller with their membership status.
#[utoipa::path(
    get,
    path = "/api/v1/groups",
    responses(
        (status = 200, description = "Group list", body = [GroupSummaryResponse]),
        (status = 401, description = "Unauthorised", body = ErrorSchema)
    ),
    tags = ["groups"],
    operation_id = "listGroups"
)]
#[get("/groups")]
pub async fn list_groups(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<Vec<GroupSummaryResponse>>> {
    let actor = session.require_user_id()?;
    let groups = state.groups_query.list_groups(&actor).await?;
    Ok(web::Json(groups.into_iter().map(Into::into).collect()))
}

/// Create a group owned by the caller.
#[utoipa::path(
    post,
    path = "/api/v1/groups",
    request_body = CreateGroupBody,
    responses(
        (status = 201, description = "Created group", body = GroupDetailResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema)
    ),
    tags = ["groups"],
    operation_id = "createGroup"
)]
#[post("/groups")]
pub async fn create_group(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<CreateGroupBody>,
) -> ApiResult<HttpResponse> {
    let actor = session.require_user_id()?;
    let (name, privacy, requires_approval) = parse_create_group(payload.into_inner())?;
    let detail = state
        .groups
        .create_group(CreateGroupRequest {
            actor,
            name,
            privacy,
            requires_approval,
        })
        .await?;
    Ok(HttpResponse::Created().json(GroupDetailResponse::from(detail)))
}

/// Join a group by numeric id or join code.
#[utoipa::path(
    post,
    path = "/api/v1/groups/join",
    request_body = JoinGroupBody,
    responses(
        (status = 200, description = "Membership after joining", body = GroupDetailResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Private group needs its join code", body = ErrorSchema),
        (status = 404, description = "No matching group", body = ErrorSchema),
        (status = 409, description = "Request already pending", body = ErrorSchema),
        (
            status = 429,
            description = "Rejected recently; retry later",
            headers(("Retry-After" = String, description = "Seconds until a new request is accepted")),
            body = ErrorSchema
        )
    ),
    tags = ["groups"],
    operation_id = "joinGroup"
)]
#[post("/groups/join")]
pub async fn join_group(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<JoinGroupBody>,
) -> ApiResult<web::Json<GroupDetailResponse>> {
    let actor = session.require_user_id()?;
    let raw = payload
        .into_inner()
        .code_or_id
        .ok_or_else(|| missing_field_error(CODE_OR_ID))?;
    let code_or_id = required_text(&raw, CODE_OR_ID)?;
    let detail = state.groups.join_group(&actor, &code_or_id).await?;
    Ok(web::Json(detail.into()))
}

/// Fetch a group; roster and announcement are withheld from outsiders of
/// private groups.
#[utoipa::path(
    get,
    path = "/api/v1/groups/{id}",
    params(("id" = i64, Path, description = "Group id")),
    responses(
        (status = 200, description = "Group detail", body = GroupDetailResponse),
        (status = 400, description = "Invalid group id", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 404, description = "Group not found", body = ErrorSchema)
    ),
    tags = ["groups"],
    operation_id = "getGroup"
)]
#[get("/groups/{id}")]
pub async fn get_group(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<GroupDetailResponse>> {
    let actor = session.require_user_id()?;
    let group = parse_group_id(&path.into_inner())?;
    let detail = state.groups_query.group_detail(&actor, group).await?;
    Ok(web::Json(detail.into()))
}

/// Rename a group; owner or admin only.
#[utoipa::path(
    post,
    path = "/api/v1/groups/{id}/name",
    params(("id" = i64, Path, description = "Group id")),
    request_body = GroupNameBody,
    responses(
        (status = 200, description = "Updated group", body = GroupDetailResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Caller cannot manage the group", body = ErrorSchema),
        (status = 404, description = "Group not found", body = ErrorSchema)
    ),
    tags = ["groups"],
    operation_id = "renameGroup"
)]
#[post("/groups/{id}/name")]
pub async fn update_name(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    payload: web::Json<GroupNameBody>,
) -> ApiResult<web::Json<GroupDetailResponse>> {
    let actor = session.require_user_id()?;
    let group = parse_group_id(&path.into_inner())?;
    let raw = payload
        .into_inner()
        .name
        .ok_or_else(|| missing_field_error(NAME))?;
    let name = bounded_text(&raw, NAME, GROUP_NAME_LENGTH)?;
    let detail = state.groups.update_name(&actor, group, name).await?;
    Ok(web::Json(detail.into()))
}

/// Replace or clear the announcement; owner or admin only.
#[utoipa::path(
    post,
    path = "/api/v1/groups/{id}/announcement",
    params(("id" = i64, Path, description = "Group id")),
    request_body = AnnouncementBody,
    responses(
        (status = 200, description = "Updated group", body = GroupDetailResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Caller cannot manage the group", body = ErrorSchema),
        (status = 404, description = "Group not found", body = ErrorSchema)
    ),
    tags = ["groups"],
    operation_id = "updateGroupAnnouncement"
)]
#[post("/groups/{id}/announcement")]
pub async fn update_announcement(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    payload: web::Json<AnnouncementBody>,
) -> ApiResult<web::Json<GroupDetailResponse>> {
    let actor = session.require_user_id()?;
    let group = parse_group_id(&path.into_inner())?;
    let announcement = optional_text(
        payload.announcement.as_deref(),
        ANNOUNCEMENT,
        ANNOUNCEMENT_MAX_CHARS,
    )?;
    let detail = state
        .groups
        .update_announcement(&actor, group, announcement)
        .await?;
    Ok(web::Json(detail.into()))
}

/// Issue a fresh join code, invalidating the old one.
#[utoipa::path(
    post,
    path = "/api/v1/groups/{id}/invite-code",
    params(("id" = i64, Path, description = "Group id")),
    responses(
        (status = 200, description = "Group with its new join code", body = GroupDetailResponse),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Caller cannot manage the group", body = ErrorSchema),
        (status = 404, description = "Group not found", body = ErrorSchema),
        (status = 503, description = "No free join code", body = ErrorSchema)
    ),
    tags = ["groups"],
    operation_id = "rotateGroupInviteCode"
)]
#[post("/groups/{id}/invite-code")]
pub async fn rotate_invite_code(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<GroupDetailResponse>> {
    let actor = session.require_user_id()?;
    let group = parse_group_id(&path.into_inner())?;
    let detail = state.groups.rotate_invite_code(&actor, group).await?;
    Ok(web::Json(detail.into()))
}

/// Approve a pending join request.
#[utoipa::path(
    post,
    path = "/api/v1/groups/{id}/members/{user}/approve",
    params(
        ("id" = i64, Path, description = "Group id"),
        ("user" = String, Path, description = "Applicant user id")
    ),
    responses(
        (status = 200, description = "Updated group", body = GroupDetailResponse),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Caller cannot manage the group", body = ErrorSchema),
        (status = 404, description = "No pending request", body = ErrorSchema)
    ),
    tags = ["groups"],
    operation_id = "approveGroupMember"
)]
#[post("/groups/{id}/members/{user}/approve")]
pub async fn approve_member(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<(String, String)>,
) -> ApiResult<web::Json<GroupDetailResponse>> {
    let actor = session.require_user_id()?;
    let (group, applicant) = path.into_inner();
    let group = parse_group_id(&group)?;
    let applicant = parse_user_id(&applicant, USER_ID)?;
    let detail = state.groups.approve_member(&actor, group, &applicant).await?;
    Ok(web::Json(detail.into()))
}

/// Decline a pending join request.
#[utoipa::path(
    post,
    path = "/api/v1/groups/{id}/members/{user}/reject",
    params(
        ("id" = i64, Path, description = "Group id"),
        ("user" = String, Path, description = "Applicant user id")
    ),
    responses(
        (status = 200, description = "Updated group", body = GroupDetailResponse),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Caller cannot manage the group", body = ErrorSchema),
        (status = 404, description = "No pending request", body = ErrorSchema)
    ),
    tags = ["groups"],
    operation_id = "rejectGroupMember"
)]
#[post("/groups/{id}/members/{user}/reject")]
pub async fn reject_member(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<(String, String)>,
) -> ApiResult<web::Json<GroupDetailResponse>> {
    let actor = session.require_user_id()?;
    let (group, applicant) = path.into_inner();
    let group = parse_group_id(&group)?;
    let applicant = parse_user_id(&applicant, USER_ID)?;
    let detail = state.groups.reject_member(&actor, group, &applicant).await?;
    Ok(web::Json(detail.into()))
}

/// Read the encouragement wall, newest first.
#[utoipa::path(
    get,
    path = "/api/v1/groups/{id}/encouragements",
    params(("id" = i64, Path, description = "Group id"), WallQuery),
    responses(
        (status = 200, description = "Wall entries", body = [GroupEncouragementResponse]),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Members only", body = ErrorSchema),
        (status = 404, description = "Group not found", body = ErrorSchema)
    ),
    tags = ["groups"],
    operation_id = "listGroupEncouragements"
)]
#[get("/groups/{id}/encouragements")]
pub async fn list_encouragements(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    query: web::Query<WallQuery>,
) -> ApiResult<web::Json<Vec<GroupEncouragementResponse>>> {
    let actor = session.require_user_id()?;
    let group = parse_group_id(&path.into_inner())?;
    let entries = state
        .groups_query
        .list_encouragements(&actor, group, query.limit)
        .await?;
    Ok(web::Json(entries.into_iter().map(Into::into).collect()))
}

/// Post to the wall and notify the other members.
#[utoipa::path(
    post,
    path = "/api/v1/groups/{id}/encourage",
    params(("id" = i64, Path, description = "Group id")),
    request_body = EncourageBody,
    responses(
        (status = 204, description = "Encouragement posted"),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Members only", body = ErrorSchema),
        (status = 404, description = "Group not found", body = ErrorSchema)
    ),
    tags = ["groups"],
    operation_id = "encourageGroup"
)]
#[post("/groups/{id}/encourage")]
pub async fn encourage_group(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    payload: web::Json<EncourageBody>,
) -> ApiResult<HttpResponse> {
    let actor = session.require_user_id()?;
    let group = parse_group_id(&path.into_inner())?;
    let content = parse_encourage_body(payload.into_inner())?;
    state
        .groups
        .encourage_group(GroupEncourageRequest {
            actor,
            group,
            emoji: content.emoji,
            message: content.message,
        })
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Remind every other member of the group to check in.
#[utoipa::path(
    post,
    path = "/api/v1/groups/{id}/remind",
    params(("id" = i64, Path, description = "Group id")),
    responses(
        (status = 204, description = "Reminders sent"),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Members only", body = ErrorSchema),
        (status = 404, description = "Group not found", body = ErrorSchema)
    ),
    tags = ["groups"],
    operation_id = "remindGroup"
)]
#[post("/groups/{id}/remind")]
pub async fn remind_group(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let actor = session.require_user_id()?;
    let group = parse_group_id(&path.into_inner())?;
    state.groups.remind_group(&actor, group).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[cfg(test)]
#[path = "groups_tests.rs"]
mod tests;
