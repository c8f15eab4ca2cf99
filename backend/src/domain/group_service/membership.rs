//! Group creation, joining and join request decisions.

use serde_json::json;
use tracing::{info, warn};

use super::{GroupService, map_group_error};
use crate::domain::ports::{
    CheckinOracle, CreateGroupRequest, GroupRepository, GroupRepositoryError, JoinDecision,
    JoinResolution, MembershipSnapshot, MembershipTransition, UserDirectory,
};
use crate::domain::{
    DEFAULT_ANNOUNCEMENT, Error, Group, GroupDetailView, GroupId, GroupMember, GroupPrivacy,
    JOIN_CODE_MAX_ATTEMPTS, JoinCode, JOIN_APPROVED_BY_YOU, JOIN_DECLINED_BY_YOU, ManagerNotice,
    MemberRole, MemberStatus, MembershipLabel, NewGroup, NewNotification, NotificationKind,
    Supersede, UserId, join_apply_cooldown, messages,
};

impl<G, U, C> GroupService<G, U, C>
where
    G: GroupRepository,
    U: UserDirectory,
    C: CheckinOracle,
{
    pub(super) async fn create(
        &self,
        request: CreateGroupRequest,
    ) -> Result<GroupDetailView, Error> {
        let name = request.name.trim().to_owned();
        if name.is_empty() {
            return Err(Error::invalid_request("group name must not be empty"));
        }
        let requires_approval =
            request.privacy == GroupPrivacy::Public && request.requires_approval;

        for attempt in 1..=JOIN_CODE_MAX_ATTEMPTS {
            let draft = NewGroup {
                name: name.clone(),
                privacy: request.privacy,
                requires_approval,
                join_code: JoinCode::generate(),
                owner: request.actor,
                announcement: Some(DEFAULT_ANNOUNCEMENT.to_owned()),
                created_at: self.calendar.now(),
            };
            match self.groups.create_group(&draft).await {
                Ok(group) => {
                    info!(group_id = %group.id, owner = %request.actor, "group created");
                    return self.detail(&request.actor, &group).await;
                }
                Err(GroupRepositoryError::JoinCodeTaken { code }) => {
                    warn!(attempt, code = %code, "join code collision on create; regenerating");
                }
                Err(err) => return Err(map_group_error(err)),
            }
        }
        Err(Error::internal("could not allocate a unique join code"))
    }

    /// Resolve `raw` to a group: a join code match wins over a numeric id.
    ///
    /// Every six-digit code also parses as a group id, so trying the id first
    /// would send a holder of one group's code to whichever group happens to
    /// own that number.
    async fn find_joinable(&self, raw: &str) -> Result<Group, Error> {
        if let Some(code) = JoinCode::parse(raw) {
            let by_code = self
                .groups
                .find_by_join_code(&code)
                .await
                .map_err(map_group_error)?;
            if let Some(group) = by_code {
                return Ok(group);
            }
        }
        let Ok(id) = raw.parse::<i64>() else {
            return Err(Error::not_found("group not found"));
        };
        self.groups
            .find_by_id(GroupId::new(id))
            .await
            .map_err(map_group_error)?
            .ok_or_else(|| Error::not_found("group not found"))
    }

    pub(super) async fn join(
        &self,
        actor: &UserId,
        code_or_id: &str,
    ) -> Result<GroupDetailView, Error> {
        let raw = code_or_id.trim();
        if raw.is_empty() {
            return Err(Error::invalid_request("a join code or group id is required"));
        }
        let group = self.find_joinable(raw).await?;
        if group.is_private() && !group.code_matches(raw) {
            return Err(Error::forbidden("a valid join code is required for this group"));
        }

        let existing = self.membership(group.id, actor).await?;
        if existing.as_ref().is_some_and(GroupMember::is_accepted) {
            return self.detail(actor, &group).await;
        }

        let now = self.calendar.now();
        let applicant_name = self.display_name_of(actor).await?;
        let expected = existing.as_ref().map(MembershipSnapshot::from);
        let role = existing.as_ref().map_or(MemberRole::Member, |row| row.role);

        if group.join_needs_approval() {
            if let Some(row) = existing
                .as_ref()
                .filter(|row| row.status == MemberStatus::Pending)
            {
                let elapsed = now - row.requested_at;
                if elapsed < join_apply_cooldown() {
                    let retry_after = (join_apply_cooldown() - elapsed).num_seconds().max(1);
                    return Err(Error::too_many_requests(
                        "a join request is already pending, try again later",
                    )
                    .with_details(json!({ "retryAfterSeconds": retry_after })));
                }
            }

            let transition = MembershipTransition {
                expected,
                next: GroupMember {
                    group_id: group.id,
                    user_id: *actor,
                    role,
                    status: MemberStatus::Pending,
                    requested_at: now,
                    approved_at: None,
                },
                notice: ManagerNotice {
                    actor: *actor,
                    kind: NotificationKind::GroupJoinRequest,
                    message: messages::join_request(&applicant_name, &group.name),
                    exclude_actor: true,
                    created_at: now,
                },
            };
            self.groups
                .apply_membership(&transition)
                .await
                .map_err(map_group_error)?;
            return Ok(pending_view(&group));
        }

        let transition = MembershipTransition {
            expected,
            next: GroupMember {
                group_id: group.id,
                user_id: *actor,
                role,
                status: MemberStatus::Accepted,
                requested_at: now,
                approved_at: Some(now),
            },
            notice: ManagerNotice {
                actor: *actor,
                kind: NotificationKind::GroupJoined,
                message: messages::joined(&applicant_name, &group.name),
                exclude_actor: true,
                created_at: now,
            },
        };
        self.groups
            .apply_membership(&transition)
            .await
            .map_err(map_group_error)?;
        self.detail(actor, &group).await
    }

    pub(super) async fn resolve(
        &self,
        actor: &UserId,
        group_id: GroupId,
        applicant: &UserId,
        decision: JoinDecision,
    ) -> Result<GroupDetailView, Error> {
        let group = self.load_group(group_id).await?;
        self.require_manager(group.id, actor).await?;

        let now = self.calendar.now();
        let (kind, admin_message, applicant_message) = match decision {
            JoinDecision::Approve => (
                NotificationKind::GroupJoinApproved,
                JOIN_APPROVED_BY_YOU,
                messages::join_approved(&group.name),
            ),
            JoinDecision::Reject => (
                NotificationKind::GroupJoinRejected,
                JOIN_DECLINED_BY_YOU,
                messages::join_rejected(&group.name),
            ),
        };
        let resolution = JoinResolution {
            group_id: group.id,
            applicant: *applicant,
            admin: *actor,
            decision,
            decided_at: now,
            admin_notice: Supersede {
                kind,
                message: admin_message.to_owned(),
                read_at: now,
            },
            applicant_notification: NewNotification {
                recipient: *applicant,
                actor: Some(*actor),
                related_group: Some(group.id),
                related_user: Some(*actor),
                kind,
                message: applicant_message,
                created_at: now,
            },
        };

        let resolved = self
            .groups
            .resolve_join_request(&resolution)
            .await
            .map_err(map_group_error)?;
        if !resolved {
            return Err(Error::not_found("join request not found"));
        }
        info!(
            group_id = %group.id,
            applicant = %applicant,
            admin = %actor,
            ?decision,
            "join request resolved"
        );
        self.detail(actor, &group).await
    }
}

/// What an applicant sees while their request awaits a decision.
fn pending_view(group: &Group) -> GroupDetailView {
    GroupDetailView {
        id: group.id,
        name: group.name.clone(),
        privacy: group.privacy,
        requires_approval: group.requires_approval,
        announcement: if group.is_private() {
            None
        } else {
            group.announcement.clone()
        },
        status: MembershipLabel::Pending,
        members: Vec::new(),
        join_code: None,
    }
}
