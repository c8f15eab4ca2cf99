//! Group, membership and group wall storage.

use async_trait::async_trait;

use super::{InMemorySocialStore, State};
use crate::domain::ports::{
    GroupRepository, GroupRepositoryError, GroupUpdate, JoinDecision, JoinResolution,
    MembershipSnapshot, MembershipTransition,
};
use crate::domain::{
    EncouragementId, Group, GroupEncouragement, GroupId, GroupMember, GroupReminder, JoinCode,
    MemberStatus, NewGroup, NewGroupEncouragement, NewNotification, NotificationKind, UserId,
};

impl State {
    fn code_taken(&self, code: &JoinCode, except: Option<GroupId>) -> bool {
        self.groups
            .values()
            .any(|group| group.join_code == *code && Some(group.id) != except)
    }

    fn accepted_managers(&self, group: GroupId) -> Vec<UserId> {
        self.members
            .values()
            .filter(|member| member.group_id == group && member.is_accepted_manager())
            .map(|member| member.user_id)
            .collect()
    }
}

#[async_trait]
impl GroupRepository for InMemorySocialStore {
    async fn find_by_id(&self, id: GroupId) -> Result<Option<Group>, GroupRepositoryError> {
        let state = self.lock().map_err(GroupRepositoryError::query)?;
        Ok(state.groups.get(&id).cloned())
    }

    async fn find_by_join_code(
        &self,
        code: &JoinCode,
    ) -> Result<Option<Group>, GroupRepositoryError> {
        let state = self.lock().map_err(GroupRepositoryError::query)?;
        Ok(state
            .groups
            .values()
            .find(|group| group.join_code == *code)
            .cloned())
    }

    async fn list_all(&self) -> Result<Vec<Group>, GroupRepositoryError> {
        let state = self.lock().map_err(GroupRepositoryError::query)?;
        let mut groups: Vec<Group> = state.groups.values().cloned().collect();
        groups.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(groups)
    }

    async fn create_group(&self, group: &NewGroup) -> Result<Group, GroupRepositoryError> {
        let mut state = self.lock().map_err(GroupRepositoryError::query)?;
        if state.code_taken(&group.join_code, None) {
            return Err(GroupRepositoryError::join_code_taken(group.join_code.as_str()));
        }
        let id = GroupId::new(state.next_id());
        let created = Group {
            id,
            name: group.name.clone(),
            privacy: group.privacy,
            requires_approval: group.requires_approval,
            join_code: group.join_code.clone(),
            owner: group.owner,
            announcement: group.announcement.clone(),
            created_at: group.created_at,
        };
        state.groups.insert(id, created.clone());
        state.members.insert(
            (id, group.owner),
            GroupMember::owner(id, group.owner, group.created_at),
        );
        Ok(created)
    }

    async fn update_group(
        &self,
        id: GroupId,
        update: &GroupUpdate,
    ) -> Result<Option<Group>, GroupRepositoryError> {
        let mut guard = self.lock().map_err(GroupRepositoryError::query)?;
        let state = &mut *guard;
        if let GroupUpdate::JoinCode(code) = update {
            if state.code_taken(code, Some(id)) {
                return Err(GroupRepositoryError::join_code_taken(code.as_str()));
            }
        }
        let Some(group) = state.groups.get_mut(&id) else {
            return Ok(None);
        };
        match update {
            GroupUpdate::Name(name) => group.name.clone_from(name),
            GroupUpdate::Announcement(announcement) => group.announcement.clone_from(announcement),
            GroupUpdate::JoinCode(code) => group.join_code = code.clone(),
        }
        Ok(Some(group.clone()))
    }

    async fn membership(
        &self,
        group: GroupId,
        user: &UserId,
    ) -> Result<Option<GroupMember>, GroupRepositoryError> {
        let state = self.lock().map_err(GroupRepositoryError::query)?;
        Ok(state.members.get(&(group, *user)).cloned())
    }

    async fn memberships_of(
        &self,
        user: &UserId,
    ) -> Result<Vec<GroupMember>, GroupRepositoryError> {
        let state = self.lock().map_err(GroupRepositoryError::query)?;
        Ok(state
            .members
            .values()
            .filter(|member| member.user_id == *user)
            .cloned()
            .collect())
    }

    async fn accepted_members(
        &self,
        group: GroupId,
    ) -> Result<Vec<GroupMember>, GroupRepositoryError> {
        let state = self.lock().map_err(GroupRepositoryError::query)?;
        let mut members: Vec<GroupMember> = state
            .members
            .values()
            .filter(|member| member.group_id == group && member.is_accepted())
            .cloned()
            .collect();
        members.sort_by_key(|member| (member.requested_at, member.user_id));
        Ok(members)
    }

    async fn apply_membership(
        &self,
        transition: &MembershipTransition,
    ) -> Result<GroupMember, GroupRepositoryError> {
        let mut state = self.lock().map_err(GroupRepositoryError::query)?;
        let next = &transition.next;
        let key = (next.group_id, next.user_id);
        let current = state.members.get(&key).map(MembershipSnapshot::from);
        if current != transition.expected {
            return Err(GroupRepositoryError::stale_membership(next.group_id.get()));
        }
        state.members.insert(key, next.clone());

        let notice = &transition.notice;
        for manager in state.accepted_managers(next.group_id) {
            if notice.exclude_actor && manager == notice.actor {
                continue;
            }
            state.push_notification(&NewNotification {
                recipient: manager,
                actor: Some(notice.actor),
                related_group: Some(next.group_id),
                related_user: Some(notice.actor),
                kind: notice.kind,
                message: notice.message.clone(),
                created_at: notice.created_at,
            });
        }
        Ok(next.clone())
    }

    async fn resolve_join_request(
        &self,
        resolution: &JoinResolution,
    ) -> Result<bool, GroupRepositoryError> {
        let mut guard = self.lock().map_err(GroupRepositoryError::query)?;
        let state = &mut *guard;
        let key = (resolution.group_id, resolution.applicant);
        let pending = state
            .members
            .get(&key)
            .is_some_and(|member| member.status == MemberStatus::Pending);
        if !pending {
            return Ok(false);
        }

        match resolution.decision {
            JoinDecision::Approve => {
                if let Some(member) = state.members.get_mut(&key) {
                    member.status = MemberStatus::Accepted;
                    member.approved_at = Some(resolution.decided_at);
                }
            }
            JoinDecision::Reject => {
                state.members.remove(&key);
            }
        }

        for row in state.notifications.iter_mut().filter(|row| {
            row.recipient == resolution.admin
                && row.related_group == Some(resolution.group_id)
                && row.related_user == Some(resolution.applicant)
                && row.kind == NotificationKind::GroupJoinRequest
        }) {
            row.kind = resolution.admin_notice.kind;
            row.message.clone_from(&resolution.admin_notice.message);
            row.read_at = Some(resolution.admin_notice.read_at);
        }

        state.push_notification(&resolution.applicant_notification);
        Ok(true)
    }

    async fn add_encouragement(
        &self,
        encouragement: &NewGroupEncouragement,
    ) -> Result<GroupEncouragement, GroupRepositoryError> {
        let mut state = self.lock().map_err(GroupRepositoryError::query)?;
        let stored = GroupEncouragement {
            id: EncouragementId::new(state.next_id()),
            group_id: encouragement.group_id,
            author: encouragement.author,
            emoji: encouragement.emoji.clone(),
            message: encouragement.message.clone(),
            created_at: encouragement.created_at,
        };
        state.wall.push(stored.clone());
        Ok(stored)
    }

    async fn list_encouragements(
        &self,
        group: GroupId,
        limit: u32,
    ) -> Result<Vec<GroupEncouragement>, GroupRepositoryError> {
        let state = self.lock().map_err(GroupRepositoryError::query)?;
        let mut posts: Vec<GroupEncouragement> = state
            .wall
            .iter()
            .filter(|post| post.group_id == group)
            .cloned()
            .collect();
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        posts.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(posts)
    }

    async fn add_reminder(&self, reminder: &GroupReminder) -> Result<(), GroupRepositoryError> {
        let mut state = self.lock().map_err(GroupRepositoryError::query)?;
        state.group_reminders.push(reminder.clone());
        Ok(())
    }
}
