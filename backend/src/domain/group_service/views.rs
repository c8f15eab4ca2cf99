//! Viewer-specific group read models.

use std::collections::HashMap;

use super::{GroupService, map_group_error};
use crate::domain::lookup::{map_checkin_oracle_error, profiles_by_id, require_profile};
use crate::domain::ports::{CheckinOracle, GroupRepository, UserDirectory};
use crate::domain::{
    Error, Group, GroupDetailView, GroupEncouragementView, GroupMemberView, GroupSummaryView,
    MembershipLabel, UNKNOWN_AUTHOR, UserId, UserSummary, clamp_wall_limit,
};

impl<G, U, C> GroupService<G, U, C>
where
    G: GroupRepository,
    U: UserDirectory,
    C: CheckinOracle,
{
    /// Detail of `group` filtered by the viewer's membership.
    pub(super) async fn detail(
        &self,
        viewer: &UserId,
        group: &Group,
    ) -> Result<GroupDetailView, Error> {
        let membership = self.membership(group.id, viewer).await?;
        let status = MembershipLabel::of(membership.as_ref());
        let is_member = status == MembershipLabel::Member;

        let members = if is_member {
            self.roster(group).await?
        } else {
            Vec::new()
        };
        let announcement = if group.is_private() && !is_member {
            None
        } else {
            group.announcement.clone()
        };
        let join_code = (is_member && group.is_private()).then(|| group.join_code.to_string());

        Ok(GroupDetailView {
            id: group.id,
            name: group.name.clone(),
            privacy: group.privacy,
            requires_approval: group.requires_approval,
            announcement,
            status,
            members,
            join_code,
        })
    }

    /// Accepted members, each with a check-in flag for their own local today.
    async fn roster(&self, group: &Group) -> Result<Vec<GroupMemberView>, Error> {
        let accepted = self
            .groups
            .accepted_members(group.id)
            .await
            .map_err(map_group_error)?;
        let ids: Vec<UserId> = accepted.iter().map(|member| member.user_id).collect();
        let profiles = profiles_by_id(self.users.as_ref(), &ids).await?;

        let mut roster = Vec::with_capacity(accepted.len());
        for member in accepted {
            let Some(profile) = profiles.get(&member.user_id) else {
                continue;
            };
            let checked_in_today = self
                .checkins
                .has_checkin(&member.user_id, self.calendar.today_for(profile))
                .await
                .map_err(map_checkin_oracle_error)?;
            roster.push(GroupMemberView {
                user: UserSummary::from(profile),
                role: member.role,
                checked_in_today,
            });
        }
        Ok(roster)
    }

    /// Every group, newest first, with counts on the viewer's local today.
    pub(super) async fn summaries(&self, viewer: &UserId) -> Result<Vec<GroupSummaryView>, Error> {
        let groups = self.groups.list_all().await.map_err(map_group_error)?;
        let own: HashMap<_, _> = self
            .groups
            .memberships_of(viewer)
            .await
            .map_err(map_group_error)?
            .into_iter()
            .map(|member| (member.group_id, member))
            .collect();
        let profile = require_profile(self.users.as_ref(), viewer).await?;
        let today = self.calendar.today_for(&profile);

        let mut summaries = Vec::with_capacity(groups.len());
        for group in groups {
            let accepted = self
                .groups
                .accepted_members(group.id)
                .await
                .map_err(map_group_error)?;
            let ids: Vec<UserId> = accepted.iter().map(|member| member.user_id).collect();
            let active_today = self
                .checkins
                .count_checked_in(&ids, today)
                .await
                .map_err(map_checkin_oracle_error)?;
            summaries.push(GroupSummaryView {
                id: group.id,
                name: group.name,
                privacy: group.privacy,
                requires_approval: group.requires_approval,
                members_count: u32::try_from(ids.len()).unwrap_or(u32::MAX),
                active_today,
                status: MembershipLabel::of(own.get(&group.id)),
            });
        }
        Ok(summaries)
    }

    /// Newest-first wall posts of `group`.
    pub(super) async fn wall(
        &self,
        group: &Group,
        limit: Option<u32>,
    ) -> Result<Vec<GroupEncouragementView>, Error> {
        let posts = self
            .groups
            .list_encouragements(group.id, clamp_wall_limit(limit))
            .await
            .map_err(map_group_error)?;
        let authors: Vec<UserId> = posts.iter().map(|post| post.author).collect();
        let profiles = profiles_by_id(self.users.as_ref(), &authors).await?;

        Ok(posts
            .into_iter()
            .map(|post| GroupEncouragementView {
                id: post.id,
                author_name: profiles
                    .get(&post.author)
                    .map_or_else(|| UNKNOWN_AUTHOR.to_owned(), |p| p.display_name().to_owned()),
                text: post.text(),
                created_at: post.created_at,
            })
            .collect())
    }
}
