//! Owner and admin edits to a group record.

use tracing::{info, warn};

use super::{GroupService, map_group_error};
use crate::domain::ports::{
    CheckinOracle, GroupRepository, GroupRepositoryError, GroupUpdate, UserDirectory,
};
use crate::domain::{Error, GroupDetailView, GroupId, JOIN_CODE_MAX_ATTEMPTS, JoinCode, UserId};

impl<G, U, C> GroupService<G, U, C>
where
    G: GroupRepository,
    U: UserDirectory,
    C: CheckinOracle,
{
    async fn apply_update(
        &self,
        actor: &UserId,
        group: GroupId,
        update: &GroupUpdate,
    ) -> Result<GroupDetailView, Error> {
        let updated = self
            .groups
            .update_group(group, update)
            .await
            .map_err(map_group_error)?
            .ok_or_else(|| Error::not_found(format!("group {group} not found")))?;
        self.detail(actor, &updated).await
    }

    pub(super) async fn rename(
        &self,
        actor: &UserId,
        group: GroupId,
        name: String,
    ) -> Result<GroupDetailView, Error> {
        let group = self.load_group(group).await?;
        self.require_manager(group.id, actor).await?;
        let name = name.trim().to_owned();
        if name.is_empty() {
            return Err(Error::invalid_request("group name must not be empty"));
        }
        self.apply_update(actor, group.id, &GroupUpdate::Name(name))
            .await
    }

    pub(super) async fn announce(
        &self,
        actor: &UserId,
        group: GroupId,
        announcement: Option<String>,
    ) -> Result<GroupDetailView, Error> {
        let group = self.load_group(group).await?;
        self.require_manager(group.id, actor).await?;
        self.apply_update(actor, group.id, &GroupUpdate::Announcement(announcement))
            .await
    }

    pub(super) async fn rotate_code(
        &self,
        actor: &UserId,
        group: GroupId,
    ) -> Result<GroupDetailView, Error> {
        let group = self.load_group(group).await?;
        self.require_manager(group.id, actor).await?;
        if !group.is_private() {
            return Err(Error::invalid_request(
                "only private groups have an invite code",
            ));
        }

        for attempt in 1..=JOIN_CODE_MAX_ATTEMPTS {
            let update = GroupUpdate::JoinCode(JoinCode::generate());
            match self.groups.update_group(group.id, &update).await {
                Ok(Some(updated)) => {
                    info!(group_id = %group.id, admin = %actor, "invite code rotated");
                    return self.detail(actor, &updated).await;
                }
                Ok(None) => return Err(Error::not_found(format!("group {} not found", group.id))),
                Err(GroupRepositoryError::JoinCodeTaken { code }) => {
                    warn!(attempt, code = %code, group_id = %group.id, "join code collision on rotate; regenerating");
                }
                Err(err) => return Err(map_group_error(err)),
            }
        }
        Err(Error::internal("could not allocate a unique join code"))
    }
}
