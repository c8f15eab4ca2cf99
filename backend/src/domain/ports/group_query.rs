//! Driving port for group read models.

use async_trait::async_trait;

use crate::domain::{
    Error, GroupDetailView, GroupEncouragementView, GroupId, GroupSummaryView, UserId,
};

/// Driving port for group listings and details.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GroupQuery: Send + Sync {
    /// Every group, newest first, annotated for the actor.
    async fn list_groups(&self, actor: &UserId) -> Result<Vec<GroupSummaryView>, Error>;

    /// Group detail filtered by the actor's membership.
    ///
    /// Non-members of a private group see no announcement and no roster.
    async fn group_detail(&self, actor: &UserId, group: GroupId)
    -> Result<GroupDetailView, Error>;

    /// Newest-first wall posts. Accepted members only.
    async fn list_encouragements(
        &self,
        actor: &UserId,
        group: GroupId,
        limit: Option<u32>,
    ) -> Result<Vec<GroupEncouragementView>, Error>;
}
