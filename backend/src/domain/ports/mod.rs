//! Domain ports and supporting types for the hexagonal boundary.
//!
//! Driven ports (`*Repository`, [`UserDirectory`], [`CheckinOracle`]) are
//! implemented by the outbound adapters. Driving ports (`*Command`,
//! `*Query`) are implemented by the domain services and called by inbound
//! adapters.

mod macros;
pub(crate) use macros::define_port_error;

mod checkin_oracle;
mod friendship_command;
mod friendship_query;
mod friendship_repository;
mod group_command;
mod group_query;
mod group_repository;
mod interaction_command;
mod interaction_repository;
mod notification_command;
mod notification_query;
mod notification_repository;
mod user_directory;

#[cfg(test)]
pub use checkin_oracle::MockCheckinOracle;
pub use checkin_oracle::{CheckinOracle, CheckinOracleError, FixtureCheckinOracle};
#[cfg(test)]
pub use friendship_command::MockFriendshipCommand;
pub use friendship_command::{FriendRequest, FriendshipCommand};
#[cfg(test)]
pub use friendship_query::MockFriendshipQuery;
pub use friendship_query::FriendshipQuery;
#[cfg(test)]
pub use friendship_repository::MockFriendshipRepository;
pub use friendship_repository::{FriendshipRepository, FriendshipRepositoryError};
#[cfg(test)]
pub use group_command::MockGroupCommand;
pub use group_command::{CreateGroupRequest, GroupCommand, GroupEncourageRequest};
#[cfg(test)]
pub use group_query::MockGroupQuery;
pub use group_query::GroupQuery;
#[cfg(test)]
pub use group_repository::MockGroupRepository;
pub use group_repository::{
    GroupRepository, GroupRepositoryError, GroupUpdate, JoinDecision, JoinResolution,
    MembershipSnapshot, MembershipTransition,
};
#[cfg(test)]
pub use interaction_command::MockInteractionCommand;
pub use interaction_command::{EncourageFriendRequest, InteractionCommand};
#[cfg(test)]
pub use interaction_repository::MockInteractionRepository;
pub use interaction_repository::{
    InteractionRepository, InteractionRepositoryError, ReminderWrite,
};
#[cfg(test)]
pub use notification_command::MockNotificationCommand;
pub use notification_command::NotificationCommand;
#[cfg(test)]
pub use notification_query::MockNotificationQuery;
pub use notification_query::{ListNotificationsRequest, NotificationQuery};
#[cfg(test)]
pub use notification_repository::MockNotificationRepository;
pub use notification_repository::{NotificationRepository, NotificationRepositoryError};
#[cfg(test)]
pub use user_directory::MockUserDirectory;
pub use user_directory::{FixtureUserDirectory, UserDirectory, UserDirectoryError};
