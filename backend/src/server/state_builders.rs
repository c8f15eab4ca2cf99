//! Builders wiring driven adapters into the HTTP state ports.

use std::sync::Arc;

use actix_web::web;
use mockable::DefaultClock;
use tracing::warn;

use checkin_social::domain::ports::{
    CheckinOracle, FriendshipRepository, GroupRepository, InteractionRepository,
    NotificationRepository, UserDirectory,
};
use checkin_social::domain::{
    FriendshipService, GroupService, InteractionService, LocalCalendar, NotificationService,
};
use checkin_social::inbound::http::state::{HttpState, HttpStatePorts};
use checkin_social::outbound::memory::InMemorySocialStore;
use checkin_social::outbound::persistence::{
    DbPool, DieselCheckinOracle, DieselFriendshipRepository, DieselGroupRepository,
    DieselInteractionRepository, DieselNotificationRepository, DieselUserDirectory,
};

use super::ServerConfig;

/// Driven adapters shared by the four engines.
pub(crate) struct DrivenAdapters<F, I, G, N, U, C> {
    pub(crate) friendships: Arc<F>,
    pub(crate) interactions: Arc<I>,
    pub(crate) groups: Arc<G>,
    pub(crate) notifications: Arc<N>,
    pub(crate) users: Arc<U>,
    pub(crate) checkins: Arc<C>,
}

impl DrivenAdapters<
    InMemorySocialStore,
    InMemorySocialStore,
    InMemorySocialStore,
    InMemorySocialStore,
    InMemorySocialStore,
    InMemorySocialStore,
>
{
    /// Serve every port from one shared in-memory store.
    pub(crate) fn in_memory(store: InMemorySocialStore) -> Self {
        let store = Arc::new(store);
        Self {
            friendships: store.clone(),
            interactions: store.clone(),
            groups: store.clone(),
            notifications: store.clone(),
            users: store.clone(),
            checkins: store,
        }
    }
}

impl DrivenAdapters<
    DieselFriendshipRepository,
    DieselInteractionRepository,
    DieselGroupRepository,
    DieselNotificationRepository,
    DieselUserDirectory,
    DieselCheckinOracle,
>
{
    /// Serve every port from PostgreSQL.
    pub(crate) fn diesel(pool: &DbPool) -> Self {
        Self {
            friendships: Arc::new(DieselFriendshipRepository::new(pool.clone())),
            interactions: Arc::new(DieselInteractionRepository::new(pool.clone())),
            groups: Arc::new(DieselGroupRepository::new(pool.clone())),
            notifications: Arc::new(DieselNotificationRepository::new(pool.clone())),
            users: Arc::new(DieselUserDirectory::new(pool.clone())),
            checkins: Arc::new(DieselCheckinOracle::new(pool.clone())),
        }
    }
}

/// Build the engines over `adapters` and expose them as HTTP ports.
///
/// Each engine backs both its command and its query port.
pub(crate) fn wire_ports<F, I, G, N, U, C>(
    adapters: DrivenAdapters<F, I, G, N, U, C>,
    calendar: &LocalCalendar,
) -> HttpStatePorts
where
    F: FriendshipRepository + 'static,
    I: InteractionRepository + 'static,
    G: GroupRepository + 'static,
    N: NotificationRepository + 'static,
    U: UserDirectory + 'static,
    C: CheckinOracle + 'static,
{
    let DrivenAdapters {
        friendships,
        interactions,
        groups,
        notifications,
        users,
        checkins,
    } = adapters;

    let friendship_service = Arc::new(FriendshipService::new(
        friendships.clone(),
        users.clone(),
        checkins.clone(),
        calendar.clone(),
    ));
    let interaction_service = Arc::new(InteractionService::new(
        friendships,
        interactions,
        users.clone(),
        calendar.clone(),
    ));
    let group_service = Arc::new(GroupService::new(
        groups,
        users.clone(),
        checkins,
        calendar.clone(),
    ));
    let notification_service = Arc::new(NotificationService::new(
        notifications,
        users,
        calendar.clone(),
    ));

    HttpStatePorts {
        friendships: friendship_service.clone(),
        friendships_query: friendship_service,
        interactions: interaction_service,
        groups: group_service.clone(),
        groups_query: group_service,
        notifications: notification_service.clone(),
        notifications_query: notification_service,
    }
}

/// Build HTTP state from configuration.
///
/// Uses the Diesel adapters when a pool is configured, otherwise an empty
/// in-memory store.
pub(crate) fn build_http_state(config: &ServerConfig) -> web::Data<HttpState> {
    let calendar = LocalCalendar::new(Arc::new(DefaultClock));
    let ports = match &config.db_pool {
        Some(pool) => wire_ports(DrivenAdapters::diesel(pool), &calendar),
        None => {
            warn!("no database configured; social state is held in memory only");
            wire_ports(
                DrivenAdapters::in_memory(InMemorySocialStore::new()),
                &calendar,
            )
        }
    };
    web::Data::new(HttpState::new(ports))
}
