//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on domain ports (use-cases) and remain testable without I/O.

use std::sync::Arc;

use crate::domain::ports::{
    FriendshipCommand, FriendshipQuery, GroupCommand, GroupQuery, InteractionCommand,
    NotificationCommand, NotificationQuery,
};

/// Parameter object bundling all port implementations for HTTP handlers.
#[derive(Clone)]
pub struct HttpStatePorts {
    pub friendships: Arc<dyn FriendshipCommand>,
    pub friendships_query: Arc<dyn FriendshipQuery>,
    pub interactions: Arc<dyn InteractionCommand>,
    pub groups: Arc<dyn GroupCommand>,
    pub groups_query: Arc<dyn GroupQuery>,
    pub notifications: Arc<dyn NotificationCommand>,
    pub notifications_query: Arc<dyn NotificationQuery>,
}

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub friendships: Arc<dyn FriendshipCommand>,
    pub friendships_query: Arc<dyn FriendshipQuery>,
    pub interactions: Arc<dyn InteractionCommand>,
    pub groups: Arc<dyn GroupCommand>,
    pub groups_query: Arc<dyn GroupQuery>,
    pub notifications: Arc<dyn NotificationCommand>,
    pub notifications_query: Arc<dyn NotificationQuery>,
}

impl From<HttpStatePorts> for HttpState {
    fn from(ports: HttpStatePorts) -> Self {
        Self::new(ports)
    }
}

impl HttpState {
    /// Construct state from a ports bundle.
    ///
    /// The same service value usually backs both the command and the query
    /// port of an engine; clone the `Arc` into each slot.
    ///
    /// # Examples
    /// ```
    /// use std::sync::Arc;
    ///
    /// use mockable::DefaultClock;
    /// use checkin_social::domain::{
    ///     FriendshipService, GroupService, InteractionService, LocalCalendar,
    ///     NotificationService,
    /// };
    /// use checkin_social::inbound::http::state::{HttpState, HttpStatePorts};
    /// use checkin_social::outbound::memory::InMemorySocialStore;
    ///
    /// let store = Arc::new(InMemorySocialStore::new());
    /// let calendar = LocalCalendar::new(Arc::new(DefaultClock));
    /// let friendships = Arc::new(FriendshipService::new(
    ///     store.clone(),
    ///     store.clone(),
    ///     store.clone(),
    ///     calendar.clone(),
    /// ));
    /// let interactions = Arc::new(InteractionService::new(
    ///     store.clone(),
    ///     store.clone(),
    ///     store.clone(),
    ///     calendar.clone(),
    /// ));
    /// let groups = Arc::new(GroupService::new(
    ///     store.clone(),
    ///     store.clone(),
    ///     store.clone(),
    ///     calendar.clone(),
    /// ));
    /// let notifications = Arc::new(NotificationService::new(
    ///     store.clone(),
    ///     store,
    ///     calendar,
    /// ));
    /// let state = HttpState::new(HttpStatePorts {
    ///     friendships: friendships.clone(),
    ///     friendships_query: friendships,
    ///     interactions,
    ///     groups: groups.clone(),
    ///     groups_query: groups,
    ///     notifications: notifications.clone(),
    ///     notifications_query: notifications,
    /// });
    /// let _groups = state.groups.clone();
    /// ```
    #[must_use]
    pub fn new(ports: HttpStatePorts) -> Self {
        let HttpStatePorts {
            friendships,
            friendships_query,
            interactions,
            groups,
            groups_query,
            notifications,
            notifications_query,
        } = ports;
        Self {
            friendships,
            friendships_query,
            interactions,
            groups,
            groups_query,
            notifications,
            notifications_query,
        }
    }
}
