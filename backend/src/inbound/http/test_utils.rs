//! Test helpers for inbound HTTP components.

use std::sync::Arc;

use actix_session::{SessionExt, SessionMiddleware, storage::CookieSessionStore};
use actix_web::cookie::Key;
use actix_web::dev::{Service, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, web};

use crate::domain::UserId;
use crate::domain::ports::{
    MockFriendshipCommand, MockFriendshipQuery, MockGroupCommand, MockGroupQuery,
    MockInteractionCommand, MockNotificationCommand, MockNotificationQuery,
};
use crate::inbound::http::session::USER_ID_KEY;
use crate::inbound::http::state::{HttpState, HttpStatePorts};

/// Build a session middleware configured for tests.
///
/// - Generates a fresh signing/encryption key per invocation.
/// - Sets the cookie name to `session` and disables the `Secure` flag for
///   local HTTP tests.
pub fn test_session_middleware() -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), Key::generate())
        .cookie_name("session".to_owned())
        .cookie_secure(false)
        .build()
}

/// Mocked driving ports; tests set expectations on the ones they exercise.
///
/// Any call to a port without an expectation panics, so untouched ports
/// double as assertions that the handler never reached them.
#[derive(Default)]
pub struct MockPorts {
    pub friendships: MockFriendshipCommand,
    pub friendships_query: MockFriendshipQuery,
    pub interactions: MockInteractionCommand,
    pub groups: MockGroupCommand,
    pub groups_query: MockGroupQuery,
    pub notifications: MockNotificationCommand,
    pub notifications_query: MockNotificationQuery,
}

impl MockPorts {
    pub fn into_state(self) -> web::Data<HttpState> {
        web::Data::new(HttpState::new(HttpStatePorts {
            friendships: Arc::new(self.friendships),
            friendships_query: Arc::new(self.friendships_query),
            interactions: Arc::new(self.interactions),
            groups: Arc::new(self.groups),
            groups_query: Arc::new(self.groups_query),
            notifications: Arc::new(self.notifications),
            notifications_query: Arc::new(self.notifications_query),
        }))
    }
}

/// App whose session already carries `actor`, mirroring a request that
/// passed the upstream identity provider.
pub fn signed_in_app(
    ports: MockPorts,
    actor: UserId,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    App::new()
        .app_data(ports.into_state())
        .wrap_fn(move |req, srv| {
            if let Err(error) = req.get_session().insert(USER_ID_KEY, actor.to_string()) {
                tracing::warn!(%error, "failed to seed test session");
            }
            srv.call(req)
        })
        .wrap(test_session_middleware())
}

/// App without an authenticated session.
pub fn anonymous_app(
    ports: MockPorts,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    App::new()
        .app_data(ports.into_state())
        .wrap(test_session_middleware())
}
