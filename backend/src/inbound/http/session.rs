//! Actor resolution from the signed session cookie.
//!
//! The identity provider in front of this service authenticates the caller
//! and writes their id under [`USER_ID_KEY`]. This service never writes the
//! session; handlers extract a [`SessionContext`] and ask it for the actor.

use actix_session::Session;
use actix_web::{FromRequest, HttpRequest, dev::Payload};
use futures_util::future::LocalBoxFuture;
use tracing::warn;

use crate::domain::{Error, UserId};

pub(crate) const USER_ID_KEY: &str = "user_id";

/// Read-only view of the caller's session.
#[derive(Clone)]
pub struct SessionContext(Session);

impl SessionContext {
    #[must_use]
    pub fn new(session: Session) -> Self {
        Self(session)
    }

    /// The acting user, or `401 Unauthorized` when the session carries no
    /// usable id.
    ///
    /// A malformed id is treated as absent and logged.
    pub fn require_user_id(&self) -> Result<UserId, Error> {
        let stored = self
            .0
            .get::<String>(USER_ID_KEY)
            .map_err(|error| Error::internal(format!("failed to read session: {error}")))?;
        stored
            .and_then(|raw| {
                UserId::new(&raw)
                    .inspect_err(|error| warn!(%error, "ignoring malformed session actor"))
                    .ok()
            })
            .ok_or_else(|| Error::unauthorized("login required"))
    }
}

impl FromRequest for SessionContext {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let session = Session::from_request(req, payload);
        Box::pin(async move { session.await.map(SessionContext::new) })
    }
}
