//! OpenAPI documentation configuration.
//!
//! This module defines the [`ApiDoc`] struct which generates the OpenAPI
//! document for the REST API. It registers:
//!
//! - **Paths**: All HTTP endpoints from the inbound layer (friends, groups,
//!   notifications, health)
//! - **Schemas**: Domain type wrappers ([`ErrorSchema`], [`ErrorCodeSchema`])
//!   that provide OpenAPI definitions without coupling domain types to the
//!   utoipa framework
//! - **Security**: Session cookie authentication scheme
//!
//! The generated document is used by Swagger UI (debug builds) and
//! exported via `cargo run --bin openapi-dump` for external tooling.

use crate::inbound::http::schemas::{ErrorCodeSchema, ErrorSchema};
use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

/// Enrich the generated document with the session cookie security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "SessionCookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                "session",
                "Signed session cookie issued by the identity provider.",
            ))),
        );
    }
}

/// OpenAPI document for the REST API.
/// Swagger UI is enabled in debug builds only and used by tooling.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Check-in social API",
        description = "Friendships, groups, nudges and notifications for the daily check-in service.",
        license(
            name = "Apache-2.0",
            url = "https://www.apache.org/licenses/LICENSE-2.0.html"
        )
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("SessionCookie" = [])),
    paths(
        crate::inbound::http::friends::request_friend,
        crate::inbound::http::friends::accept_friend,
        crate::inbound::http::friends::list_friends,
        crate::inbound::http::friends::get_friend,
        crate::inbound::http::friends::get_permission,
        crate::inbound::http::friends::update_permission,
        crate::inbound::http::friends::remind_friend,
        crate::inbound::http::friends::encourage_friend,
        crate::inbound::http::groups::list_groups,
        crate::inbound::http::groups::create_group,
        crate::inbound::http::groups::join_group,
        crate::inbound::http::groups::get_group,
        crate::inbound::http::groups::update_name,
        crate::inbound::http::groups::update_announcement,
        crate::inbound::http::groups::rotate_invite_code,
        crate::inbound::http::groups::approve_member,
        crate::inbound::http::groups::reject_member,
        crate::inbound::http::groups::list_encouragements,
        crate::inbound::http::groups::encourage_group,
        crate::inbound::http::groups::remind_group,
        crate::inbound::http::notifications::list_notifications,
        crate::inbound::http::notifications::mark_read,
        crate::inbound::http::notifications::mark_all_read,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(ErrorSchema, ErrorCodeSchema)),
    tags(
        (name = "friends", description = "Friend requests, permissions and nudges"),
        (name = "groups", description = "Groups, membership workflow and the encouragement wall"),
        (name = "notifications", description = "Per-user notification inbox"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;
