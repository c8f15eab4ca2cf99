//! Server construction and middleware wiring.

mod config;
mod settings;
mod state_builders;

pub use config::ServerConfig;
pub use settings::ServerSettings;

use state_builders::build_http_state;

use actix_session::{
    SessionMiddleware,
    config::{CookieContentSecurity, PersistentSession},
    storage::CookieSessionStore,
};
use actix_web::cookie::{Key, SameSite};
use actix_web::dev::{Server, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpServer, web};

use checkin_social::Trace;
#[cfg(debug_assertions)]
use checkin_social::doc::ApiDoc;
use checkin_social::inbound::http::friends::{
    accept_friend, encourage_friend, get_friend, get_permission, list_friends, remind_friend,
    request_friend, update_permission,
};
use checkin_social::inbound::http::groups::{
    approve_member, create_group, encourage_group, get_group, join_group, list_encouragements,
    list_groups, reject_member, remind_group, rotate_invite_code, update_announcement,
    update_name,
};
use checkin_social::inbound::http::health::{HealthState, live, ready};
use checkin_social::inbound::http::notifications::{list_notifications, mark_all_read, mark_read};
use checkin_social::inbound::http::state::HttpState;
#[cfg(debug_assertions)]
use utoipa::OpenApi;
#[cfg(debug_assertions)]
use utoipa_swagger_ui::SwaggerUi;

#[derive(Clone)]
struct AppDependencies {
    health_state: web::Data<HealthState>,
    http_state: web::Data<HttpState>,
    key: Key,
    cookie_secure: bool,
    same_site: SameSite,
}

/// Register every social endpoint under `/api/v1`.
///
/// Fixed segments (`/groups/join`, `/notifications/read-all`) are registered
/// ahead of their `{id}` siblings.
fn api_scope() -> actix_web::Scope {
    web::scope("/api/v1")
        .service(request_friend)
        .service(accept_friend)
        .service(list_friends)
        .service(get_friend)
        .service(get_permission)
        .service(update_permission)
        .service(remind_friend)
        .service(encourage_friend)
        .service(list_groups)
        .service(create_group)
        .service(join_group)
        .service(get_group)
        .service(update_name)
        .service(update_announcement)
        .service(rotate_invite_code)
        .service(approve_member)
        .service(reject_member)
        .service(list_encouragements)
        .service(encourage_group)
        .service(remind_group)
        .service(list_notifications)
        .service(mark_all_read)
        .service(mark_read)
}

fn build_app(
    deps: AppDependencies,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let AppDependencies {
        health_state,
        http_state,
        key,
        cookie_secure,
        same_site,
    } = deps;

    let session = SessionMiddleware::builder(CookieSessionStore::default(), key)
        .cookie_name("session".into())
        .cookie_path("/".into())
        .cookie_secure(cookie_secure)
        .cookie_http_only(true)
        .cookie_content_security(CookieContentSecurity::Private)
        .cookie_same_site(same_site)
        .session_lifecycle(
            PersistentSession::default().session_ttl(actix_web::cookie::time::Duration::hours(2)),
        )
        .build();

    let app = App::new()
        .app_data(health_state)
        .app_data(http_state)
        .wrap(Trace)
        .service(api_scope().wrap(session))
        .service(ready)
        .service(live);

    #[cfg(debug_assertions)]
    let app = app.service(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()));

    app
}

/// Construct an Actix HTTP server using the provided health state and configuration.
///
/// # Parameters
/// - `health_state`: shared readiness state updated once the server is initialised.
/// - `config`: pre-built [`ServerConfig`] containing session, binding and persistence settings.
///
/// # Returns
/// A spawned [`Server`] that must be awaited to drive the listener.
///
/// # Errors
/// Propagates [`std::io::Error`] when binding the socket or starting the server fails.
pub fn create_server(
    health_state: web::Data<HealthState>,
    config: ServerConfig,
) -> std::io::Result<Server> {
    let server_health_state = health_state.clone();
    let http_state = build_http_state(&config);
    let ServerConfig {
        key,
        cookie_secure,
        same_site,
        bind_addr,
        db_pool: _,
    } = config;

    let server = HttpServer::new(move || {
        build_app(AppDependencies {
            health_state: server_health_state.clone(),
            http_state: http_state.clone(),
            key: key.clone(),
            cookie_secure,
            same_site,
        })
    })
    .bind(bind_addr)?
    .run();

    health_state.mark_ready();
    Ok(server)
}
