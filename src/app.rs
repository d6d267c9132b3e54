use crate::auth::credentials::AdminCredentials;
use crate::auth::handler::AuthState;
use crate::config::WebConfig;
use crate::storage::Gateway;
use crate::{admin, auth, health, notify, pages, tracking};
use axum::extract::DefaultBodyLimit;
use axum::http::{header, Method};
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

/// Assemble every page and API route over the given collections.
pub fn build_router(gateway: Gateway, credentials: AdminCredentials, web: &WebConfig) -> Router {
    // ── Pages and static assets ──
    let page_routes = Router::new()
        .route("/", get(pages::user_page))
        .route("/user.html", get(pages::user_page))
        .route("/admin", get(pages::admin_page))
        .route("/login", get(pages::login_page))
        .nest_service("/static", ServeDir::new(&web.static_dir));

    // ── Public tracking + notification read ──
    let public_routes = Router::new()
        .route("/api/track-visit", post(tracking::handler::track_visit))
        .route("/api/track-download", post(tracking::handler::track_download))
        .route(
            "/api/track-successful-download",
            post(tracking::handler::track_successful_download),
        )
        .route("/api/notifications", get(notify::handler::list_active))
        .route("/api/health", get(health::health));

    // ── Admin dashboard API (not guarded server-side) ──
    let admin_routes = Router::new()
        .route("/api/admin/stats", get(admin::handler::get_stats))
        .route("/api/admin/activity", get(admin::handler::recent_activity))
        .route("/api/admin/notification", post(notify::handler::publish))
        .route(
            "/api/admin/track-activity",
            post(admin::handler::track_activity),
        );

    let auth_state = Arc::new(AuthState {
        gateway: gateway.clone(),
        credentials,
    });
    let auth_routes = Router::new()
        .route("/api/admin/login", post(auth::handler::login))
        .route("/api/admin/verify", post(auth::handler::verify))
        .with_state(auth_state);

    let api_routes = public_routes
        .merge(admin_routes)
        .with_state(gateway)
        .merge(auth_routes)
        .layer(DefaultBodyLimit::max(web.max_payload_bytes));

    // Any origin may call the API, matching the dashboard's open deployment.
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::any())
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .merge(page_routes)
        .merge(api_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
