// src/routes.rs

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{get, post, put},
};
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use crate::{
    handlers::{self, admin, leaderboard, quiz, session, share},
    state::AppState,
    utils::jwt::{admin_middleware, auth_middleware},
};

/// Assembles the application router.
///
/// * `/api/*`: JSON API (session, quiz, sharing, admin).
/// * `/share/{slug}.png`: rendered share cards.
/// * everything else: the Mini App's static files.
pub fn create_router(state: AppState) -> Router {
    let cors = match HeaderValue::from_str(&state.config.webapp_origin()) {
        Ok(origin) => CorsLayer::new()
            .allow_origin(origin)
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]),
        Err(e) => {
            tracing::warn!("Mini App origin is not a valid header value, CORS disabled: {}", e);
            CorsLayer::new()
        }
    };

    let user_routes = Router::new()
        .route("/me", get(session::get_me))
        .route("/questions/current", get(quiz::current_question))
        .route("/questions/{id}/answer", post(quiz::submit_answer))
        .route("/share", post(share::create_share))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    let admin_routes = Router::new()
        .route(
            "/questions",
            get(admin::list_questions).post(admin::create_question),
        )
        .route(
            "/questions/{id}",
            put(admin::update_question).delete(admin::delete_question),
        )
        // Auth runs first (outermost), then the admin check
        .layer(middleware::from_fn(admin_middleware))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    let api_routes = Router::new()
        .route("/health", get(handlers::health))
        .route("/session", post(session::create_session))
        .route("/leaderboard", get(leaderboard::get_leaderboard))
        .merge(user_routes)
        .nest("/admin", admin_routes)
        .fallback(handlers::api_not_found);

    let static_files = ServeDir::new(&state.config.static_dir);

    Router::new()
        .nest("/api", api_routes)
        .route("/share/{file}", get(share::share_image))
        .fallback_service(static_files)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
