//! Router construction.
//!
//! Three groups of routes share one `AppState`:
//! - public: health, signup/login, OAuth callbacks, the tracking pixel
//! - session: everything a logged-in founder calls
//! - admin: nested under `/api/admin`, admin role required, activity logged

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{get, patch, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{self, admin},
    middleware::{activity::record_admin_activity, auth},
    state::AppState,
};

fn admin_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        // Dashboard
        .route("/dashboard/stats", get(admin::dashboard::stats))
        .route("/dashboard/activity-log", get(admin::dashboard::activity_log))
        .route("/system/health", get(admin::dashboard::system_health))
        // Users
        .route("/users", get(admin::users::list))
        .route("/users/export", get(admin::users::export))
        .route("/users/{id}", get(admin::users::details))
        .route("/users/{id}/status", patch(admin::users::update_status))
        // Subscriptions and revenue
        .route("/subscriptions", get(admin::subscriptions::list))
        .route("/subscriptions/export", get(admin::subscriptions::export))
        .route("/subscriptions/{id}", patch(admin::subscriptions::update))
        .route(
            "/revenue/analytics",
            get(admin::subscriptions::revenue_analytics),
        )
        // Investors
        .route(
            "/investors",
            get(admin::investors::list).post(admin::investors::create),
        )
        .route("/investors/export", get(admin::investors::export))
        .route("/investors/template", get(admin::investors::template))
        .route("/investors/bulk-delete", post(admin::investors::bulk_delete))
        .route("/investors/upload-excel", post(admin::investors::upload_excel))
        .route(
            "/investors/upload-workbook",
            post(admin::investors::upload_workbook),
        )
        .route(
            "/investors/{id}",
            patch(admin::investors::update).delete(admin::investors::delete),
        )
        // Potential investors
        .route(
            "/potential-investors",
            get(admin::potential_investors::list),
        )
        .route(
            "/potential-investors/upload",
            post(admin::potential_investors::upload),
        )
        .route(
            "/potential-investors/{id}",
            get(admin::potential_investors::get).put(admin::potential_investors::update),
        )
        .route(
            "/potential-investors/{id}/verify",
            post(admin::potential_investors::verify),
        )
        .route(
            "/potential-investors/{id}/approve",
            post(admin::potential_investors::approve),
        )
        .route(
            "/potential-investors/{id}/reject",
            post(admin::potential_investors::reject),
        )
        .route(
            "/potential-investors/{id}/reopen",
            post(admin::potential_investors::reopen),
        )
        // Layers run bottom-up: session, then role, then activity logging
        .route_layer(axum_middleware::from_fn_with_state(
            state.pool.clone(),
            record_admin_activity,
        ))
        .route_layer(axum_middleware::from_fn(auth::require_admin))
        .route_layer(axum_middleware::from_fn_with_state(
            state.pool.clone(),
            auth::session_auth,
        ))
}

fn session_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/api/auth/logout", post(handlers::auth::logout))
        // Founder
        .route("/api/user/profile", get(handlers::founder::profile))
        .route("/api/dashboard/stats", get(handlers::founder::dashboard_stats))
        .route("/api/investors", get(handlers::founder::investors))
        .route("/api/grants", get(handlers::founder::grants))
        .route("/api/crm/campaigns", get(handlers::founder::campaigns))
        // Email
        .route("/api/auth/google", get(handlers::email::google_auth))
        .route("/api/auth/outlook", get(handlers::email::outlook_auth))
        .route("/api/email/status", get(handlers::email::status))
        .route(
            "/api/email/connection",
            axum::routing::delete(handlers::email::disconnect),
        )
        .route("/api/email/send", post(handlers::email::send))
        // Payments
        .route(
            "/api/payment/create-order",
            post(handlers::payments::create_order),
        )
        .route("/api/payment/verify", post(handlers::payments::verify))
        .route_layer(axum_middleware::from_fn_with_state(
            state.pool.clone(),
            auth::session_auth,
        ))
}

fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/api/health", get(handlers::health::health_check))
        .route("/api/auth/signup", post(handlers::auth::signup))
        .route("/api/auth/login", post(handlers::auth::login))
        .route(
            "/api/auth/google/callback",
            get(handlers::email::google_callback),
        )
        .route(
            "/api/auth/outlook/callback",
            get(handlers::email::outlook_callback),
        )
        .route("/api/email/track/{id}", get(handlers::email::track))
}

/// Full application router with shared layers applied.
pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(public_routes())
        .merge(session_routes(&state))
        .nest("/api/admin", admin_routes(&state))
        .layer(DefaultBodyLimit::max(state.config.max_upload_bytes))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use axum::{
        body::Body,
        http::{Request, StatusCode, header},
    };
    use tower::ServiceExt;

    /// Router over a pool that never connects; only routes that fail
    /// before touching the database are exercised.
    fn app() -> Router {
        let config = Config::for_tests();
        let pool = sqlx::postgres::PgPoolOptions::new()
            .connect_lazy(&config.database_url)
            .unwrap();
        router(AppState::new(pool, config).unwrap())
    }

    async fn status_of(request: Request<Body>) -> StatusCode {
        app().oneshot(request).await.unwrap().status()
    }

    #[tokio::test]
    async fn founder_routes_require_a_session() {
        let request = Request::get("/api/user/profile").body(Body::empty()).unwrap();
        assert_eq!(status_of(request).await, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn admin_routes_require_a_session() {
        let request = Request::get("/api/admin/users")
            .header(header::AUTHORIZATION, "Token abc")
            .body(Body::empty())
            .unwrap();
        assert_eq!(status_of(request).await, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn tracking_pixel_is_served_for_unknown_ids() {
        let response = app()
            .oneshot(
                Request::get("/api/email/track/not-a-uuid")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "image/gif");
    }

    #[tokio::test]
    async fn unknown_routes_are_not_found() {
        let request = Request::get("/api/nope").body(Body::empty()).unwrap();
        assert_eq!(status_of(request).await, StatusCode::NOT_FOUND);
    }
}
