use std::sync::Arc;

use axum::{middleware, routing::get, Extension, Json, Router};
use serde_json::json;
use tower_http::trace::TraceLayer;

use crate::{
    handler::{
        admin::admin_routes,
        bids::{bid_routes, job_bid_routes},
        jobs::job_routes,
        milestones::{job_milestone_routes, milestone_routes},
        notifications::notification_routes,
    },
    middleware::{auth, require_admin},
    AppState,
};

async fn health_check() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "message": "Server is running"
    }))
}

pub fn create_router(app_state: Arc<AppState>) -> Router {
    let job_scoped = job_routes()
        .merge(job_bid_routes())
        .merge(job_milestone_routes());

    let api_route = Router::new()
        .nest("/jobs", job_scoped)
        .nest("/bids", bid_routes())
        .nest("/milestones", milestone_routes())
        .nest("/notifications", notification_routes())
        .nest(
            "/admin",
            admin_routes().layer(middleware::from_fn(require_admin)),
        )
        .layer(middleware::from_fn(auth))
        .layer(TraceLayer::new_for_http())
        .layer(Extension(app_state));

    Router::new()
        .route("/health", get(health_check))
        .nest("/api", api_route)
}
