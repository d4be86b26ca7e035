use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use homeplan_planner::Planner;

mod auth;
mod checklist;
mod events;
mod fragments;
mod health;
mod household;
mod index;
mod meals;
mod service_worker;

#[derive(Clone)]
pub struct AppState {
    pub planner: Arc<Planner>,
}

impl AppState {
    pub fn new(planner: Planner) -> Self {
        Self {
            planner: Arc::new(planner),
        }
    }
}

pub fn router(app_state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/", get(index::page))
        .route("/signup", post(auth::sign_up))
        .route("/login", post(auth::log_in))
        .route("/logout", post(auth::log_out))
        .route("/household", post(household::connect))
        .route("/meals/{day}", post(meals::update))
        .route("/events", get(events::stream))
        .route("/fragments/{name}", get(fragments::fragment))
        .route("/{list}", post(checklist::add))
        .route("/{list}/{id}/toggle", post(checklist::toggle))
        .route("/{list}/{id}/delete", post(checklist::delete))
        .route("/sw.js", get(service_worker::sw))
        .nest_service("/static", crate::assets::AssetsService::new())
        .with_state(app_state)
}
