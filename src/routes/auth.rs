use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect},
};
use homeplan_planner::Credentials;

use crate::routes::AppState;

// Outcomes land in the status line, every form answers with the page.

pub async fn sign_up(
    State(state): State<AppState>,
    Form(input): Form<Credentials>,
) -> impl IntoResponse {
    let _ = state.planner.sign_up(input).await;

    Redirect::to("/")
}

pub async fn log_in(
    State(state): State<AppState>,
    Form(input): Form<Credentials>,
) -> impl IntoResponse {
    let _ = state.planner.log_in(input).await;

    Redirect::to("/")
}

pub async fn log_out(State(state): State<AppState>) -> impl IntoResponse {
    let _ = state.planner.log_out().await;

    Redirect::to("/")
}
