use axum::{extract::State, response::IntoResponse};

use crate::{
    routes::AppState,
    template::{IndexTemplate, render},
};
use askama::Template;

pub async fn page(State(state): State<AppState>) -> impl IntoResponse {
    let view = state.planner.view().await;

    render(IndexTemplate::new(&view).and_then(|page| page.render()))
}
