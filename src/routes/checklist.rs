use axum::{
    Form,
    extract::{Path, State},
    response::{IntoResponse, Redirect},
};
use homeplan_planner::ListKind;
use serde::Deserialize;

use crate::routes::AppState;

#[derive(Deserialize)]
pub struct AddInput {
    pub text: String,
}

#[derive(Deserialize)]
pub struct ToggleInput {
    /// Checked state the form was rendered with.
    #[serde(default)]
    pub done: bool,
}

pub async fn add(
    State(state): State<AppState>,
    Path(list): Path<ListKind>,
    Form(input): Form<AddInput>,
) -> impl IntoResponse {
    let _ = state.planner.add(list, &input.text).await;

    Redirect::to("/")
}

pub async fn toggle(
    State(state): State<AppState>,
    Path((list, id)): Path<(ListKind, String)>,
    Form(input): Form<ToggleInput>,
) -> impl IntoResponse {
    let _ = state.planner.toggle(list, &id, input.done).await;

    Redirect::to("/")
}

pub async fn delete(
    State(state): State<AppState>,
    Path((list, id)): Path<(ListKind, String)>,
) -> impl IntoResponse {
    let _ = state.planner.delete(list, &id).await;

    Redirect::to("/")
}
