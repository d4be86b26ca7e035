use axum::{
    Form,
    extract::{Path, State},
    response::{IntoResponse, Redirect},
};
use homeplan_planner::Weekday;
use serde::Deserialize;

use crate::routes::AppState;

#[derive(Deserialize)]
pub struct MealInput {
    #[serde(default)]
    pub value: String,
}

pub async fn update(
    State(state): State<AppState>,
    Path(day): Path<Weekday>,
    Form(input): Form<MealInput>,
) -> impl IntoResponse {
    let _ = state.planner.update_meal(day, &input.value).await;

    Redirect::to("/")
}
