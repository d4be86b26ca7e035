use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect},
};
use serde::Deserialize;

use crate::routes::AppState;

#[derive(Deserialize)]
pub struct HouseholdInput {
    pub household: String,
}

pub async fn connect(
    State(state): State<AppState>,
    Form(input): Form<HouseholdInput>,
) -> impl IntoResponse {
    let _ = state.planner.connect_household(&input.household).await;

    Redirect::to("/")
}
