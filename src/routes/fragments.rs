use std::str::FromStr;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::{
    routes::AppState,
    template::{Fragment, render},
};

pub async fn fragment(State(state): State<AppState>, Path(name): Path<String>) -> Response {
    let Ok(fragment) = Fragment::from_str(&name) else {
        return (StatusCode::NOT_FOUND, "Not found").into_response();
    };

    let view = state.planner.view().await;

    render(fragment.render(&view))
}
