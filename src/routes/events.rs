use std::convert::Infallible;

use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use futures::{Stream, StreamExt, stream};
use homeplan_planner::ViewEvent;
use tokio::sync::broadcast::{Receiver, error::RecvError};

use crate::{routes::AppState, template::Fragment};

/// Pushes every re-rendered fragment to the browser, one SSE event per
/// fragment, named after it.
pub async fn stream(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.planner.subscribe();

    let events = stream::unfold((state, rx), |(state, mut rx)| async move {
        let fragments = next_fragments(&mut rx).await?;
        let view = state.planner.view().await;

        let events: Vec<Result<Event, Infallible>> = fragments
            .iter()
            .filter_map(|fragment| match fragment.render(&view) {
                Ok(html) => Some(Ok(Event::default()
                    .event(fragment.to_string())
                    .data(html.replace('\r', "")))),
                Err(err) => {
                    tracing::error!(fragment = %fragment, err = %err, "failed to render fragment");
                    None
                }
            })
            .collect();

        Some((stream::iter(events), (state, rx)))
    })
    .flatten();

    Sse::new(events).keep_alive(KeepAlive::default())
}

async fn next_fragments(rx: &mut Receiver<ViewEvent>) -> Option<&'static [Fragment]> {
    match rx.recv().await {
        Ok(event) => Some(Fragment::for_event(event)),
        // Missed events could be anything, draw the whole page again.
        Err(RecvError::Lagged(skipped)) => {
            tracing::debug!(skipped = skipped, "event stream lagged");
            Some(Fragment::all())
        }
        Err(RecvError::Closed) => None,
    }
}
