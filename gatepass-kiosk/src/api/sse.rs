//! Gate event stream for the staff console

use axum::{
    extract::State,
    response::sse::{Event, Sse},
};
use futures::stream::Stream;
use std::convert::Infallible;

use crate::AppState;

/// GET /events
///
/// Streams SessionOpened, SessionClosed, VisitSubmitted, VisitStatusChanged,
/// VisitStatusRolledBack and LiveFeedRefreshed.
pub async fn event_stream(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    gatepass_common::sse::gate_event_stream(&state.event_bus, "gatepass-kiosk")
}
