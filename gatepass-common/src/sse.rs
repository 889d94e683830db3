//! Server-Sent Events (SSE) utilities

use crate::events::EventBus;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::Stream;
use std::convert::Infallible;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

/// Stream every [`GateEvent`](crate::events::GateEvent) published on `bus`
///
/// The first message is a `ConnectionStatus` event so the console can show a
/// connected indicator before any gate activity happens. Lagging clients skip
/// the events they missed and keep streaming.
pub fn gate_event_stream(
    bus: &EventBus,
    service_name: &'static str,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    info!("New SSE client connected to {} events", service_name);
    let mut rx = bus.subscribe();

    let stream = async_stream::stream! {
        yield Ok(Event::default()
            .event("ConnectionStatus")
            .data("connected"));

        loop {
            match rx.recv().await {
                Ok(event) => {
                    let name = event.event_type();
                    match serde_json::to_string(&event) {
                        Ok(json) => yield Ok(Event::default().event(name).data(json)),
                        Err(e) => warn!("SSE: failed to serialize {}: {}", name, e),
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    debug!("SSE: client lagged, skipped {} events", skipped);
                }
                Err(RecvError::Closed) => {
                    info!("SSE: {} event bus closed", service_name);
                    break;
                }
            }
        }
    };

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("heartbeat"),
    )
}
