use std::convert::Infallible;

use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use futures::stream::{self, Stream, StreamExt};
use tokio::sync::broadcast::error::RecvError;

use crate::state::AppState;

/// GET /api/v1/events
/// Streams a `changed` event per notifier signal. Consumers re-read the
/// document and the registry; the event carries nothing else.
pub async fn handle_events(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.notifier.receiver();
    let mut stop = state.shutdown.subscribe();
    let events = stream::unfold(rx, |mut rx| async move {
        match rx.recv().await {
            // Lag still means at least one change happened.
            Ok(_) | Err(RecvError::Lagged(_)) => {
                let event = Event::default().event("changed").data("changed");
                Some((Ok::<_, Infallible>(event), rx))
            }
            Err(RecvError::Closed) => None,
        }
    })
    .take_until(async move {
        let _ = stop.wait_for(|stopping| *stopping).await;
    });
    Sse::new(events).keep_alive(KeepAlive::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, StorageBackend};
    use crate::routes::build_router;
    use crate::storage::MemorySlotStorage;
    use axum::body::Body;
    use axum::http::Request;
    use std::sync::Arc;
    use std::time::Duration;
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_event_stream_emits_changed_and_ends_on_shutdown() {
        let config = Config {
            data_dir: "./unused".into(),
            storage_backend: StorageBackend::Memory,
            storage_quota_bytes: 1024,
            bind_addr: "127.0.0.1".into(),
            port: 0,
            debounce: Duration::from_millis(500),
            notify_capacity: 4,
            rust_log: "info".into(),
        };
        let state = AppState::new(Arc::new(MemorySlotStorage::new()), &config);
        let app = build_router(state.clone());

        let response = app
            .oneshot(Request::get("/api/v1/events").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(
            response.headers()["content-type"],
            "text/event-stream"
        );

        state.notifier.publish();
        let mut body = response.into_body().into_data_stream();
        let frame = body.next().await.unwrap().unwrap();
        let text = String::from_utf8(frame.to_vec()).unwrap();
        assert!(text.contains("event: changed"), "{text}");

        state.shutdown.send_replace(true);
        assert!(body.next().await.is_none());
    }
}
