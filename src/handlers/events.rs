use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::Stream;
use futures::stream;
use std::convert::Infallible;
use tokio::sync::broadcast::error::RecvError;
use tracing::debug;

use super::AppState;
use crate::formatter::JsonFormatter;

/// SSE поток снапшотов. У каждого соединения свой подписчик; отставший
/// клиент теряет старые события и продолжает с текущих.
pub async fn events(State(state): State<AppState>) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.publisher.subscribe();

    let stream = stream::unfold(rx, |mut rx| async move {
        loop {
            match rx.recv().await {
                Ok(snapshot) => match JsonFormatter::to_json_string(&snapshot) {
                    Ok(json) => {
                        let event = Event::default().event("snapshot").data(json);
                        return Some((Ok::<_, Infallible>(event), rx));
                    }
                    Err(err) => debug!(error = %err, "снапшот не сериализовался"),
                },
                Err(RecvError::Lagged(missed)) => debug!(missed, "SSE клиент отстал"),
                Err(RecvError::Closed) => return None,
            }
        }
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}
