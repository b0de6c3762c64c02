// MIT License - Copyright (c) 2026 Peter Wright
// HTTP gateway
//
// Serves the status page, the device-table fragment and the SSE push
// stream. Each stream connection gets its own notification line, so a
// slow browser never affects the poll loop or another browser.

use std::convert::Infallible;
use std::sync::Arc;

use axum::Router;
use axum::extract::State;
use axum::response::Html;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::routing::get;
use tokio::sync::watch;
use tokio_stream::{Stream, StreamExt, wrappers::WatchStream};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::devices::record::Snapshot;
use crate::error::Result;
use crate::notify::ChangeListener;
use crate::state::StateStore;

const INDEX_HTML: &str = include_str!("../../templates/index.html");

/// Shared handler state.
#[derive(Clone)]
pub struct HttpState {
    store: Arc<StateStore>,
    listener: ChangeListener,
}

impl HttpState {
    pub fn new(store: Arc<StateStore>, listener: ChangeListener) -> Self {
        Self { store, listener }
    }
}

pub fn router(state: HttpState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/zones", get(zones))
        .route("/events", get(events))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve until `shutdown` flips. A bind failure is a startup
/// error and escalates to the caller.
pub async fn serve(
    listen: &str,
    state: HttpState,
    mut shutdown: watch::Receiver<bool>,
) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(listen).await?;
    info!("HTTP server listening on {listen}");
    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move {
            let _ = shutdown.changed().await;
        })
        .await?;
    Ok(())
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// The device table fragment, re-fetched by the page on every push event.
async fn zones(State(state): State<HttpState>) -> Html<String> {
    Html(render_fragment(&*state.store.current().await))
}

/// Push stream: one `data: update` event per snapshot change. Carries no
/// payload; the page re-reads `/zones`. The per-connection receiver
/// collapses missed changes into a single event.
async fn events(
    State(state): State<HttpState>,
) -> Sse<impl Stream<Item = std::result::Result<Event, Infallible>>> {
    let line = state.listener.clone().into_receiver();
    let stream =
        WatchStream::from_changes(line).map(|_| Ok(Event::default().data("update")));
    Sse::new(stream).keep_alive(KeepAlive::default())
}

fn render_fragment(snapshot: &Snapshot) -> String {
    let mut html = String::from(
        "<table>\n<tr><th>Kind</th><th>ID</th><th>Name</th>\
         <th>Signal</th><th>Temperature</th><th>Charge</th></tr>\n",
    );
    for record in snapshot.records() {
        html.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}&deg;C</td><td>{}%</td></tr>\n",
            record.kind,
            record.id,
            escape(&record.name),
            record.signal,
            record.temperature,
            record.charge_value,
        ));
    }
    html.push_str("</table>\n");
    html
}

/// Minimal HTML escaping for device names (the only free-text field).
fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::devices::record::{DeviceKind, DeviceRecord};
    use crate::notify::ChangeNotifier;

    fn snapshot() -> Snapshot {
        Snapshot::new(vec![
            DeviceRecord {
                kind: DeviceKind::Zone,
                id: 1,
                name: "Front <Door>".to_string(),
                signal: 50,
                temperature: 20,
                charge_value: 90,
            },
            DeviceRecord {
                kind: DeviceKind::Siren,
                id: 2,
                name: "Garden Siren".to_string(),
                signal: 72,
                temperature: 18,
                charge_value: 100,
            },
        ])
    }

    #[test]
    fn test_fragment_lists_all_records() {
        let html = render_fragment(&snapshot());
        assert!(html.contains("<td>zone</td>"));
        assert!(html.contains("<td>siren</td>"));
        assert!(html.contains("<td>Garden Siren</td>"));
        assert!(html.contains("<td>90%</td>"));
        assert!(html.contains("<td>18&deg;C</td>"));
    }

    #[test]
    fn test_fragment_escapes_names() {
        let html = render_fragment(&snapshot());
        assert!(html.contains("Front &lt;Door&gt;"));
        assert!(!html.contains("Front <Door>"));
    }

    #[test]
    fn test_empty_fragment_is_just_the_header() {
        let html = render_fragment(&Snapshot::default());
        assert_eq!(html.matches("<tr>").count(), 1);
    }

    #[tokio::test]
    async fn test_index_serves_embedded_page() {
        let body = index().await;
        assert!(body.0.contains("EventSource"));
        assert!(body.0.contains("/events"));
        assert!(body.0.contains("/zones"));
    }

    #[tokio::test]
    async fn test_zones_renders_current_snapshot() {
        let store = Arc::new(StateStore::new());
        store.replace(Arc::new(snapshot())).await;
        let notifier = ChangeNotifier::new();
        let state = HttpState::new(store, notifier.subscribe());

        let Html(body) = zones(State(state)).await;
        assert!(body.contains("Garden Siren"));
    }
}
