//! In-process HTTP server serving `.properties` bodies.

use axum::Router;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

#[derive(Clone, Default)]
struct ServerState {
    bodies: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    status: Arc<Mutex<Option<u16>>>,
}

/// Serves `/{name}` with the body set for `name`, or with a forced status.
pub struct PropertiesServer {
    addr: SocketAddr,
    state: ServerState,
}

impl PropertiesServer {
    pub async fn start() -> Self {
        let state = ServerState::default();
        let app = Router::new()
            .route("/{name}", get(serve_properties))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self { addr, state }
    }

    pub fn url(&self, name: &str) -> String {
        format!("http://{}/{}", self.addr, name)
    }

    /// Set the body for `name` from `key=value` pairs.
    pub fn set_properties(&self, name: &str, properties: &[(&str, &str)]) {
        let body = properties
            .iter()
            .map(|(k, v)| format!("{}={}\n", k, v))
            .collect::<String>();
        self.set_body(name, &body);
    }

    pub fn set_body(&self, name: &str, body: &str) {
        self.set_raw_body(name, body.as_bytes());
    }

    pub fn set_raw_body(&self, name: &str, body: &[u8]) {
        self.state
            .bodies
            .lock()
            .insert(name.to_string(), body.to_vec());
    }

    /// Answer every request with `status` until reset with `None`.
    pub fn fail_with_status(&self, status: Option<u16>) {
        *self.state.status.lock() = status;
    }
}

async fn serve_properties(
    Path(name): Path<String>,
    State(state): State<ServerState>,
) -> (StatusCode, Vec<u8>) {
    if let Some(status) = *state.status.lock() {
        let code = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        return (code, Vec::new());
    }

    match state.bodies.lock().get(&name) {
        Some(body) => (StatusCode::OK, body.clone()),
        None => (StatusCode::NOT_FOUND, Vec::new()),
    }
}
