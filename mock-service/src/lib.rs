//! Stand-in for the user service, used to exercise load tests end to end.
use axum::{
    debug_handler,
    extract::{Path, State},
    http::{StatusCode, Uri},
    routing::get,
    Json, Router,
};
use metrics::counter;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc, Mutex,
};
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

/// Users `1..MAX_USER_ID` exist; any other id is a 404.
pub const MAX_USER_ID: u32 = 10_000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: u32,
    pub handle: String,
}

/// What the service has been asked for.
#[derive(Debug, Default)]
pub struct Recorder {
    ids: Mutex<Vec<u32>>,
    requests: AtomicU64,
    unmatched: AtomicU64,
}

impl Recorder {
    /// Every user id requested so far, in arrival order.
    pub fn ids(&self) -> Vec<u32> {
        self.ids.lock().map(|ids| ids.clone()).unwrap_or_default()
    }

    pub fn requests(&self) -> u64 {
        self.requests.load(Ordering::Relaxed)
    }

    /// Requests to paths other than `/users/:id`.
    pub fn unmatched(&self) -> u64 {
        self.unmatched.load(Ordering::Relaxed)
    }
}

pub fn router(recorder: Arc<Recorder>) -> Router {
    Router::new()
        .route("/users/:id", get(user))
        .fallback(unmatched)
        .with_state(recorder)
        .layer(TraceLayer::new_for_http())
}

pub async fn run(addr: SocketAddr, recorder: Arc<Recorder>) -> anyhow::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!("Mock service listening on {}", listener.local_addr()?);
    axum::serve(listener, router(recorder)).await?;
    Ok(())
}

/// Serve on an ephemeral local port in the background.
pub async fn spawn() -> anyhow::Result<(SocketAddr, Arc<Recorder>)> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let recorder = Arc::new(Recorder::default());

    let app = router(recorder.clone());
    tokio::spawn(async move {
        if let Err(err) = axum::serve(listener, app).await {
            tracing::error!("Mock service failed: {err}");
        }
    });

    Ok((addr, recorder))
}

#[debug_handler]
async fn user(
    State(recorder): State<Arc<Recorder>>,
    Path(id): Path<u32>,
) -> Result<Json<User>, StatusCode> {
    counter!("mock-service.requests").increment(1);
    recorder.requests.fetch_add(1, Ordering::Relaxed);
    if let Ok(mut ids) = recorder.ids.lock() {
        ids.push(id);
    }

    if (1..MAX_USER_ID).contains(&id) {
        Ok(Json(User {
            id,
            handle: format!("user{id}"),
        }))
    } else {
        Err(StatusCode::NOT_FOUND)
    }
}

async fn unmatched(State(recorder): State<Arc<Recorder>>, uri: Uri) -> StatusCode {
    recorder.requests.fetch_add(1, Ordering::Relaxed);
    recorder.unmatched.fetch_add(1, Ordering::Relaxed);
    debug!("No route for {uri}");
    StatusCode::NOT_FOUND
}

/** TPS Printer **/

pub async fn tps_measure_task(recorder: Arc<Recorder>) {
    let mut last = 0;
    loop {
        tokio::time::sleep(Duration::from_millis(1000)).await;
        let requests = recorder.requests();
        info!("{} TPS", requests - last);
        last = requests;
    }
}
