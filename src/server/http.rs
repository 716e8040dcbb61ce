//! HTTP server implementation
//!
//! Uses hyper http1 with TokioIo for async handling: one spawned task per
//! accepted connection, a single `(Method, path)` match for routing. The
//! registry is stateless between requests; everything durable lives behind
//! the key-value store in `AppState`.

use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::config::Args;
use crate::error::RegistryError;
use crate::kv::KvStore;
use crate::registry::EntryStore;
use crate::routes;
use crate::vocab::Vocabulary;

/// Shared application state
pub struct AppState {
    pub args: Args,
    pub kv: Arc<dyn KvStore>,
    pub vocab: Arc<Vocabulary>,
    pub store: EntryStore,
}

impl AppState {
    pub fn new(args: Args, kv: Arc<dyn KvStore>, vocab: Arc<Vocabulary>) -> Self {
        let store = EntryStore::new(
            Arc::clone(&kv),
            args.entry_ttl(),
            args.report_tolerance,
        );
        Self {
            args,
            kv,
            vocab,
            store,
        }
    }
}

/// Start the HTTP server
pub async fn run(state: Arc<AppState>) -> Result<(), RegistryError> {
    let listener = TcpListener::bind(state.args.listen).await?;

    info!(
        "Waypost listening on {} as node {}",
        state.args.listen, state.args.node_id
    );

    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                let state = Arc::clone(&state);
                tokio::spawn(async move {
                    let io = TokioIo::new(stream);

                    let service = service_fn(move |req| {
                        let state = Arc::clone(&state);
                        async move { handle_request(state, addr, req).await }
                    });

                    if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                        error!("Error serving connection from {}: {:?}", addr, err);
                    }
                });
            }
            Err(e) => {
                error!("Error accepting connection: {:?}", e);
            }
        }
    }
}

/// Route incoming HTTP requests
async fn handle_request(
    state: Arc<AppState>,
    addr: SocketAddr,
    req: Request<Incoming>,
) -> Result<Response<Full<Bytes>>, hyper::Error> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    info!("[{}] {} {}", addr, method, path);

    let response = match (method, path.as_str()) {
        // Liveness probe - returns 200 while the registry is running
        (Method::GET, "/health") | (Method::GET, "/healthz") => {
            routes::health_check(Arc::clone(&state)).await
        }

        // Readiness probe - returns 200 only if the backend answers
        (Method::GET, "/ready") | (Method::GET, "/readyz") => {
            routes::readiness_check(Arc::clone(&state)).await
        }

        // Version info for deployment verification
        (Method::GET, "/version") => routes::version_info(&state),

        // Filtered service discovery
        (Method::GET, "/discover") => {
            let query = req.uri().query().unwrap_or("").to_string();
            routes::handle_discover(Arc::clone(&state), &query).await
        }

        // Service registration
        (Method::POST, "/register") => {
            let body = req.collect().await?.to_bytes();
            routes::handle_register(Arc::clone(&state), body).await
        }

        // Liveness heartbeat from a registered service
        (Method::POST, "/heartbeat") => {
            let body = req.collect().await?.to_bytes();
            routes::handle_heartbeat(Arc::clone(&state), body).await
        }

        // Explicit deregistration
        (Method::POST, "/deregister") => {
            let body = req.collect().await?.to_bytes();
            routes::handle_deregister(Arc::clone(&state), body).await
        }

        // CORS preflight
        (Method::OPTIONS, _) => preflight_response(),

        _ => not_found_response(&path),
    };

    Ok(response)
}

/// CORS preflight response
fn preflight_response() -> Response<Full<Bytes>> {
    Response::builder()
        .status(StatusCode::OK)
        .header("Access-Control-Allow-Origin", "*")
        .header("Access-Control-Allow-Headers", "*")
        .header("Access-Control-Allow-Methods", "GET, POST, OPTIONS")
        .body(Full::new(Bytes::new()))
        .unwrap()
}

/// Not found response
fn not_found_response(path: &str) -> Response<Full<Bytes>> {
    let body = serde_json::json!({
        "error": "Not Found",
        "path": path,
    });

    Response::builder()
        .status(StatusCode::NOT_FOUND)
        .header("Content-Type", "application/json")
        .body(Full::new(Bytes::from(body.to_string())))
        .unwrap()
}
