//! HTTP server setup and request translation.
//!
//! # Responsibilities
//! - Create the Axum router with a single catch-all handler
//! - Wire up middleware (tracing, timeout)
//! - Translate HTTP requests into dispatcher requests and back
//! - Serve with graceful shutdown
//!
//! # Design Decisions
//! - The framework's own route table does the routing; Axum only carries
//!   transport, so the router has exactly one catch-all route
//! - Handlers are synchronous and may block, so each dispatch runs on
//!   the blocking pool
//! - A panicking handler surfaces as a 500 envelope, never a dropped
//!   connection

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::State,
    http::{header, Method, Request, StatusCode},
    response::{Html, IntoResponse, Json, Response},
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::api::{
    ApiRequest, ApiResponse, ApiStatus, Dispatcher, HttpMethod, ResponseBody,
};
use crate::config::AppConfig;

const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Application state injected into the catch-all handler.
pub struct AppState<S> {
    dispatcher: Arc<Dispatcher<S>>,
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            dispatcher: self.dispatcher.clone(),
        }
    }
}

/// HTTP server wrapping the dispatcher.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Create a new HTTP server around a dispatcher.
    pub fn new<S: Send + Sync + 'static>(
        config: &AppConfig,
        dispatcher: Arc<Dispatcher<S>>,
    ) -> Self {
        let state = AppState { dispatcher };
        let router = Router::new()
            .route("/{*path}", any(api_handler::<S>))
            .route("/", any(api_handler::<S>))
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(
                config.listener.request_timeout_secs,
            )))
            .layer(TraceLayer::new_for_http());
        Self { router }
    }

    /// Run the server until the shutdown future resolves.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

fn map_method(method: &Method) -> Option<HttpMethod> {
    match *method {
        Method::GET => Some(HttpMethod::Get),
        Method::POST => Some(HttpMethod::Post),
        Method::PUT => Some(HttpMethod::Put),
        Method::PATCH => Some(HttpMethod::Patch),
        Method::DELETE => Some(HttpMethod::Delete),
        Method::OPTIONS => Some(HttpMethod::Options),
        _ => None,
    }
}

fn to_http(response: ApiResponse) -> Response {
    let status =
        StatusCode::from_u16(response.code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    match response.body {
        ResponseBody::Json(value) => (status, Json(value)).into_response(),
        ResponseBody::Html(page) => (status, Html(page)).into_response(),
    }
}

fn status_response(status: ApiStatus) -> Response {
    to_http(ApiResponse {
        code: status.code(),
        body: ResponseBody::Json(status.envelope()),
    })
}

/// The single Axum handler: translate, dispatch on the blocking pool,
/// translate back.
async fn api_handler<S: Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    request: Request<Body>,
) -> Response {
    let Some(method) = map_method(request.method()) else {
        return status_response(ApiStatus::method_not_allowed());
    };

    let path = request.uri().path().to_string();
    let query: HashMap<String, String> = request
        .uri()
        .query()
        .map(|q| {
            url::form_urlencoded::parse(q.as_bytes())
                .map(|(k, v)| (k.into_owned(), v.into_owned()))
                .collect()
        })
        .unwrap_or_default();

    let mut headers = HashMap::new();
    for (name, value) in request.headers() {
        if let Ok(value) = value.to_str() {
            headers.insert(name.as_str().to_lowercase(), value.to_string());
        }
    }
    let content_type = headers
        .get(header::CONTENT_TYPE.as_str())
        .cloned()
        .unwrap_or_default();

    let bytes = match axum::body::to_bytes(request.into_body(), MAX_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to read request body");
            return status_response(ApiStatus::bad_request("Invalid body type"));
        }
    };

    let body = if bytes.is_empty() {
        None
    } else if content_type.contains("application/x-www-form-urlencoded") {
        // Browser form posts become a flat JSON object.
        let map: serde_json::Map<String, serde_json::Value> =
            url::form_urlencoded::parse(&bytes)
                .map(|(k, v)| (k.into_owned(), serde_json::Value::String(v.into_owned())))
                .collect();
        Some(serde_json::Value::Object(map))
    } else {
        match serde_json::from_slice(&bytes) {
            Ok(value) => Some(value),
            Err(e) => {
                if content_type.contains("json") {
                    tracing::debug!(error = %e, "Malformed JSON body");
                    return status_response(ApiStatus::bad_request("Invalid body type"));
                }
                None
            }
        }
    };

    let api_request = ApiRequest {
        method,
        path,
        query,
        headers,
        body,
    };

    let dispatcher = state.dispatcher.clone();
    match tokio::task::spawn_blocking(move || dispatcher.dispatch(api_request)).await {
        Ok(response) => to_http(response),
        Err(e) => {
            // A panicking handler must still answer with an envelope.
            tracing::error!(error = %e, "Handler task failed");
            status_response(ApiStatus::internal(e.to_string()))
        }
    }
}
