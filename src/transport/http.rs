//! HTTP listener: `GET /[xml]?flag=value&flag=value&bare-flag`.
//!
//! Query parameters map straight to a `DecodedMapping` (repeats aggregate,
//! valueless parameters are bare flags). A `/xml` path segment selects the
//! XML envelope; any other path answers in JSON.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use axum::extract::State;
use axum::http::{Method, StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use tokio::net::TcpListener;

use crate::dispatch::Dispatcher;
use crate::engine::ArgEngine;
use crate::protocol::{Codec, DecodedMapping};
use crate::{log_debug, log_error, log_info};

pub fn codec_for_path(path: &str) -> Codec {
    if path.split('/').any(|segment| segment == "xml") {
        Codec::Xml
    } else {
        Codec::Json
    }
}

pub fn mapping_from_query(query: Option<&str>) -> DecodedMapping {
    let query = query.unwrap_or_default();
    url::form_urlencoded::parse(query.as_bytes())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}

async fn handle_request<E: ArgEngine>(
    State(dispatcher): State<Arc<Dispatcher<E>>>,
    method: Method,
    uri: Uri,
) -> Response {
    if method != Method::GET {
        return StatusCode::METHOD_NOT_ALLOWED.into_response();
    }
    let codec = codec_for_path(uri.path());
    let mapping = mapping_from_query(uri.query());
    log_debug!("GET {uri}: {codec} request {mapping}");

    match tokio::task::spawn_blocking(move || dispatcher.respond_to(codec, &mapping)).await {
        Ok(body) => ([(header::CONTENT_TYPE, codec.content_type())], body).into_response(),
        Err(e) => {
            log_error!("dispatch task failed for {uri}: {e}");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

pub fn router<E: ArgEngine>(dispatcher: Arc<Dispatcher<E>>) -> Router {
    Router::new()
        .fallback(handle_request::<E>)
        .with_state(dispatcher)
}

/// Serve on an already-bound listener until the process exits.
pub async fn run<E: ArgEngine>(listener: TcpListener, dispatcher: Arc<Dispatcher<E>>) -> Result<()> {
    axum::serve(listener, router(dispatcher))
        .await
        .context("HTTP server error")
}

pub async fn serve<E: ArgEngine>(addr: SocketAddr, dispatcher: Arc<Dispatcher<E>>) -> Result<()> {
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind HTTP listener on {addr}"))?;
    log_info!("HTTP listener on http://{}", listener.local_addr()?);
    run(listener, dispatcher).await
}
