/*!
Transport listeners sharing one `Dispatcher`.

  stream : raw TCP, framed by the sniffed codec, one request per connection
  http   : GET + query string, codec chosen by path (`/xml` -> XML)

Both serve until the process exits. Nothing is shared between exchanges
except the dispatcher itself (engine + handler), which is read-only.
*/

pub mod http;
pub mod stream;

use std::sync::Arc;

use anyhow::{Context, Result};

use crate::config::{ServeConfig, TransportKind};
use crate::dispatch::Dispatcher;
use crate::engine::ArgEngine;
use crate::log_info;

/// Start the transport selected by `config`.
pub async fn serve<E: ArgEngine>(config: &ServeConfig, dispatcher: Dispatcher<E>) -> Result<()> {
    let addr = config.socket_addr()?;
    log_info!(
        "serving {} on {addr} (autoformat={}, response_delay={}ms)",
        config.transport,
        dispatcher.autoformat(),
        config.response_delay_ms
    );
    let dispatcher = Arc::new(dispatcher);
    match config.transport {
        TransportKind::Stream => stream::serve(addr, dispatcher, config.response_delay()).await,
        TransportKind::Http => http::serve(addr, dispatcher).await,
    }
}

/// Synchronous convenience wrapper: builds a Tokio runtime and blocks on `serve`.
pub fn serve_blocking<E: ArgEngine>(config: &ServeConfig, dispatcher: Dispatcher<E>) -> Result<()> {
    let rt = tokio::runtime::Runtime::new().context("Failed to create Tokio runtime")?;
    rt.block_on(serve(config, dispatcher))
}
