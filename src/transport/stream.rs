//! Framed-stream listener: one request per TCP connection, no keep-alive.
//!
//! Bytes accumulate until the sniffed codec reports the message complete.
//! Unknown leading bytes or an early close end the connection without a reply.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use crate::dispatch::Dispatcher;
use crate::engine::ArgEngine;
use crate::error::ProtocolError;
use crate::protocol::Codec;
use crate::{log_debug, log_info, log_warn};

const CHUNK: usize = 4096;

/// Per-connection framing state.
#[derive(Debug)]
pub struct Connection {
    peer: SocketAddr,
    buffer: Vec<u8>,
    codec: Option<Codec>,
}

impl Connection {
    pub fn new(peer: SocketAddr) -> Self {
        Connection {
            peer,
            buffer: Vec::new(),
            codec: None,
        }
    }

    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    /// Append a chunk; returns the codec once the message is complete.
    pub fn feed(&mut self, chunk: &[u8]) -> Result<Option<Codec>, ProtocolError> {
        self.buffer.extend_from_slice(chunk);
        if self.codec.is_none() {
            self.codec = Codec::sniff(&self.buffer)?;
        }
        Ok(self.codec.filter(|codec| codec.is_complete(&self.buffer)))
    }

    /// Read until complete. No timeout: a silent peer stalls only this connection.
    pub async fn read_message<R>(&mut self, reader: &mut R) -> Result<Codec, ProtocolError>
    where
        R: AsyncRead + Unpin,
    {
        let mut chunk = [0u8; CHUNK];
        loop {
            let n = reader.read(&mut chunk).await?;
            if n == 0 {
                return Err(ProtocolError::Incomplete {
                    received: self.buffer.len(),
                });
            }
            if let Some(codec) = self.feed(&chunk[..n])? {
                return Ok(codec);
            }
        }
    }

    pub fn into_message(self) -> Vec<u8> {
        self.buffer
    }
}

async fn handle_connection<E: ArgEngine>(
    mut socket: TcpStream,
    peer: SocketAddr,
    dispatcher: Arc<Dispatcher<E>>,
    delay: Duration,
) -> Result<()> {
    let mut conn = Connection::new(peer);
    let codec = conn.read_message(&mut socket).await?;
    let raw = conn.into_message();
    log_debug!("{peer}: {codec} message complete ({} bytes)", raw.len());

    let reply = tokio::task::spawn_blocking(move || dispatcher.respond(codec, &raw))
        .await
        .context("dispatch task failed")?;

    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
    socket.write_all(&reply).await?;
    socket.shutdown().await?;
    Ok(())
}

/// Serve on an already-bound listener, one task per connection, forever.
pub async fn run<E: ArgEngine>(
    listener: TcpListener,
    dispatcher: Arc<Dispatcher<E>>,
    delay: Duration,
) -> Result<()> {
    loop {
        let (socket, peer) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(e) => {
                log_warn!("accept failed: {e}");
                continue;
            }
        };
        log_debug!("{peer}: connected");
        let dispatcher = Arc::clone(&dispatcher);
        tokio::spawn(async move {
            if let Err(e) = handle_connection(socket, peer, dispatcher, delay).await {
                log_warn!("{peer}: exchange aborted: {e:#}");
            }
        });
    }
}

pub async fn serve<E: ArgEngine>(
    addr: SocketAddr,
    dispatcher: Arc<Dispatcher<E>>,
    delay: Duration,
) -> Result<()> {
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind stream listener on {addr}"))?;
    log_info!("stream listener on {}", listener.local_addr()?);
    run(listener, dispatcher, delay).await
}
