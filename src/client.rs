//! Minimal client for the framed-stream transport.
//!
//! One connection per request: write the envelope, then read until the
//! server closes the connection.

use anyhow::{Context, Result};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use crate::protocol::{Codec, DecodedMapping, ResponseEnvelope};

/// Send raw request bytes and return the raw response bytes.
pub async fn exchange(addr: &str, payload: &[u8]) -> Result<Vec<u8>> {
    let mut stream = TcpStream::connect(addr)
        .await
        .with_context(|| format!("failed to connect to {addr}"))?;
    stream
        .write_all(payload)
        .await
        .context("failed to send request")?;
    let mut reply = Vec::new();
    stream
        .read_to_end(&mut reply)
        .await
        .context("failed to read response")?;
    if reply.is_empty() {
        anyhow::bail!("server closed the connection without a response");
    }
    Ok(reply)
}

/// Encode `mapping` with `codec`, exchange it, and decode the envelope.
pub async fn request(addr: &str, codec: Codec, mapping: &DecodedMapping) -> Result<ResponseEnvelope> {
    let reply = exchange(addr, &codec.encode_request(mapping)).await?;
    codec
        .decode_response(&reply)
        .with_context(|| format!("malformed {codec} response"))
}
