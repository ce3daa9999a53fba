/*!
send.rs

`netargs send` - one request against a framed-stream server.

  netargs send -f x=hello -f y=3 -f z
  netargs send --xml --addr 127.0.0.1:7001 -f --var_str=value
  netargs send --raw -f x=hello -f y=3

Flag keys:
  x        -> -x        (single character)
  var_str  -> --var_str
  -x / --x / _x / __x   kept as given

Repeating a key sends it as a list (the server appends one occurrence per item).
Exits non-zero when the server reports an exception.
*/

use anyhow::{Context, Result, bail};
use clap::Args;

use netargs::protocol::{Codec, DecodedMapping};
use netargs::{client, log_debug};

use crate::cmd::style::{Role, StyleOptions, color, field, status};

#[derive(Args, Debug)]
pub struct SendArgs {
    /// Server address (HOST:PORT)
    #[arg(short, long, default_value = "127.0.0.1:7000")]
    pub addr: String,

    /// Use the XML envelope instead of JSON
    #[arg(long)]
    pub xml: bool,

    /// Flag to send (KEY[=VALUE]), repeatable
    #[arg(
        short = 'f',
        long = "flag",
        value_name = "KEY[=VALUE]",
        allow_hyphen_values = true
    )]
    pub flags: Vec<String>,

    /// Print the response bytes as received
    #[arg(long)]
    pub raw: bool,

    /// Disable colour
    #[arg(long)]
    pub plain: bool,
}

/// `x` -> `-x`, `name` -> `--name`; keys already carrying `-` / `_` are kept.
fn flag_key(key: &str) -> String {
    if key.starts_with('-') || key.starts_with('_') {
        key.to_string()
    } else if key.chars().count() == 1 {
        format!("-{key}")
    } else {
        format!("--{key}")
    }
}

/// Build the request mapping from `KEY[=VALUE]` items; repeated keys aggregate.
pub fn build_mapping(flags: &[String]) -> Result<DecodedMapping> {
    let mut mapping = DecodedMapping::new();
    for item in flags {
        let (key, value) = item.split_once('=').unwrap_or((item.as_str(), ""));
        let key = key.trim();
        if key.trim_start_matches(['-', '_']).is_empty() {
            bail!("invalid --flag (empty key): {item}");
        }
        mapping.push(flag_key(key), value);
    }
    Ok(mapping)
}

pub fn execute_send(args: SendArgs) -> Result<()> {
    let codec = if args.xml { Codec::Xml } else { Codec::Json };
    let mapping = build_mapping(&args.flags)?;
    log_debug!("sending {codec} request to {}: {mapping}", args.addr);

    let payload = codec.encode_request(&mapping);
    let rt = tokio::runtime::Runtime::new().context("Failed to create Tokio runtime")?;
    let reply = rt.block_on(client::exchange(&args.addr, &payload))?;

    if args.raw {
        println!("{}", String::from_utf8_lossy(&reply));
        return Ok(());
    }

    let envelope = codec
        .decode_response(&reply)
        .with_context(|| format!("malformed {codec} response"))?;
    let style = if args.plain {
        StyleOptions::plain()
    } else {
        StyleOptions::detect()
    };
    println!("{}", field("status", status(!envelope.is_error(), &style), &style));
    println!(
        "{}",
        field("response", color(Role::Bold, envelope.response.to_string(), &style), &style)
    );
    if envelope.is_error() {
        println!(
            "{}",
            field("exception", color(Role::Error, &envelope.exception, &style), &style)
        );
        bail!("server reported an exception: {}", envelope.exception);
    }
    Ok(())
}
