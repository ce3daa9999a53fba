/*!
serve.rs

`netargs serve` - run the demo grammar behind a stream or HTTP listener.

Settings are layered: defaults < config file (`--config` or `NAP_CONFIG`) < CLI flags.

  netargs serve                          stream on 127.0.0.1:7000
  netargs serve --http --port 8080       HTTP GET on 127.0.0.1:8080
  netargs serve -c serve.yaml --response-delay 250
*/

use anyhow::Result;
use clap::Args;

use netargs::{ServeConfig, TransportKind, log_debug, transport};

use crate::cmd::demo;

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Config file (JSON or YAML); falls back to NAP_CONFIG
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<String>,

    /// Listen host
    #[arg(long)]
    pub host: Option<String>,

    /// Listen port
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Serve HTTP GET instead of the framed stream
    #[arg(long, conflicts_with = "transport")]
    pub http: bool,

    /// Transport to serve
    #[arg(long, value_enum)]
    pub transport: Option<TransportKind>,

    /// Handler returns pre-formatted text instead of a mapping
    #[arg(long)]
    pub no_autoformat: bool,

    /// Pause before sending each stream response (milliseconds)
    #[arg(long, value_name = "MS")]
    pub response_delay: Option<u64>,
}

/// Apply CLI overrides on top of the file / default settings.
pub fn effective_config(args: &ServeArgs) -> Result<ServeConfig> {
    let mut config = ServeConfig::resolve(args.config.as_deref())?;
    if let Some(host) = &args.host {
        config.host = host.clone();
    }
    if let Some(port) = args.port {
        config.port = port;
    }
    if args.http {
        config.transport = TransportKind::Http;
    } else if let Some(kind) = args.transport {
        config.transport = kind;
    }
    if args.no_autoformat {
        config.autoformat = false;
    }
    if let Some(ms) = args.response_delay {
        config.response_delay_ms = ms;
    }
    Ok(config)
}

pub fn execute_serve(args: ServeArgs) -> Result<()> {
    let config = effective_config(&args)?;
    log_debug!("effective config: {config:?}");
    transport::serve_blocking(&config, demo::dispatcher(config.autoformat))
}
