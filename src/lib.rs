//! netargs - serve a command-line argument grammar over the network.
//!
//! A client sends flag/value pairs in an XML (`<nap>..</nap>`) or JSON
//! envelope, over raw TCP or as an HTTP query string. The service rebuilds
//! the equivalent command line, runs it through a flag-grammar engine (clap),
//! calls the user handler and answers in the envelope format it was asked in.
//!
//! ```no_run
//! use clap::Parser;
//! use netargs::{ClapEngine, Dispatcher, ServeConfig};
//!
//! #[derive(Parser, serde::Serialize)]
//! struct Args {
//!     #[arg(short = 'x')]
//!     x: String,
//! }
//!
//! let dispatcher = Dispatcher::new(ClapEngine::<Args>::new(), |args: Args| {
//!     Ok(serde_json::to_value(&args)?)
//! });
//! netargs::transport::serve_blocking(&ServeConfig::default(), dispatcher).unwrap();
//! ```

pub mod argv;
pub mod client;
pub mod config;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod protocol;
pub mod transport;
pub mod utils;

pub use config::{ServeConfig, TransportKind};
pub use dispatch::{Dispatcher, Failure, Outcome};
pub use engine::{ArgEngine, ClapEngine};
pub use error::ProtocolError;
pub use protocol::{Codec, DecodedMapping, FlagValue, ResponseEnvelope};
