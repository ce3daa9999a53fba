/*!
Subcommands of the `netargs` binary.

  serve.rs   (ServeArgs + execute_serve)  listener for the demo grammar
  send.rs    (SendArgs  + execute_send)   one request against a stream server
  run.rs     (RunArgs   + execute_run)    local mode, no network
  demo.rs    grammar + handler shared by serve / run
  style.rs   human output helpers

Each subcommand module exposes one `execute_*` returning `anyhow::Result<()>`.
*/

pub mod demo;
pub mod run;
pub mod send;
pub mod serve;
pub mod style;

pub use run::{RunArgs, execute_run};
pub use send::{SendArgs, execute_send};
pub use serve::{ServeArgs, execute_serve};
