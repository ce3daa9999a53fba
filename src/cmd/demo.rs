/*!
demo.rs - grammar + handler served by the `netargs` binary.

Grammar:
  -x TEXT   (required)
  -y INT    (required)
  -z        (flag)

Handler echoes the parsed arguments. `-x damn` divides `-y` by zero and
fails with "division by zero", handy for exercising the error path.
*/

use anyhow::anyhow;
use clap::Parser;
use serde::Serialize;
use serde_json::Value;

use netargs::{ClapEngine, Dispatcher};

#[derive(Parser, Serialize, Debug, Clone, PartialEq)]
#[command(name = "nap", about = "netargs demo grammar")]
pub struct DemoArgs {
    /// Free text value
    #[arg(short = 'x', value_name = "TEXT")]
    pub x: String,

    /// Integer value
    #[arg(short = 'y', value_name = "INT", allow_negative_numbers = true)]
    pub y: i64,

    /// Boolean flag
    #[arg(short = 'z')]
    pub z: bool,
}

/// With `autoformat` the handler returns a mapping; otherwise pre-formatted
/// text, quoted as a JSON string so it is a valid `response` in either envelope.
pub fn handle(args: DemoArgs, autoformat: bool) -> anyhow::Result<Value> {
    if args.x == "damn" {
        let quotient = args
            .y
            .checked_div(0)
            .ok_or_else(|| anyhow!("division by zero"))?;
        return Ok(Value::from(quotient));
    }
    if autoformat {
        Ok(serde_json::to_value(&args)?)
    } else {
        Ok(Value::String(serde_json::to_string(&format!("{args:?}"))?))
    }
}

pub fn dispatcher(autoformat: bool) -> Dispatcher<ClapEngine<DemoArgs>> {
    Dispatcher::new(ClapEngine::new(), move |args| handle(args, autoformat))
        .with_autoformat(autoformat)
}
