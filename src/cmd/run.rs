/*!
run.rs

`netargs run` - local mode: parse the trailing arguments with the demo
grammar and call the handler in-process, no listener involved.

  netargs run -- -x hello -y 3 -z
  netargs run --envelope json -- -x damn -y 1

With `--envelope` the outcome is printed exactly as a server would send it.
*/

use anyhow::{Result, bail};
use clap::{Args, ValueEnum};

use netargs::{Codec, Outcome};

use crate::cmd::demo;
use crate::cmd::style::{Role, StyleOptions, color, field, status};

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum EnvelopeKind {
    Json,
    Xml,
}

impl From<EnvelopeKind> for Codec {
    fn from(kind: EnvelopeKind) -> Self {
        match kind {
            EnvelopeKind::Json => Codec::Json,
            EnvelopeKind::Xml => Codec::Xml,
        }
    }
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Handler returns pre-formatted text instead of a mapping
    #[arg(long)]
    pub no_autoformat: bool,

    /// Print the outcome as a response envelope
    #[arg(long, value_enum, value_name = "KIND")]
    pub envelope: Option<EnvelopeKind>,

    /// Disable colour
    #[arg(long)]
    pub plain: bool,

    /// Arguments for the demo grammar
    #[arg(last = true, value_name = "ARGS")]
    pub argv: Vec<String>,
}

pub fn execute_run(args: RunArgs) -> Result<()> {
    let dispatcher = demo::dispatcher(!args.no_autoformat);
    let outcome = dispatcher.run(args.argv);

    if let Some(kind) = args.envelope {
        let bytes = dispatcher.render(kind.into(), &outcome);
        println!("{}", String::from_utf8_lossy(&bytes));
        return match outcome {
            Outcome::Reply(_) => Ok(()),
            Outcome::Failed(failure) => bail!("{} failure", failure.kind()),
        };
    }

    let style = if args.plain {
        StyleOptions::plain()
    } else {
        StyleOptions::detect()
    };
    match outcome {
        Outcome::Reply(value) => {
            println!("{}", field("status", status(true, &style), &style));
            println!(
                "{}",
                field("response", color(Role::Bold, value.to_string(), &style), &style)
            );
            Ok(())
        }
        Outcome::Failed(failure) => {
            println!("{}", field("status", status(false, &style), &style));
            println!(
                "{}",
                field(failure.kind(), color(Role::Error, failure.message(), &style), &style)
            );
            bail!("{}", failure.message())
        }
    }
}
