//! Dispatcher: decoded mapping -> argv -> grammar engine -> user handler -> envelope.
//!
//! Every failure after framing is recovered here and reported through a
//! complete envelope; the three failure classes are explicit variants of
//! `Failure` rather than nested error handling.

use std::panic::{AssertUnwindSafe, catch_unwind};

use serde_json::Value;

use crate::argv;
use crate::engine::ArgEngine;
use crate::protocol::{Codec, DecodedMapping};
use crate::utils::panic_message;
use crate::{log_debug, log_trace};

/// User logic invoked with the parsed arguments.
pub type Handler<P> = Box<dyn Fn(P) -> anyhow::Result<Value> + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Failure {
    /// Request bytes could not be decoded into a mapping.
    Decode(String),
    /// Tokenizer or grammar engine rejected the arguments.
    Grammar(String),
    /// The handler returned an error or panicked.
    Handler(String),
}

impl Failure {
    pub fn message(&self) -> &str {
        match self {
            Failure::Decode(m) | Failure::Grammar(m) | Failure::Handler(m) => m,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Failure::Decode(_) => "decode",
            Failure::Grammar(_) => "grammar",
            Failure::Handler(_) => "handler",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Reply(Value),
    Failed(Failure),
}

pub struct Dispatcher<E: ArgEngine> {
    engine: E,
    handler: Handler<E::Parsed>,
    autoformat: bool,
}

impl<E: ArgEngine> Dispatcher<E> {
    /// Autoformat is on by default.
    pub fn new<F>(engine: E, handler: F) -> Self
    where
        F: Fn(E::Parsed) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        Dispatcher {
            engine,
            handler: Box::new(handler),
            autoformat: true,
        }
    }

    pub fn with_autoformat(mut self, autoformat: bool) -> Self {
        self.autoformat = autoformat;
        self
    }

    pub fn autoformat(&self) -> bool {
        self.autoformat
    }

    /// Run grammar + handler on a ready argv (local command-line use).
    pub fn run(&self, argv: Vec<String>) -> Outcome {
        let parsed = match self.engine.parse(argv) {
            Ok(parsed) => parsed,
            Err(text) => {
                log_debug!("grammar rejected arguments: {text}");
                return Outcome::Failed(Failure::Grammar(text));
            }
        };
        match catch_unwind(AssertUnwindSafe(|| (self.handler)(parsed))) {
            Ok(Ok(value)) => Outcome::Reply(value),
            Ok(Err(err)) => {
                log_debug!("handler failed: {err:#}");
                Outcome::Failed(Failure::Handler(format!("{err:#}")))
            }
            Err(payload) => {
                let text = panic_message(payload.as_ref());
                log_debug!("handler panicked: {text}");
                Outcome::Failed(Failure::Handler(text))
            }
        }
    }

    pub fn dispatch(&self, mapping: &DecodedMapping) -> Outcome {
        let arg_string = argv::to_arg_string(mapping);
        log_trace!("argument string: {arg_string}");
        match argv::tokenize(&arg_string) {
            Ok(tokens) => self.run(tokens),
            Err(err) => Outcome::Failed(Failure::Grammar(format!("{err:#}"))),
        }
    }

    pub fn render(&self, codec: Codec, outcome: &Outcome) -> Vec<u8> {
        match outcome {
            Outcome::Reply(value) => codec.format(self.autoformat, Some(value), ""),
            Outcome::Failed(failure) => codec.format(self.autoformat, None, failure.message()),
        }
    }

    /// Full exchange for an already-decoded request (HTTP path).
    pub fn respond_to(&self, codec: Codec, mapping: &DecodedMapping) -> Vec<u8> {
        self.render(codec, &self.dispatch(mapping))
    }

    /// Full exchange for a framed raw message (stream path).
    pub fn respond(&self, codec: Codec, raw: &[u8]) -> Vec<u8> {
        let outcome = match codec.decode(raw) {
            Ok(mapping) => {
                log_debug!("decoded {codec} request: {mapping}");
                self.dispatch(&mapping)
            }
            Err(err) => Outcome::Failed(Failure::Decode(err.to_string())),
        };
        self.render(codec, &outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::ClapEngine;
    use crate::error::NOT_A_MAPPING;
    use anyhow::anyhow;
    use clap::Parser;
    use serde::Serialize;

    #[derive(Parser, Serialize, Debug)]
    #[command(name = "nap")]
    struct Vars {
        #[arg(long = "var_str")]
        var_str: Option<String>,
        #[arg(long = "var_int")]
        var_int: Option<i64>,
        #[arg(long = "var_true")]
        var_true: bool,
    }

    fn handler(args: Vars) -> anyhow::Result<Value> {
        if args.var_str.as_deref() == Some("damn") {
            let n = args.var_int.unwrap_or_default();
            return n
                .checked_div(0)
                .map(Value::from)
                .ok_or_else(|| anyhow!("division by zero"));
        }
        Ok(serde_json::to_value(&args)?)
    }

    fn dispatcher() -> Dispatcher<ClapEngine<Vars>> {
        Dispatcher::new(ClapEngine::new(), handler)
    }

    #[test]
    fn json_autoformat_success() {
        let out = dispatcher().respond(Codec::Json, br#"{"--var_str": "value", "--var_int": "2"}"#);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            r#"{"response": {"var_str": "value", "var_int": 2, "var_true": false}, "exception": "", "finished": 1}"#
        );
    }

    #[test]
    fn xml_autoformat_success_with_bare_flag() {
        let out = dispatcher().respond(
            Codec::Xml,
            b"<nap><__var_str>'hello world'</__var_str><__var_int>0</__var_int><__var_true></__var_true></nap>",
        );
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "<nap><response><var_str>hello world</var_str><var_int>0</var_int><var_true>true</var_true></response><exception></exception><finished>1</finished></nap>"
        );
    }

    #[test]
    fn handler_error_for_every_format() {
        let d = dispatcher();
        let xml = d.respond(Codec::Xml, b"<nap><__var_str>damn</__var_str><__var_int>5</__var_int></nap>");
        assert_eq!(
            xml,
            b"<nap><response></response><exception>division by zero</exception><finished>1</finished></nap>".to_vec()
        );
        let json = d.respond(Codec::Json, br#"{"--var_str": "damn", "--var_int": "5"}"#);
        assert_eq!(
            json,
            br#"{"response": "", "exception": "division by zero", "finished": 1}"#.to_vec()
        );
    }

    #[test]
    fn grammar_error_skips_handler() {
        let d = Dispatcher::new(ClapEngine::<Vars>::new(), |_args: Vars| -> anyhow::Result<Value> {
            panic!("handler must not run")
        });
        let mut m = DecodedMapping::new();
        m.push("--var_int", "2.2");
        match d.dispatch(&m) {
            Outcome::Failed(Failure::Grammar(text)) => assert!(text.contains("2.2")),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn decode_error_is_reported_in_envelope() {
        let out = dispatcher().respond(Codec::Xml, b"<root><_x>1</_x></root>");
        let env = Codec::Xml.decode_response(&out).unwrap();
        assert!(env.exception.contains("root must be named `nap`"));
        assert!(env.exception.contains("[root]"));
        assert_eq!(env.finished, 1);

        let out = dispatcher().respond(Codec::Json, b"{\"--var_str\": ");
        let env = Codec::Json.decode_response(&out).unwrap();
        assert!(env.exception.starts_with("malformed JSON"));
    }

    #[test]
    fn non_mapping_with_autoformat() {
        let d = Dispatcher::new(ClapEngine::<Vars>::new(), |_args: Vars| Ok(Value::from("text")));
        for codec in [Codec::Xml, Codec::Json] {
            let env = codec
                .decode_response(&d.respond_to(codec, &DecodedMapping::new()))
                .unwrap();
            assert_eq!(env.exception, NOT_A_MAPPING);
        }
    }

    #[test]
    fn verbatim_without_autoformat() {
        let d = Dispatcher::new(ClapEngine::<Vars>::new(), |args: Vars| {
            Ok(Value::String(format!("\"{}\"", args.var_int.unwrap_or_default())))
        })
        .with_autoformat(false);
        assert!(!d.autoformat());
        let out = d.respond(Codec::Json, br#"{"--var_int": 7}"#);
        assert_eq!(
            out,
            br#"{"response": "7", "exception": "", "finished": 1}"#.to_vec()
        );
    }

    #[test]
    fn handler_panic_is_captured() {
        let d = Dispatcher::new(ClapEngine::<Vars>::new(), |args: Vars| {
            let zero = std::hint::black_box(0i64);
            Ok(Value::from(args.var_int.unwrap_or(1) / zero))
        });
        match d.run(vec!["--var_int".into(), "5".into()]) {
            Outcome::Failed(Failure::Handler(text)) => assert!(text.contains("divide by zero")),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn unbalanced_quote_is_grammar_failure() {
        let mut m = DecodedMapping::new();
        m.push("--var_str", "'open");
        match dispatcher().dispatch(&m) {
            Outcome::Failed(failure) => assert_eq!(failure.kind(), "grammar"),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }
}
