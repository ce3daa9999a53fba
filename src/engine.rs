//! Flag-grammar engine seam.
//!
//! The protocol core only needs "argv in, typed value or error text out".
//! `ClapEngine` plugs any `clap::Parser` type into that seam.

use std::marker::PhantomData;

use clap::error::ErrorKind;

/// Turns an argv (without program name) into a parsed value or a textual error.
pub trait ArgEngine: Send + Sync + 'static {
    type Parsed: 'static;

    fn parse(&self, argv: Vec<String>) -> Result<Self::Parsed, String>;
}

/// Engine backed by a `#[derive(Parser)]` type.
pub struct ClapEngine<T> {
    _grammar: PhantomData<fn() -> T>,
}

impl<T: clap::Parser> ClapEngine<T> {
    pub fn new() -> Self {
        ClapEngine {
            _grammar: PhantomData,
        }
    }
}

impl<T: clap::Parser> Default for ClapEngine<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// First paragraph of a clap error on one line, without the `error: ` prefix
/// (usage and tips are dropped). Help / version output is kept whole.
pub fn clap_error_text(err: &clap::Error) -> String {
    let rendered = err.to_string();
    if matches!(
        err.kind(),
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion
    ) {
        return rendered.trim_end().to_string();
    }
    let paragraph: Vec<&str> = rendered
        .lines()
        .take_while(|line| !line.trim().is_empty())
        .map(str::trim)
        .collect();
    let text = paragraph.join(" ");
    text.strip_prefix("error: ").unwrap_or(&text).to_string()
}

impl<T: clap::Parser + 'static> ArgEngine for ClapEngine<T> {
    type Parsed = T;

    fn parse(&self, argv: Vec<String>) -> Result<T, String> {
        let program = T::command().get_name().to_string();
        T::try_parse_from(std::iter::once(program).chain(argv)).map_err(|e| clap_error_text(&e))
    }
}
