/*!
style.rs

Human-readable output helpers for the `send` / `run` commands.

  - Colour is on unless `NO_COLOR` is set or `--plain` is given.
  - Helpers return strings; callers decide where to print.
  - Machine output (`--raw`) never goes through here.
*/

#[derive(Debug, Clone, Copy)]
pub struct StyleOptions {
    pub use_color: bool,
}

impl StyleOptions {
    pub fn detect() -> Self {
        StyleOptions {
            use_color: std::env::var_os("NO_COLOR").is_none(),
        }
    }

    pub fn plain() -> Self {
        StyleOptions { use_color: false }
    }
}

#[derive(Debug, Clone, Copy)]
pub enum Role {
    Success,
    Error,
    Dim,
    Bold,
}

pub fn color(role: Role, text: impl AsRef<str>, style: &StyleOptions) -> String {
    if !style.use_color {
        return text.as_ref().to_string();
    }
    let code = match role {
        Role::Success => "38;5;82",
        Role::Error => "38;5;196",
        Role::Dim => "2",
        Role::Bold => "1",
    };
    format!("\x1b[{code}m{}\x1b[0m", text.as_ref())
}

/// `label` padded to a fixed column, then `value`.
pub fn field(label: &str, value: impl AsRef<str>, style: &StyleOptions) -> String {
    format!(
        "{} {}",
        color(Role::Dim, format!("{label:<10}"), style),
        value.as_ref()
    )
}

/// One-line status marker: `ok` in green or `error` in red.
pub fn status(ok: bool, style: &StyleOptions) -> String {
    if ok {
        color(Role::Success, "ok", style)
    } else {
        color(Role::Error, "error", style)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_has_no_escapes() {
        let style = StyleOptions::plain();
        assert_eq!(color(Role::Bold, "x", &style), "x");
        assert_eq!(status(false, &style), "error");
        assert_eq!(field("exception", "boom", &style), "exception  boom");
    }

    #[test]
    fn colored_wraps_text() {
        let style = StyleOptions { use_color: true };
        let s = color(Role::Error, "bad", &style);
        assert!(s.starts_with("\x1b[38;5;196m"));
        assert!(s.ends_with("\x1b[0m"));
    }
}
