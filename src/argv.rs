//! Argument reconstruction: `DecodedMapping` -> command-line string -> argv.
//!
//! The string is what a user would have typed; tokenizing it with shell
//! rules (`shell_words`) yields the argv handed to the flag-grammar engine.
//! Quote characters inside values are left untouched here so the tokenizer
//! can honour single vs. double quoting (one level nested in the other).

use anyhow::{Context, Result};

use crate::protocol::{DecodedMapping, FlagValue};

/// `__foo` -> `--foo`, `_x` -> `-x`; keys without leading underscores pass through.
pub fn normalize_flag(key: &str) -> String {
    let stripped = key.trim_start_matches('_');
    let dashes = key.len() - stripped.len();
    format!("{}{}", "-".repeat(dashes), stripped)
}

fn push_pair(pieces: &mut Vec<String>, flag: &str, value: &str) {
    if value.is_empty() {
        pieces.push(flag.to_string());
    } else {
        pieces.push(format!("{flag} {value}"));
    }
}

/// Join every key / value in mapping order into one argument string.
pub fn to_arg_string(mapping: &DecodedMapping) -> String {
    let mut pieces = Vec::with_capacity(mapping.len());
    for (key, value) in mapping.iter() {
        let flag = normalize_flag(key);
        match value {
            FlagValue::List(items) if !items.is_empty() => {
                for item in items {
                    push_pair(&mut pieces, &flag, item);
                }
            }
            FlagValue::List(_) => pieces.push(flag),
            FlagValue::Single(s) => push_pair(&mut pieces, &flag, s),
        }
    }
    pieces.join(" ")
}

/// Shell-style split; an unbalanced quote is an error.
pub fn tokenize(arg_string: &str) -> Result<Vec<String>> {
    shell_words::split(arg_string)
        .with_context(|| format!("cannot tokenize arguments: {arg_string}"))
}

/// `to_arg_string` followed by `tokenize`.
pub fn reconstruct(mapping: &DecodedMapping) -> Result<Vec<String>> {
    tokenize(&to_arg_string(mapping))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapping(pairs: &[(&str, &str)]) -> DecodedMapping {
        pairs.iter().copied().collect()
    }

    #[test]
    fn normalize_underscores() {
        assert_eq!(normalize_flag("_x"), "-x");
        assert_eq!(normalize_flag("__foo"), "--foo");
        assert_eq!(normalize_flag("__var_str"), "--var_str");
        assert_eq!(normalize_flag("--bar"), "--bar");
        assert_eq!(normalize_flag("plain"), "plain");
    }

    #[test]
    fn normalize_is_idempotent() {
        for key in ["_x", "__foo", "--bar", "-y", "z", "__a_b_"] {
            let once = normalize_flag(key);
            assert_eq!(normalize_flag(&once), once);
        }
    }

    #[test]
    fn repeated_key_yields_one_pair_per_occurrence() {
        let m = mapping(&[("_y", "1"), ("_y", "11"), ("_y", "111"), ("_z", "5")]);
        assert_eq!(to_arg_string(&m), "-y 1 -y 11 -y 111 -z 5");
        let argv = reconstruct(&m).unwrap();
        assert_eq!(argv.iter().filter(|t| *t == "-y").count(), 3);
        assert_eq!(argv, vec!["-y", "1", "-y", "11", "-y", "111", "-z", "5"]);
    }

    #[test]
    fn empty_value_emits_bare_flag() {
        let m = mapping(&[("__var_true", ""), ("__var_int", "0")]);
        assert_eq!(to_arg_string(&m), "--var_true --var_int 0");
    }

    #[test]
    fn empty_list_slot_emits_bare_flag() {
        let mut m = DecodedMapping::new();
        m.insert("-v", vec![String::new(), "2".to_string()]);
        m.insert("-q", Vec::<String>::new());
        assert_eq!(to_arg_string(&m), "-v -v 2 -q");
    }

    #[test]
    fn multi_token_values_split_on_whitespace() {
        let m = mapping(&[("-x", "1 2 3"), ("-x", "11 22 33")]);
        assert_eq!(
            reconstruct(&m).unwrap(),
            vec!["-x", "1", "2", "3", "-x", "11", "22", "33"]
        );
    }

    #[test]
    fn quotes_are_left_for_the_tokenizer() {
        let m = mapping(&[("--s", "'hello world'"), ("--d", "\"say 'hi'\"")]);
        assert_eq!(to_arg_string(&m), "--s 'hello world' --d \"say 'hi'\"");
        assert_eq!(
            reconstruct(&m).unwrap(),
            vec!["--s", "hello world", "--d", "say 'hi'"]
        );
    }

    #[test]
    fn unbalanced_quote_fails() {
        let m = mapping(&[("--s", "'open")]);
        assert!(reconstruct(&m).is_err());
    }

    #[test]
    fn empty_mapping_is_empty_argv() {
        assert!(reconstruct(&DecodedMapping::new()).unwrap().is_empty());
    }
}
