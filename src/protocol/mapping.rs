//! `DecodedMapping`: ordered flag-name -> value(s) map produced by every decoder.

use std::fmt;

/// Value carried by one key. An empty `Single` stands for a bare (valueless) flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlagValue {
    Single(String),
    List(Vec<String>),
}

impl FlagValue {
    /// True when the key carries no value at all (bare flag).
    pub fn is_empty(&self) -> bool {
        match self {
            FlagValue::Single(s) => s.is_empty(),
            FlagValue::List(items) => items.is_empty(),
        }
    }

    /// Number of occurrences this value represents on the wire.
    pub fn occurrences(&self) -> usize {
        match self {
            FlagValue::Single(_) => 1,
            FlagValue::List(items) => items.len(),
        }
    }
}

impl From<&str> for FlagValue {
    fn from(s: &str) -> Self {
        FlagValue::Single(s.to_string())
    }
}

impl From<String> for FlagValue {
    fn from(s: String) -> Self {
        FlagValue::Single(s)
    }
}

impl From<Vec<String>> for FlagValue {
    fn from(items: Vec<String>) -> Self {
        FlagValue::List(items)
    }
}

/// Insertion-ordered mapping. Keys are unique; repeated arrivals aggregate into a list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodedMapping {
    entries: Vec<(String, FlagValue)>,
}

impl DecodedMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one occurrence of `key`.
    ///
    /// First occurrence stores a scalar; the first duplicate promotes it to a
    /// two-element list; later duplicates append.
    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => match slot {
                FlagValue::List(items) => items.push(value),
                FlagValue::Single(existing) => {
                    let first = std::mem::take(existing);
                    *slot = FlagValue::List(vec![first, value]);
                }
            },
            None => self.entries.push((key, FlagValue::Single(value))),
        }
    }

    /// Set `key` to `value` as-is, replacing any previous value in place.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<FlagValue>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => *slot = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&FlagValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FlagValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Aggregating collection: `(k, v)` pairs behave like repeated `push` calls.
impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for DecodedMapping {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut mapping = DecodedMapping::new();
        for (k, v) in iter {
            mapping.push(k, v);
        }
        mapping
    }
}

impl fmt::Display for DecodedMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (k, v)) in self.entries.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            match v {
                FlagValue::Single(s) => write!(f, "{k}={s:?}")?,
                FlagValue::List(items) => write!(f, "{k}={items:?}")?,
            }
        }
        f.write_str("}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_promotes_then_appends() {
        let mut m = DecodedMapping::new();
        m.push("-x", "1");
        assert_eq!(m.get("-x"), Some(&FlagValue::Single("1".into())));
        m.push("-x", "2");
        assert_eq!(
            m.get("-x"),
            Some(&FlagValue::List(vec!["1".into(), "2".into()]))
        );
        m.push("-x", "3");
        assert_eq!(m.get("-x").map(FlagValue::occurrences), Some(3));
        assert_eq!(m.len(), 1);
    }

    #[test]
    fn order_is_first_arrival() {
        let m: DecodedMapping = vec![("b", "1"), ("a", "2"), ("b", "3")]
            .into_iter()
            .collect();
        assert_eq!(m.keys().collect::<Vec<_>>(), vec!["b", "a"]);
    }

    #[test]
    fn insert_replaces_in_place() {
        let mut m = DecodedMapping::new();
        m.insert("a", "1");
        m.insert("b", "2");
        m.insert("a", vec!["x".to_string(), "y".to_string()]);
        assert_eq!(m.keys().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(m.get("a").map(FlagValue::occurrences), Some(2));
    }

    #[test]
    fn empty_values() {
        assert!(FlagValue::from("").is_empty());
        assert!(FlagValue::List(vec![]).is_empty());
        assert!(!FlagValue::List(vec![String::new()]).is_empty());
    }

    #[test]
    fn display_lists_entries() {
        let m: DecodedMapping = vec![("-x", "1"), ("-z", "")].into_iter().collect();
        assert_eq!(m.to_string(), r#"{-x="1", -z=""}"#);
    }
}
