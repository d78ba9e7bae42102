use ahash::AHashMap;

use super::{Key, RawValue, Section};
use crate::error::{Error, Result};

lazy_static::lazy_static! {
    /// strings accepted as boolean, matched after lowercasing
    static ref BOOL_TOKENS: AHashMap<&'static str, bool> = AHashMap::from_iter([
        ("t", true),
        ("true", true),
        ("y", true),
        ("yes", true),
        ("on", true),
        ("1", true),
        ("f", false),
        ("false", false),
        ("n", false),
        ("no", false),
        ("off", false),
        ("0", false),
    ]);
}

/// flattened key/value map of a section after inheritance
#[derive(Debug, Clone, Default)]
pub struct SectionView {
    values: Section,
}

impl PartialEq for SectionView {
    fn eq(&self, other: &Self) -> bool {
        *self.values == *other.values
    }
}

impl Eq for SectionView {}

impl SectionView {
    pub(super) fn new(values: Section) -> Self {
        Self { values }
    }

    pub(super) fn into_values(self) -> Section {
        self.values
    }

    /// number of keys
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// value exactly as stored by the parser
    pub fn get_raw(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(RawValue::as_str)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(Key::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    fn lookup(&self, key: &str) -> Result<&str> {
        self.get_raw(key).ok_or_else(|| Error::KeyNotFound {
            key: key.to_string(),
        })
    }

    /// Get value as a string, one pair of surrounding `'` or `"` is removed.
    ///
    /// Quotes are only looked for at the start and end of the whole value,
    /// so a multi line value is unquoted as a single string.
    pub fn get_string(&self, key: &str) -> Result<String> {
        let raw = self.lookup(key)?;

        if raw.len() > 1 {
            for quote in ['\'', '"'] {
                if let Some(inner) = raw
                    .strip_prefix(quote)
                    .and_then(|s| s.strip_suffix(quote))
                {
                    return Ok(inner.to_string());
                }
            }
        }

        return Ok(raw.to_string());
    }

    pub fn get_bool(&self, key: &str) -> Result<bool> {
        let raw = self.lookup(key)?;

        return BOOL_TOKENS
            .get(raw.to_lowercase().as_str())
            .copied()
            .ok_or_else(|| Error::InvalidBool {
                key: key.to_string(),
                value: raw.to_string(),
            });
    }

    /// base 10 integer, with an optional sign
    pub fn get_int(&self, key: &str) -> Result<i64> {
        let raw = self.lookup(key)?;

        return raw.parse::<i64>().map_err(|source| Error::InvalidInt {
            key: key.to_string(),
            value: raw.to_string(),
            source,
        });
    }

    pub fn get_float(&self, key: &str) -> Result<f64> {
        let raw = self.lookup(key)?;

        return fast_float::parse::<f64, _>(raw).map_err(|_| Error::InvalidFloat {
            key: key.to_string(),
            value: raw.to_string(),
        });
    }
}

#[cfg(test)]
fn view(pairs: &[(&str, &str)]) -> SectionView {
    SectionView::new(
        pairs
            .iter()
            .map(|(k, v)| (Key::from(*k), RawValue::from(*v)))
            .collect(),
    )
}

#[test]
fn test_get_string_quotes() {
    let v = view(&[
        ("string", "foo-bar-baz"),
        ("single", "'foo-bar-baz'"),
        ("double", "\"foo-bar-baz\""),
        ("mixed", "'foo-bar-baz\""),
        ("lone", "'"),
        ("empty_quotes", "''"),
        ("nested", "\"'x'\""),
        ("multi", "'foo\nbar'"),
    ]);

    assert_eq!(v.get_string("string").unwrap(), "foo-bar-baz");
    assert_eq!(v.get_string("single").unwrap(), "foo-bar-baz");
    assert_eq!(v.get_string("double").unwrap(), "foo-bar-baz");
    assert_eq!(v.get_string("mixed").unwrap(), "'foo-bar-baz\"");
    assert_eq!(v.get_string("lone").unwrap(), "'");
    assert_eq!(v.get_string("empty_quotes").unwrap(), "");
    // only one pair is removed
    assert_eq!(v.get_string("nested").unwrap(), "'x'");
    assert_eq!(v.get_string("multi").unwrap(), "foo\nbar");
}

#[test]
fn test_get_bool_tokens() {
    const TRUE: &[&str] = &["yes", "on", "1", "true", "y", "t", "YES", "On", "TRUE", "T"];
    const FALSE: &[&str] = &["no", "off", "0", "false", "n", "f", "NO", "Off", "False", "F"];

    for &token in TRUE {
        assert_eq!(view(&[("k", token)]).get_bool("k").unwrap(), true, "{token}");
    }
    for &token in FALSE {
        assert_eq!(view(&[("k", token)]).get_bool("k").unwrap(), false, "{token}");
    }

    for token in ["2", "enabled", "", "yes please"] {
        let err = view(&[("k", token)]).get_bool("k").unwrap_err();
        assert!(matches!(err, Error::InvalidBool { .. }), "{token}");
    }
}

#[test]
fn test_get_int() {
    let v = view(&[("port", "5672"), ("neg", "-12"), ("pos", "+7"), ("hex", "0x10"), ("f", "1.5")]);

    assert_eq!(v.get_int("port").unwrap(), 5672);
    assert_eq!(v.get_int("neg").unwrap(), -12);
    assert_eq!(v.get_int("pos").unwrap(), 7);
    assert!(matches!(v.get_int("hex").unwrap_err(), Error::InvalidInt { .. }));
    assert!(matches!(v.get_int("f").unwrap_err(), Error::InvalidInt { .. }));
}

#[test]
fn test_get_float() {
    let v = view(&[("ratio", "0.75"), ("exp", "1e3"), ("int", "42"), ("bad", "1.2.3"), ("trail", "3.5kg")]);

    assert_eq!(v.get_float("ratio").unwrap(), 0.75);
    assert_eq!(v.get_float("exp").unwrap(), 1000.0);
    assert_eq!(v.get_float("int").unwrap(), 42.0);
    assert!(matches!(v.get_float("bad").unwrap_err(), Error::InvalidFloat { .. }));
    assert!(matches!(v.get_float("trail").unwrap_err(), Error::InvalidFloat { .. }));
}

#[test]
fn test_missing_key_is_distinct() {
    let v = view(&[("flag", "maybe")]);

    for err in [
        v.get_string("nope").unwrap_err(),
        v.get_bool("nope").unwrap_err(),
        v.get_int("nope").unwrap_err(),
        v.get_float("nope").unwrap_err(),
    ] {
        assert!(err.is_key_not_found());
        assert!(!err.is_invalid_value());
    }

    let err = v.get_bool("flag").unwrap_err();
    assert!(!err.is_key_not_found());
    assert!(err.is_invalid_value());
}

#[test]
fn test_iteration() {
    let v = view(&[("a", "1"), ("b", "2")]);

    assert_eq!(v.len(), 2);
    assert!(v.contains_key("a"));
    assert!(!v.contains_key("c"));

    let mut pairs: Vec<_> = v.iter().collect();
    pairs.sort();
    assert_eq!(pairs, [("a", "1"), ("b", "2")]);

    let mut keys: Vec<_> = v.keys().collect();
    keys.sort();
    assert_eq!(keys, ["a", "b"]);
}
