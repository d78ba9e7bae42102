//! Parsed INI configuration with single parent section inheritance.
//!
//! A [`Config`] is built once by one of the load functions and never
//! mutated afterwards. Querying a section with [`Config::section`] walks
//! the declared parent chain and returns an owned [`SectionView`] where
//! the nearest section defining a key wins.

mod ini_pest;
mod reader;
mod view;

pub use view::SectionView;

use std::borrow::Borrow;
use std::fmt;
use std::path::Path;

use ahash::AHashMap;
use tokio::io::AsyncRead;

use crate::error::Result;

/// name of a section, case sensitive
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SectionName(String);

/// key inside a section, case sensitive
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Key(String);

/// unprocessed value as written in the file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawValue(String);

macro_rules! string_newtype {
    ($($t:ident),*) => {
        $(
            impl $t {
                pub fn new(s: impl Into<String>) -> Self {
                    Self(s.into())
                }

                pub fn as_str(&self) -> &str {
                    &self.0
                }

                pub fn into_string(self) -> String {
                    self.0
                }
            }

            impl Borrow<str> for $t {
                fn borrow(&self) -> &str {
                    &self.0
                }
            }

            impl AsRef<str> for $t {
                fn as_ref(&self) -> &str {
                    &self.0
                }
            }

            impl fmt::Display for $t {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(&self.0)
                }
            }

            impl From<&str> for $t {
                fn from(s: &str) -> Self {
                    Self(s.to_string())
                }
            }
        )*
    };
}

string_newtype!(SectionName, Key, RawValue);

pub(crate) type Section = AHashMap<Key, RawValue>;

#[derive(Debug, Default)]
pub struct Config {
    /// child section to its declared parent
    inheritance: AHashMap<SectionName, SectionName>,
    sections: AHashMap<SectionName, Section>,
}

impl Config {
    /// open and parse a file, the file is closed before returning
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        log::debug!("loading config '{}'", path.display());

        let file = std::fs::File::open(path)?;

        return Self::from_reader(std::io::BufReader::new(file));
    }

    /// async version of [`Config::load`]
    pub async fn load_async(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        log::debug!("loading config '{}'", path.display());

        let file = tokio::fs::File::open(path).await?;

        return Self::async_parse(file).await;
    }

    /// parse a config held in memory
    pub fn parse(input: &str) -> Result<Self> {
        return Self::from_reader(input.as_bytes());
    }

    /// parse from a buffered reader, line by line
    pub fn from_reader<R: std::io::BufRead>(reader: R) -> Result<Self> {
        return reader::read_blocking(reader);
    }

    /// parse from an async reader, line by line
    pub async fn async_parse<R: AsyncRead + Unpin>(reader: R) -> Result<Self> {
        return reader::read_async(reader).await;
    }

    /// names of all declared sections, in no particular order
    pub fn section_list(&self) -> Vec<&str> {
        self.sections.keys().map(SectionName::as_str).collect()
    }

    pub fn has_section(&self, name: &str) -> bool {
        self.sections.contains_key(name)
    }

    /// declared parent of a section
    pub fn parent(&self, name: &str) -> Option<&str> {
        self.inheritance.get(name).map(SectionName::as_str)
    }

    /// resolve a section against its ancestors.
    ///
    /// Never fails: an unknown section resolves to whatever its parents
    /// provide, which is an empty view when it has no declared parent.
    pub fn section(&self, name: &str) -> SectionView {
        // start from the fully resolved parent, or nothing
        let mut values = match self.inheritance.get(name) {
            Some(parent) => self.section(parent.as_str()).into_values(),
            None => Section::new(),
        };

        // own keys override inherited ones
        if let Some(own) = self.sections.get(name) {
            for (k, v) in own {
                values.insert(k.clone(), v.clone());
            }
        }

        return SectionView::new(values);
    }

    /// checks that no parent chain loops back onto itself
    fn check_inheritance(&self) -> Result<()> {
        for start in self.inheritance.keys() {
            let mut chain = vec![start.as_str()];
            let mut current = start.as_str();

            while let Some(parent) = self.inheritance.get(current) {
                let parent = parent.as_str();

                if chain.contains(&parent) {
                    chain.push(parent);

                    return Err(crate::Error::CyclicInheritance {
                        section: parent.to_string(),
                        chain: chain
                            .into_iter()
                            .skip_while(|s| *s != parent)
                            .map(str::to_string)
                            .collect(),
                    });
                }

                chain.push(parent);
                current = parent;
            }
        }

        return Ok(());
    }
}

#[cfg(test)]
const PLAIN_INI: &str = include_str!("../../tests/plain.ini");
#[cfg(test)]
const INHERITANCE_INI: &str = include_str!("../../tests/inheritance.ini");

#[test]
fn test_plain_config() {
    let cfg = Config::parse(PLAIN_INI).unwrap();

    let mut sections = cfg.section_list();
    sections.sort();
    assert_eq!(sections, ["production", "staging", "testing"]);

    let v = cfg.section("testing");
    assert!(!v.is_empty());

    assert_eq!(v.get_string("resources.mq.host").unwrap(), "some.super.example.com");
    assert_eq!(v.get_string("string").unwrap(), "foo-bar-baz");
    assert_eq!(v.get_string("single_string").unwrap(), "foo-bar-baz");
    assert_eq!(v.get_string("double_string").unwrap(), "foo-bar-baz");
    assert_eq!(v.get_string("multy_string").unwrap(), "foo-\nbar-\nbaz");
    assert_eq!(v.get_string("last_key").unwrap(), "last_key_val");
    assert_eq!(v.get_int("resources.mq.port").unwrap(), 5672);
    assert_eq!(v.get_float("ratio").unwrap(), 0.75);
    assert!(v.get_bool("debug").unwrap());

    // present but not a boolean token
    let err = v.get_bool("resources.mq.vhost").unwrap_err();
    assert!(err.is_invalid_value());
}

#[test]
fn test_inheritance_config() {
    let cfg = Config::parse(INHERITANCE_INI).unwrap();

    let mut sections = cfg.section_list();
    sections.sort();
    assert_eq!(sections, ["production", "staging", "testing"]);

    assert_eq!(cfg.parent("testing"), Some("staging"));
    assert_eq!(cfg.parent("staging"), Some("production"));
    assert_eq!(cfg.parent("production"), None);

    let v = cfg.section("testing");
    assert_eq!(v.len(), 4);

    // overridden by the section itself
    assert_eq!(v.get_string("resources.mq.host").unwrap(), "staging-overrided");
    // overridden by the parent
    assert_eq!(v.get_string("prod_option").unwrap(), "staging");
    // passed through from the grandparent
    assert_eq!(v.get_string("resources.mq.password").unwrap(), "blah-blah");
    assert_eq!(v.get_string("inherited_option").unwrap(), "foo-bar-baz");

    let err = v.get_string("not_found_option").unwrap_err();
    assert!(err.is_key_not_found());

    // the parent is not affected by its children
    let staging = cfg.section("staging");
    assert_eq!(staging.get_string("resources.mq.host").unwrap(), "staging.example.com");
    assert_eq!(staging.len(), 4);
}

#[test]
fn test_section_is_idempotent() {
    let cfg = Config::parse(INHERITANCE_INI).unwrap();

    assert_eq!(cfg.section("testing"), cfg.section("testing"));
    assert_eq!(cfg.section("production"), cfg.section("production"));
}

#[test]
fn test_unknown_section_is_empty() {
    let cfg = Config::parse(INHERITANCE_INI).unwrap();

    let v = cfg.section("nowhere");
    assert!(v.is_empty());
    assert!(!cfg.has_section("nowhere"));
    assert!(v.get_string("resources.mq.host").unwrap_err().is_key_not_found());
}

#[test]
fn test_undeclared_parent_contributes_nothing() {
    let cfg = Config::parse("[child : ghost]\nkey = value\n").unwrap();

    assert_eq!(cfg.section_list(), ["child"]);
    assert_eq!(cfg.parent("child"), Some("ghost"));

    let v = cfg.section("child");
    assert_eq!(v.len(), 1);
    assert_eq!(v.get_string("key").unwrap(), "value");
}

#[test]
fn test_cyclic_inheritance_is_rejected() {
    let err = Config::parse("[a : b]\nx = 1\n[b : c]\n[c : a]\n").unwrap_err();

    match err {
        crate::Error::CyclicInheritance { chain, .. } => {
            assert_eq!(chain.len(), 4);
            assert_eq!(chain.first(), chain.last());
        }
        e => panic!("unexpected error: {e}"),
    }

    let err = Config::parse("[a : a]\n").unwrap_err();
    assert!(matches!(
        err,
        crate::Error::CyclicInheritance { ref section, ref chain } if section == "a" && chain == &["a", "a"]
    ));
}

#[test]
fn test_config_is_shareable() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Config>();

    let cfg = std::sync::Arc::new(Config::parse(INHERITANCE_INI).unwrap());

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let cfg = cfg.clone();
            std::thread::spawn(move || cfg.section("testing"))
        })
        .collect();

    for h in handles {
        assert_eq!(h.join().unwrap(), cfg.section("testing"));
    }
}
