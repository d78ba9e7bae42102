use std::io::BufRead;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};

use super::ini_pest::{self, Line};
use super::{Config, Key, RawValue, Section, SectionName};
use crate::error::{Error, Result};

/// line by line state while building a config
#[derive(Default)]
struct ConfigReader {
    config: Config,
    /// section receiving key/value lines
    section: Option<SectionName>,
    /// key receiving continuation lines
    option: Option<Key>,
    /// number of the line being read, starting from 1
    line_no: usize,
}

impl ConfigReader {
    fn feed_line(&mut self, raw: &str) -> Result<()> {
        self.line_no += 1;

        let line = raw.trim();

        // the grammar accepts any trimmed line, a failure here is still a bad line
        let parsed = ini_pest::parse_line(line).map_err(|e| {
            log::debug!("line {}: {}", self.line_no, e);
            self.syntax_error(line)
        })?;

        log::trace!("line {}: {:?}", self.line_no, parsed);

        match parsed {
            Line::Blank => {}
            Line::Header { name, parent } => {
                let name = SectionName::from(name);

                // continuation lines must not leak into the new section
                self.option = None;

                match parent {
                    Some(parent) => {
                        log::debug!("section '{}' inherits from '{}'", name, parent);

                        self.config
                            .inheritance
                            .insert(name.clone(), SectionName::from(parent));
                    }
                    None => {
                        log::debug!("section '{}'", name);

                        self.config.inheritance.remove(&name);
                    }
                }

                // a redeclared section starts over
                self.config.sections.insert(name.clone(), Section::new());

                self.section = Some(name);
            }
            Line::KeyValue { key, value } => {
                let section = match &self.section {
                    Some(s) if !s.as_str().is_empty() => s,
                    _ => {
                        return Err(Error::MissingSection {
                            line: self.line_no,
                            text: line.to_string(),
                        });
                    }
                };

                let key = Key::from(key);

                self.config
                    .sections
                    .entry(section.clone())
                    .or_default()
                    .insert(key.clone(), RawValue::from(value));

                self.option = Some(key);
            }
            Line::Continuation(text) => {
                let (Some(section), Some(option)) = (&self.section, &self.option) else {
                    return Err(self.syntax_error(line));
                };

                if section.as_str().is_empty() {
                    return Err(self.syntax_error(line));
                }

                let values = self.config.sections.entry(section.clone()).or_default();

                // append to the previous value with a newline
                let value = values
                    .entry(option.clone())
                    .or_insert_with(|| RawValue::from(""));
                value.0.push('\n');
                value.0.push_str(text);
            }
        }

        return Ok(());
    }

    fn syntax_error(&self, line: &str) -> Error {
        Error::Syntax {
            line: self.line_no,
            text: line.to_string(),
        }
    }

    fn finish(self) -> Result<Config> {
        let config = self.config;

        for (child, parent) in &config.inheritance {
            if !config.sections.contains_key(parent) {
                log::debug!("section '{}' inherits from undeclared section '{}'", child, parent);
            }
        }

        config.check_inheritance()?;

        log::debug!(
            "loaded {} sections from {} lines",
            config.sections.len(),
            self.line_no
        );

        return Ok(config);
    }
}

pub(super) fn read_blocking<R: BufRead>(mut reader: R) -> Result<Config> {
    let mut state = ConfigReader::default();
    // buffer for reader
    let mut buffer = String::new();

    // parse each line
    while reader.read_line(&mut buffer)? != 0 {
        state.feed_line(&buffer)?;

        buffer.clear();
    }

    return state.finish();
}

pub(super) async fn read_async<R: AsyncRead + Unpin>(file: R) -> Result<Config> {
    let mut reader = BufReader::new(file);
    let mut state = ConfigReader::default();
    // buffer for reader
    let mut buffer = Vec::new();

    // parse each line
    while reader.read_until(b'\n', &mut buffer).await? != 0 {
        // decode utf8
        let line = core::str::from_utf8(&buffer)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;

        state.feed_line(line)?;

        buffer.clear();
    }

    return state.finish();
}

#[test]
fn test_multiline_value() {
    let cfg = Config::parse("[s]\nmulty_string = foo-\n  bar-\n  baz\n").unwrap();

    let v = cfg.section("s");
    assert_eq!(v.get_raw("multy_string"), Some("foo-\nbar-\nbaz"));
}

#[test]
fn test_multiline_stops_at_next_key() {
    let cfg = Config::parse("[s]\na = 1\n  2\nb = 3\n  4 ; comment\n\n  5\n").unwrap();

    let v = cfg.section("s");
    assert_eq!(v.get_raw("a"), Some("1\n2"));
    // blank lines and comments do not end a value
    assert_eq!(v.get_raw("b"), Some("3\n4\n5"));
}

#[test]
fn test_continuation_after_header_is_error() {
    let err = Config::parse("[a]\nkey = value\n[b]\n  continued\n").unwrap_err();

    match err {
        Error::Syntax { line, text } => {
            assert_eq!(line, 4);
            assert_eq!(text, "continued");
        }
        e => panic!("unexpected error: {e}"),
    }
}

#[test]
fn test_continuation_without_key_is_error() {
    let err = Config::parse("; comment\nnot a key value\n").unwrap_err();
    assert!(matches!(err, Error::Syntax { line: 2, .. }));
    assert_eq!(err.to_string(), "could not parse line 2: not a key value");
}

#[test]
fn test_key_before_section_is_error() {
    let err = Config::parse("key = value\n[s]\n").unwrap_err();
    assert!(matches!(err, Error::MissingSection { line: 1, .. }));

    let err = Config::parse("[]\nkey = value\n").unwrap_err();
    assert!(matches!(err, Error::MissingSection { line: 2, .. }));
}

#[test]
fn test_redeclared_section_starts_over() {
    let cfg = Config::parse("[s : base]\na = 1\nb = 2\n[base]\n[s]\nb = 3\n").unwrap();

    let v = cfg.section("s");
    assert_eq!(v.len(), 1);
    assert_eq!(v.get_raw("b"), Some("3"));
    assert_eq!(cfg.parent("s"), None);
}

#[test]
fn test_marker_without_whitespace_is_kept() {
    let cfg = Config::parse("[a;b]\nkey =;x\nc;d = e\nm = 1\n  2;3\n").unwrap();

    assert_eq!(cfg.section_list(), ["a;b"]);

    let v = cfg.section("a;b");
    assert_eq!(v.get_raw("key"), Some(";x"));
    assert_eq!(v.get_raw("c;d"), Some("e"));
    assert_eq!(v.get_raw("m"), Some("1\n2;3"));
}

#[test]
fn test_last_value_wins() {
    let cfg = Config::parse("[s]\nkey = first\nkey = second\n").unwrap();

    assert_eq!(cfg.section("s").get_raw("key"), Some("second"));
}

#[test]
fn test_crlf_and_missing_trailing_newline() {
    let cfg = Config::parse("[s]\r\nkey = value\r\nother = x").unwrap();

    let v = cfg.section("s");
    assert_eq!(v.get_raw("key"), Some("value"));
    assert_eq!(v.get_raw("other"), Some("x"));
}

#[test]
fn test_case_sensitive_names() {
    let cfg = Config::parse("[S]\nKey = upper\n[s]\nkey = lower\n").unwrap();

    assert_eq!(cfg.section_list().len(), 2);
    assert_eq!(cfg.section("S").get_raw("Key"), Some("upper"));
    assert_eq!(cfg.section("S").get_raw("key"), None);
}

#[test]
fn test_invalid_utf8_is_io_error() {
    let err = Config::from_reader(&b"[s]\nkey = \xff\n"[..]).unwrap_err();
    assert!(matches!(err, Error::Io(_)));
}

#[test]
fn test_load_from_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("app.ini");
    std::fs::write(&path, include_str!("../../tests/inheritance.ini")).unwrap();

    let cfg = Config::load(&path).unwrap();
    assert_eq!(cfg.section("testing").get_raw("prod_option"), Some("staging"));

    let err = Config::load(dir.path().join("missing.ini")).unwrap_err();
    assert!(matches!(err, Error::Io(ref e) if e.kind() == std::io::ErrorKind::NotFound));
}

#[tokio::test]
async fn test_async_matches_blocking() {
    const INPUT: &str = include_str!("../../tests/plain.ini");

    let blocking = Config::parse(INPUT).unwrap();
    let parsed = Config::async_parse(INPUT.as_bytes()).await.unwrap();

    let mut names = parsed.section_list();
    names.sort();
    let mut expected = blocking.section_list();
    expected.sort();
    assert_eq!(names, expected);

    for name in names {
        assert_eq!(parsed.section(name), blocking.section(name));
    }
}

#[tokio::test]
async fn test_load_async() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("app.ini");
    std::fs::write(&path, "[s]\nkey = value\n").unwrap();

    let cfg = Config::load_async(&path).await.unwrap();
    assert_eq!(cfg.section("s").get_raw("key"), Some("value"));

    let err = Config::async_parse(&b"[s]\n  oops\n"[..]).await.unwrap_err();
    assert!(matches!(err, Error::Syntax { line: 2, .. }));
}
