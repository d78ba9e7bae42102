use pest::Parser;
use pest::iterators::Pair;
use pest_derive::Parser;

#[derive(Parser)]
#[grammar = "config/ini.pest"]
struct IniParser;

pub(super) const COMMENT: char = ';';

/// a classified physical line
#[derive(Debug, PartialEq)]
pub(super) enum Line<'a> {
    /// empty line or full line comment
    Blank,
    Header {
        name: &'a str,
        parent: Option<&'a str>,
    },
    KeyValue {
        key: &'a str,
        value: &'a str,
    },
    /// anything else, only valid after a key/value line
    Continuation(&'a str),
}

/// classify a line, the line must already be trimmed
pub(super) fn parse_line(line: &str) -> Result<Line<'_>, Box<pest::error::Error<Rule>>> {
    let mut pairs = IniParser::parse(Rule::LINE, line)?;

    // LINE always produces exactly one pair
    let Some(pair) = pairs.next() else {
        return Ok(Line::Blank);
    };

    for p in pair.into_inner() {
        match p.as_rule() {
            Rule::LINE_COMMENT => return Ok(Line::Blank),
            Rule::HEADER => return Ok(parse_header(p)),
            Rule::KEY_VALUE => return Ok(parse_key_value(p)),
            Rule::CONTINUATION => return Ok(Line::Continuation(strip_comment(p.as_str()).trim())),
            Rule::EOI => {}
            _ => unreachable!(),
        }
    }

    // nothing but EOI, the line is empty
    return Ok(Line::Blank);
}

fn parse_header(pair: Pair<'_, Rule>) -> Line<'_> {
    let mut name = "";
    let mut parent = None;

    for p in pair.into_inner() {
        match p.as_rule() {
            Rule::SECTION_NAME => name = p.as_str().trim(),
            Rule::PARENT_NAME => parent = Some(p.as_str().trim()),
            _ => unreachable!(),
        }
    }

    return Line::Header { name, parent };
}

fn parse_key_value(pair: Pair<'_, Rule>) -> Line<'_> {
    let mut key = "";
    let mut value = "";

    for p in pair.into_inner() {
        match p.as_rule() {
            Rule::KEY => key = p.as_str().trim(),
            Rule::VALUE => value = strip_comment(p.as_str()).trim(),
            _ => unreachable!(),
        }
    }

    return Line::KeyValue { key, value };
}

/// truncate at the first space or tab followed by the comment marker
pub(super) fn strip_comment(value: &str) -> &str {
    let bytes = value.as_bytes();

    for (i, w) in bytes.windows(2).enumerate() {
        if (w[0] == b' ' || w[0] == b'\t') && w[1] == COMMENT as u8 {
            return &value[..i];
        }
    }

    return value;
}

#[test]
fn test_blank_and_comment() {
    assert_eq!(parse_line("").unwrap(), Line::Blank);
    assert_eq!(parse_line("; a comment = with [stuff]").unwrap(), Line::Blank);
    assert_eq!(parse_line(";").unwrap(), Line::Blank);
}

#[test]
fn test_header() {
    assert_eq!(
        parse_line("[ production ]").unwrap(),
        Line::Header {
            name: "production",
            parent: None
        }
    );
    assert_eq!(
        parse_line("[staging : production]").unwrap(),
        Line::Header {
            name: "staging",
            parent: Some("production")
        }
    );
    assert_eq!(
        parse_line("[a:b:c]").unwrap(),
        Line::Header {
            name: "a",
            parent: Some("b:c")
        }
    );
    assert_eq!(
        parse_line("[]]").unwrap(),
        Line::Header {
            name: "]",
            parent: None
        }
    );
    assert_eq!(
        parse_line("[]").unwrap(),
        Line::Header {
            name: "",
            parent: None
        }
    );
}

#[test]
fn test_header_must_close_at_line_end() {
    assert_eq!(parse_line("[a] b").unwrap(), Line::Continuation("[a] b"));
    assert_eq!(parse_line("[").unwrap(), Line::Continuation("["));
    assert_eq!(
        parse_line("[a = b").unwrap(),
        Line::KeyValue { key: "[a", value: "b" }
    );
}

#[test]
fn test_key_value() {
    assert_eq!(
        parse_line("resources.mq.host = example.com").unwrap(),
        Line::KeyValue {
            key: "resources.mq.host",
            value: "example.com"
        }
    );
    assert_eq!(
        parse_line("expr = a=b").unwrap(),
        Line::KeyValue {
            key: "expr",
            value: "a=b"
        }
    );
    assert_eq!(
        parse_line("empty =").unwrap(),
        Line::KeyValue {
            key: "empty",
            value: ""
        }
    );
}

#[test]
fn test_inline_comments() {
    assert_eq!(
        parse_line("port = 5672 ; amqp").unwrap(),
        Line::KeyValue {
            key: "port",
            value: "5672"
        }
    );
    assert_eq!(
        parse_line("port = 5672\t; amqp").unwrap(),
        Line::KeyValue {
            key: "port",
            value: "5672"
        }
    );
    // no whitespace before the marker, kept as part of the value
    assert_eq!(
        parse_line("dsn = host;port").unwrap(),
        Line::KeyValue {
            key: "dsn",
            value: "host;port"
        }
    );
    assert_eq!(
        parse_line("bar-  ; trailing").unwrap(),
        Line::Continuation("bar-")
    );
}

#[test]
fn test_leading_separator_is_continuation() {
    assert_eq!(parse_line("=value").unwrap(), Line::Continuation("=value"));
    assert_eq!(parse_line("baz").unwrap(), Line::Continuation("baz"));
}

#[test]
fn test_marker_inside_names_and_values() {
    assert_eq!(
        parse_line("key =;x").unwrap(),
        Line::KeyValue {
            key: "key",
            value: ";x"
        }
    );
    assert_eq!(
        parse_line("a;b = c").unwrap(),
        Line::KeyValue {
            key: "a;b",
            value: "c"
        }
    );
    assert_eq!(
        parse_line("[a;b]").unwrap(),
        Line::Header {
            name: "a;b",
            parent: None
        }
    );
    assert_eq!(
        parse_line("[child;1 : base;0]").unwrap(),
        Line::Header {
            name: "child;1",
            parent: Some("base;0")
        }
    );
    assert_eq!(parse_line("x;y").unwrap(), Line::Continuation("x;y"));
}
