use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    #[default]
    None,
    /// file could not be opened or read
    IoError,
    /// line is not a comment, header, key/value or valid continuation
    SyntaxError,
    /// key/value line without a named section
    MissingSection,
    /// a section reaches itself through its parents
    CyclicInheritance,
    /// key does not exist in the resolved section
    KeyNotFound,
    /// value is not a boolean token
    InvalidBool,
    /// value is not a base 10 integer
    InvalidInt,
    /// value is not a float
    InvalidFloat,
}

#[derive(Debug, Default, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ErrorReport {
    /// error code
    pub code: ErrorCode,
    /// message
    pub message: String,
}

impl ErrorReport {
    pub const NONE: Self = ErrorReport {
        code: ErrorCode::None,
        message: String::new(),
    };

    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct QueryResult<T> {
    pub error: ErrorReport,
    pub result: Option<T>,
}

impl<T> QueryResult<T> {
    pub const fn ok(result: T) -> Self {
        Self {
            error: ErrorReport::NONE,
            result: Some(result),
        }
    }

    pub fn err(error: ErrorReport) -> Self {
        Self {
            error,
            result: None,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.code == ErrorCode::None
    }
}

/// flattened section after inheritance has been applied
#[derive(Debug, Default, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct SectionDump {
    pub name: String,
    /// declared parent, if any
    pub parent: Option<String>,
    pub values: BTreeMap<String, String>,
}

/// type requested when reading a single value
#[derive(Debug, Default, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    #[default]
    String,
    Bool,
    Int,
    Float,
}

impl ValueKind {
    pub const ALL: [ValueKind; 4] = [
        ValueKind::String,
        ValueKind::Bool,
        ValueKind::Int,
        ValueKind::Float,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            ValueKind::String => "string",
            ValueKind::Bool => "bool",
            ValueKind::Int => "int",
            ValueKind::Float => "float",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ValueKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| format!("unknown value kind: {}", s))
    }
}

#[test]
fn test_error_code_wire_names() {
    let report = ErrorReport::new(ErrorCode::KeyNotFound, "key `port` does not exist");
    let json = serde_json::to_string(&report).unwrap();

    assert_eq!(
        json,
        r#"{"code":"KeyNotFound","message":"key `port` does not exist"}"#
    );
}

#[test]
fn test_query_result() {
    let ok = QueryResult::ok(5672_i64);
    assert!(ok.is_ok());
    assert_eq!(ok.result, Some(5672));

    let err = QueryResult::<i64>::err(ErrorReport::new(ErrorCode::InvalidInt, "bad"));
    assert!(!err.is_ok());
    assert_eq!(err.result, None);

    let json = serde_json::to_value(&err).unwrap();
    assert_eq!(json["error"]["code"], "InvalidInt");
    assert!(json["result"].is_null());
}

#[test]
fn test_value_kind_from_str() {
    for kind in ValueKind::ALL {
        assert_eq!(kind.as_str().parse::<ValueKind>(), Ok(kind));
    }

    assert!("integer".parse::<ValueKind>().is_err());
    assert_eq!(serde_json::to_string(&ValueKind::Float).unwrap(), "\"float\"");
}
