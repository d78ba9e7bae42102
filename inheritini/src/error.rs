use std::num::ParseIntError;

use inheritini_api::{ErrorCode, ErrorReport};

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// the source could not be opened or read
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("could not parse line {line}: {text}")]
    Syntax { line: usize, text: String },

    /// key/value line appeared while the current section name is empty
    #[error("line {line} declares a key outside of any section: {text}")]
    MissingSection { line: usize, text: String },

    /// `chain` starts and ends with `section`
    #[error("section `{section}` inherits from itself: {}", chain.join(" -> "))]
    CyclicInheritance { section: String, chain: Vec<String> },

    #[error("key `{key}` does not exist")]
    KeyNotFound { key: String },

    #[error("could not parse bool value of `{key}`: {value}")]
    InvalidBool { key: String, value: String },

    #[error("could not parse int value of `{key}`: {value}")]
    InvalidInt {
        key: String,
        value: String,
        #[source]
        source: ParseIntError,
    },

    #[error("could not parse float value of `{key}`: {value}")]
    InvalidFloat { key: String, value: String },
}

impl Error {
    pub fn code(&self) -> ErrorCode {
        match self {
            Error::Io(_) => ErrorCode::IoError,
            Error::Syntax { .. } => ErrorCode::SyntaxError,
            Error::MissingSection { .. } => ErrorCode::MissingSection,
            Error::CyclicInheritance { .. } => ErrorCode::CyclicInheritance,
            Error::KeyNotFound { .. } => ErrorCode::KeyNotFound,
            Error::InvalidBool { .. } => ErrorCode::InvalidBool,
            Error::InvalidInt { .. } => ErrorCode::InvalidInt,
            Error::InvalidFloat { .. } => ErrorCode::InvalidFloat,
        }
    }

    /// true for the per query lookup error
    pub fn is_key_not_found(&self) -> bool {
        matches!(self, Error::KeyNotFound { .. })
    }

    /// true if the value exists but could not be converted
    pub fn is_invalid_value(&self) -> bool {
        matches!(
            self,
            Error::InvalidBool { .. } | Error::InvalidInt { .. } | Error::InvalidFloat { .. }
        )
    }
}

impl From<&Error> for ErrorReport {
    fn from(err: &Error) -> Self {
        ErrorReport::new(err.code(), err.to_string())
    }
}

#[test]
fn test_error_codes() {
    let err = Error::KeyNotFound { key: "port".into() };
    assert!(err.is_key_not_found());
    assert!(!err.is_invalid_value());

    let report = ErrorReport::from(&err);
    assert_eq!(report.code, ErrorCode::KeyNotFound);
    assert_eq!(report.message, "key `port` does not exist");

    let err = Error::CyclicInheritance {
        section: "a".into(),
        chain: vec!["a".into(), "b".into(), "a".into()],
    };
    assert_eq!(err.code(), ErrorCode::CyclicInheritance);
    assert_eq!(err.to_string(), "section `a` inherits from itself: a -> b -> a");

    // lines the grammar cannot classify report as plain syntax errors
    let err = Error::Syntax {
        line: 3,
        text: "oops".into(),
    };
    assert_eq!(err.code(), ErrorCode::SyntaxError);
    assert_eq!(ErrorReport::from(&err).message, "could not parse line 3: oops");
}
