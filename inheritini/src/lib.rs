//! INI configuration files with section inheritance.
//!
//! ```no_run
//! let cfg = inheritini::Config::load("app.ini")?;
//!
//! // [testing : staging] sees every key of staging and production
//! let testing = cfg.section("testing");
//! let port = testing.get_int("resources.mq.port")?;
//! # Ok::<(), inheritini::Error>(())
//! ```

pub mod config;
mod error;

pub use config::{Config, Key, RawValue, SectionName, SectionView};
pub use error::{Error, Result};
