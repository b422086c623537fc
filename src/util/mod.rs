//! Utility functions shared by configuration and feed setup.
//!
//! # Examples
//!
//! ```
//! use feedhook::util::validate_feed_url;
//!
//! let url = validate_feed_url("https://example.com/feed.xml").unwrap();
//! ```

mod url_validator;

pub use url_validator::{validate_feed_url, UrlValidationError};
