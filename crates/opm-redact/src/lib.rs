//! Redaction for values that end up in logs.
//!
//! Tool arguments are logged on every call. Before that happens they pass
//! through a [`Redactor`], which:
//!
//! - replaces the value of any key that looks sensitive (`password`,
//!   `token`, `api_key`, ... matched case-insensitively as substrings)
//! - replaces string values that match a known secret shape (JWTs, GitHub
//!   tokens, credentials embedded in URLs, ...)
//!
//! # Example
//!
//! ```
//! use opm_redact::Redactor;
//! use serde_json::json;
//!
//! let redactor = Redactor::default();
//! let clean = redactor.redact(&json!({"project_id": "7", "API_KEY": "abc"}));
//! assert_eq!(clean["project_id"], "7");
//! assert_eq!(clean["API_KEY"], "[REDACTED]");
//! ```

pub mod detect;
pub mod keys;
pub mod redact;

pub use detect::{SecretDetector, SecretKind};
pub use keys::{is_sensitive_key, SENSITIVE_KEY_FRAGMENTS};
pub use redact::{Redactor, REDACTED};
