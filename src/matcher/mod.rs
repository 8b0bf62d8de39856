//! Pattern matching for base58-encoded public keys.
//!
//! Supports anchored matching strategies:
//! - Prefix: match at the start of the encoded key
//! - Suffix: match at the end of the encoded key
//!
//! A prefix and a suffix pattern may be combined; a candidate must then
//! satisfy both.

mod pattern;

pub use pattern::{Anchor, PatternError, Subsequence, MAX_PATTERN_LEN};
