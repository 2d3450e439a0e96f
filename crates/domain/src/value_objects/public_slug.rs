//! Public slug for shared encounter tables

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::DomainError;

/// Length of every public slug
pub const PUBLIC_SLUG_LENGTH: usize = 8;

/// URL-safe alphabet (A-Z, a-z, 0-9, `_`, `-`)
const SLUG_ALPHABET: &[u8; 64] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789_-";

/// An 8-character URL-safe identifier for a public table
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PublicSlug(String);

impl PublicSlug {
    /// Parse and validate a slug.
    pub fn new(slug: impl Into<String>) -> Result<Self, DomainError> {
        let slug = slug.into();
        if slug.len() != PUBLIC_SLUG_LENGTH {
            return Err(DomainError::validation(format!(
                "Public slug must be exactly {} characters",
                PUBLIC_SLUG_LENGTH
            )));
        }
        if !slug.bytes().all(|b| SLUG_ALPHABET.contains(&b)) {
            return Err(DomainError::validation(
                "Public slug may only contain A-Z, a-z, 0-9, '_' and '-'",
            ));
        }
        Ok(Self(slug))
    }

    /// Generate a slug from an injected index generator.
    ///
    /// `pick(n)` must return a value in `0..n`; out-of-range values wrap.
    pub fn generate(mut pick: impl FnMut(usize) -> usize) -> Self {
        let slug = (0..PUBLIC_SLUG_LENGTH)
            .map(|_| {
                let idx = pick(SLUG_ALPHABET.len()) % SLUG_ALPHABET.len();
                char::from(SLUG_ALPHABET[idx])
            })
            .collect();
        Self(slug)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PublicSlug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for PublicSlug {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for PublicSlug {
    type Error = DomainError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<PublicSlug> for String {
    fn from(slug: PublicSlug) -> String {
        slug.0
    }
}
