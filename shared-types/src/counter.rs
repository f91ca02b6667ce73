use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::CharmUrl;

const SEPARATOR: char = ':';
const WILDCARD: &str = "*";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CounterKeyError {
    #[error("counter key must not contain '/': {0:?}")]
    Separator(String),

    #[error("counter key is empty")]
    Empty,

    #[error("counter key prefix has no segments before the wildcard")]
    UnconstrainedPrefix,

    #[error("invalid counter key segment: {0:?}")]
    InvalidSegment(String),
}

/// Hierarchical counter key.
///
/// The wire form joins segments with `:`; a trailing `:*` turns the key into
/// a prefix that sums every counter whose segments start with this key's.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CounterKey {
    segments: Vec<String>,
    prefix: bool,
}

impl CounterKey {
    pub fn new(segments: Vec<String>, prefix: bool) -> Result<Self, CounterKeyError> {
        if segments.is_empty() {
            return Err(if prefix {
                CounterKeyError::UnconstrainedPrefix
            } else {
                CounterKeyError::Empty
            });
        }
        if let Some(bad) = segments.iter().find(|s| s.contains([SEPARATOR, '/'])) {
            return Err(CounterKeyError::InvalidSegment(bad.clone()));
        }
        // An exact key ending in "*" would read back as a prefix.
        if !prefix && segments.last().is_some_and(|last| last == WILDCARD) {
            return Err(CounterKeyError::InvalidSegment(WILDCARD.to_string()));
        }
        Ok(Self { segments, prefix })
    }

    /// Key recorded when `kind` happens to a charm. Charms without an owner
    /// get a three segment key, so per-user counters never mix with them.
    pub fn for_charm(kind: &str, url: &CharmUrl) -> Self {
        let mut segments = vec![kind.to_string(), url.series.clone(), url.name.clone()];
        if let Some(user) = &url.user {
            segments.push(user.clone());
        }
        Self {
            segments,
            prefix: false,
        }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn is_prefix(&self) -> bool {
        self.prefix
    }
}

impl FromStr for CounterKey {
    type Err = CounterKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.contains('/') {
            return Err(CounterKeyError::Separator(s.to_string()));
        }
        if s.is_empty() {
            return Err(CounterKeyError::Empty);
        }

        let mut segments: Vec<String> = s.split(SEPARATOR).map(str::to_string).collect();
        let prefix = segments.last().is_some_and(|last| last == WILDCARD);
        if prefix {
            segments.pop();
        }
        Self::new(segments, prefix)
    }
}

impl fmt::Display for CounterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join(":"))?;
        if self.prefix {
            write!(f, "{SEPARATOR}{WILDCARD}")?;
        }
        Ok(())
    }
}
