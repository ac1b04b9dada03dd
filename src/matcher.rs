use regex::Regex;

use crate::error::ConfigError;

pub const MATCH_ALL: &str = ".*";

/// Decides which processes get reported, by name.
#[derive(Debug, Clone)]
pub struct ProcessMatcher {
    patterns: Vec<Regex>,
}

impl ProcessMatcher {
    /// Compile `patterns` in order. An empty list matches every name.
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self, ConfigError> {
        if patterns.is_empty() {
            return Self::new(&[MATCH_ALL]);
        }
        let patterns = patterns
            .iter()
            .map(|p| {
                let pattern = p.as_ref();
                Regex::new(pattern).map_err(|source| ConfigError::InvalidPattern {
                    pattern: pattern.to_string(),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    /// True if any pattern matches somewhere in `name`.
    pub fn matches(&self, name: &str) -> bool {
        self.patterns.iter().any(|re| re.is_match(name))
    }

    pub fn patterns(&self) -> impl Iterator<Item = &str> {
        self.patterns.iter().map(Regex::as_str)
    }
}
