//! MQTT subscription patterns
//!
//! Wildcard semantics: `+` matches exactly one level (any characters except
//! `/`), `#` matches one or more remaining levels and may only appear as the
//! final segment. Matching is case-sensitive and empty levels are preserved,
//! so `a//b` only matches a pattern with an empty middle level or a wildcard.

use std::fmt;

use thiserror::Error;

/// One level of a subscription pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Fixed level text, matched verbatim (may be empty)
    Literal(String),
    /// `+` - exactly one level
    Plus,
    /// `#` - one or more remaining levels, final segment only
    Hash,
}

/// Errors raised while parsing a subscription pattern
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    /// `#` somewhere other than the last segment
    #[error("'#' is only allowed as the final segment in '{0}'")]
    HashNotFinal(String),

    /// `+` or `#` mixed with other characters inside one level
    #[error("wildcard must occupy a whole level in '{0}'")]
    PartialWildcard(String),

    /// Empty pattern string
    #[error("topic pattern must not be empty")]
    Empty,
}

/// A validated MQTT subscription pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicPattern {
    raw: String,
    segments: Vec<Segment>,
}

impl TopicPattern {
    /// Parse and validate a pattern string
    ///
    /// # Errors
    ///
    /// Returns [`PatternError`] when the pattern is empty, uses `#` anywhere
    /// but the final segment, or embeds a wildcard inside a level.
    pub fn parse(raw: &str) -> Result<Self, PatternError> {
        if raw.is_empty() {
            return Err(PatternError::Empty);
        }

        let levels: Vec<&str> = raw.split('/').collect();
        let mut segments = Vec::with_capacity(levels.len());

        for (i, level) in levels.iter().enumerate() {
            let segment = match *level {
                "+" => Segment::Plus,
                "#" => {
                    if i + 1 != levels.len() {
                        return Err(PatternError::HashNotFinal(raw.into()));
                    }
                    Segment::Hash
                }
                text => {
                    if text.contains('+') || text.contains('#') {
                        return Err(PatternError::PartialWildcard(raw.into()));
                    }
                    Segment::Literal(text.into())
                }
            };
            segments.push(segment);
        }

        Ok(Self {
            raw: raw.into(),
            segments,
        })
    }

    /// The pattern as written in configuration
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// The parsed segments
    #[inline]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Whether the pattern contains any wildcard segment
    pub fn has_wildcards(&self) -> bool {
        self.segments
            .iter()
            .any(|s| matches!(s, Segment::Plus | Segment::Hash))
    }

    /// Test a concrete topic against this pattern
    pub fn matches(&self, topic: &str) -> bool {
        self.captures(topic).is_some()
    }

    /// Match a topic and collect what the wildcards captured
    ///
    /// Each `+` captures its level; a trailing `#` captures the whole
    /// remainder joined with `/`. Returns `None` when the topic does not
    /// match.
    pub fn captures(&self, topic: &str) -> Option<Vec<String>> {
        let levels: Vec<&str> = topic.split('/').collect();
        let mut captured = Vec::new();

        for (i, segment) in self.segments.iter().enumerate() {
            match segment {
                Segment::Literal(text) => {
                    if levels.get(i).copied() != Some(text.as_str()) {
                        return None;
                    }
                }
                Segment::Plus => {
                    captured.push((*levels.get(i)?).to_string());
                }
                Segment::Hash => {
                    // One or more remaining levels required.
                    if levels.len() <= i {
                        return None;
                    }
                    captured.push(levels[i..].join("/"));
                    return Some(captured);
                }
            }
        }

        if levels.len() == self.segments.len() {
            Some(captured)
        } else {
            None
        }
    }
}

impl fmt::Display for TopicPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

#[cfg(test)]
#[path = "pattern_test.rs"]
mod tests;
