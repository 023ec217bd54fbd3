//! `channel:topic` event types and wildcard matching.

use std::fmt;

/// The wildcard segment.
pub const WILDCARD: &str = "*";

/// A normalised `channel:topic` pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EventType {
    channel: String,
    topic: String,
}

impl EventType {
    /// Normalises a raw type string.
    ///
    /// The string is split on `:`; an empty or missing segment becomes `*`,
    /// and anything after a second `:` is ignored.
    pub fn parse(raw: &str) -> Self {
        let mut parts = raw.split(':');
        let channel = parts.next().filter(|s| !s.is_empty()).unwrap_or(WILDCARD);
        let topic = parts.next().filter(|s| !s.is_empty()).unwrap_or(WILDCARD);

        Self {
            channel: channel.to_string(),
            topic: topic.to_string(),
        }
    }

    /// Returns the channel segment.
    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// Returns the topic segment.
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Returns true if a subscription stored under `key` is selected by this
    /// pattern.
    ///
    /// Per segment: a `*` in the key accepts anything; a `*` in the pattern
    /// accepts any word segment (`[A-Za-z0-9_-]+`); otherwise the segments
    /// must be equal.
    pub fn selects(&self, key: &EventType) -> bool {
        segment_matches(&key.channel, &self.channel) && segment_matches(&key.topic, &self.topic)
    }
}

impl From<&str> for EventType {
    fn from(raw: &str) -> Self {
        Self::parse(raw)
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.channel, self.topic)
    }
}

fn segment_matches(key: &str, pattern: &str) -> bool {
    key == WILDCARD || key == pattern || (pattern == WILDCARD && is_word(key))
}

fn is_word(segment: &str) -> bool {
    !segment.is_empty()
        && segment
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalisation() {
        let cases = [
            ("", "*:*"),
            ("*", "*:*"),
            (":", "*:*"),
            ("*:", "*:*"),
            (":*", "*:*"),
            ("::", "*:*"),
            (":click", "*:click"),
            ("*:click", "*:click"),
            ("post", "post:*"),
            ("post:", "post:*"),
            ("post:*", "post:*"),
            ("post:click", "post:click"),
            ("post:click:extra", "post:click"),
        ];

        for (raw, normalised) in cases {
            assert_eq!(EventType::parse(raw).to_string(), normalised, "raw = {raw:?}");
        }
    }

    #[test]
    fn test_exact_pattern() {
        let pattern = EventType::parse("post:click");

        assert!(pattern.selects(&"post:click".into()));
        assert!(pattern.selects(&"post:*".into()));
        assert!(pattern.selects(&"*:click".into()));
        assert!(pattern.selects(&"*:*".into()));
        assert!(!pattern.selects(&"post:change".into()));
        assert!(!pattern.selects(&"user:click".into()));
    }

    #[test]
    fn test_wildcard_pattern() {
        let pattern = EventType::parse(":click");

        assert!(pattern.selects(&"post:click".into()));
        assert!(pattern.selects(&"user-profile:click".into()));
        assert!(pattern.selects(&"*:click".into()));
        assert!(!pattern.selects(&"post:change".into()));
        assert!(!pattern.selects(&"a.b:click".into()));

        let everything = EventType::parse("*:*");
        assert!(everything.selects(&"post:change".into()));
        assert!(everything.selects(&"user:click".into()));
    }
}
