//! Banned-substring filter applied to outgoing messages

use comet_common::{MessageSegment, OutgoingMessage};
use comet_config::FilterConfig;
use tracing::debug;

/// Redacts banned substrings from the text segments of a message.
///
/// Each occurrence is replaced by a single space. When the message contains
/// more than `max_redactions` occurrences in total it is suppressed instead.
#[derive(Debug, Clone, Default)]
pub struct MessageFilter {
    banned: Vec<String>,
    max_redactions: usize,
}

impl MessageFilter {
    /// Filter for `banned` words, suppressing messages past `max_redactions`
    pub fn new(banned: impl IntoIterator<Item = impl Into<String>>, max_redactions: usize) -> Self {
        Self {
            banned: banned
                .into_iter()
                .map(Into::into)
                .filter(|word: &String| !word.is_empty())
                .collect(),
            max_redactions,
        }
    }

    /// Filter built from the filter section of the configuration
    pub fn from_config(config: &FilterConfig) -> Self {
        Self::new(config.banned_words.iter().cloned(), config.max_redactions)
    }

    /// Redact `message`, or return the empty message if it has too many matches
    pub fn apply(&self, message: OutgoingMessage) -> OutgoingMessage {
        if self.banned.is_empty() || message.is_empty() {
            return message;
        }

        let mut redactions = 0;
        let mut segments = Vec::with_capacity(message.segments().len());

        for segment in message.into_segments() {
            match segment {
                MessageSegment::Text(mut text) => {
                    for word in &self.banned {
                        let found = text.matches(word.as_str()).count();
                        if found > 0 {
                            redactions += found;
                            if redactions > self.max_redactions {
                                debug!(redactions, "Suppressed message with too many banned words");
                                return OutgoingMessage::empty();
                            }
                            text = text.replace(word.as_str(), " ");
                        }
                    }
                    segments.push(MessageSegment::Text(text));
                }
                rich => segments.push(rich),
            }
        }

        if redactions > 0 {
            debug!(redactions, "Redacted banned words");
        }
        OutgoingMessage::from_segments(segments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter() -> MessageFilter {
        MessageFilter::new(["bad", "worse"], 5)
    }

    #[test]
    fn test_redacts_each_occurrence() {
        let message = filter().apply(OutgoingMessage::text("a bad and worse day, bad"));
        assert_eq!(message.plain_text(), "a   and   day,  ");
    }

    #[test]
    fn test_count_spans_segments() {
        let mut message = OutgoingMessage::text("bad bad bad");
        message.push_rich("image", "bad.png").push_text("worse worse");
        let filtered = filter().apply(message);
        assert_eq!(filtered.segments().len(), 3);
        assert!(!filtered.plain_text().contains("bad"));
        // rich payloads are not scanned
        assert!(matches!(
            &filtered.segments()[1],
            MessageSegment::Rich { payload, .. } if payload == "bad.png"
        ));

        let mut message = OutgoingMessage::text("bad bad bad");
        message.push_rich("face", "1").push_text("worse worse worse");
        assert!(filter().apply(message).is_empty());
    }

    #[test]
    fn test_no_banned_words_is_identity() {
        let message = OutgoingMessage::text("anything");
        assert_eq!(MessageFilter::default().apply(message.clone()), message);
    }
}
