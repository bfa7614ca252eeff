//! Rule classifier: deterministic keyword labeling.
//!
//! For every category, each label is tested in declared order; a label matches
//! when any of its keywords is a substring of the message. Only the first
//! matching keyword is considered per label, so a label is never counted
//! twice. Categories with no match are left out of the result.
//!
//! No LLM, no state, no error cases.

use tracing::debug;

use crate::pipeline::types::{InputMessage, LabeledMessage, Labels};
use crate::taxonomy::keywords::KeywordDictionary;

/// Keyword-based classifier over a [`KeywordDictionary`].
#[derive(Debug, Clone)]
pub struct RuleClassifier {
    dictionary: KeywordDictionary,
}

impl RuleClassifier {
    /// Classifier backed by the built-in dictionary.
    pub fn standard() -> Self {
        Self::with_dictionary(KeywordDictionary::standard())
    }

    /// Create a classifier with no keywords (for testing).
    pub fn empty() -> Self {
        Self::with_dictionary(KeywordDictionary::empty())
    }

    pub fn with_dictionary(dictionary: KeywordDictionary) -> Self {
        Self { dictionary }
    }

    pub fn dictionary(&self) -> &KeywordDictionary {
        &self.dictionary
    }

    /// Label one message text.
    pub fn classify(&self, text: &str) -> Labels {
        let mut labels = Labels::new();
        if text.is_empty() {
            return labels;
        }

        for (category, entries) in self.dictionary.groups() {
            let mut matched = Vec::new();
            for entry in entries {
                if let Some(keyword) = entry.first_match(text) {
                    debug!(
                        category = category.id(),
                        label = entry.label,
                        keyword,
                        "Keyword matched"
                    );
                    matched.push(entry.label.to_string());
                }
            }
            labels.insert(category, matched);
        }

        labels
    }

    /// Label a single message, keeping its sender and text.
    pub fn label_message(&self, message: &InputMessage) -> LabeledMessage {
        LabeledMessage {
            sender: message.sender,
            text: message.text.clone(),
            labels: self.classify(&message.text),
        }
    }

    /// Label a message history in order.
    pub fn label_history(&self, messages: &[InputMessage]) -> Vec<LabeledMessage> {
        messages.iter().map(|m| self.label_message(m)).collect()
    }
}

impl Default for RuleClassifier {
    fn default() -> Self {
        Self::standard()
    }
}
