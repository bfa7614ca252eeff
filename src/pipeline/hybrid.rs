//! Hybrid classifier: LLM labeling against the keyword taxonomy.
//!
//! The whole taxonomy, its keyword lists and the numbered message batch go to
//! the collaborator in one call. The reply must be a JSON array of
//! `{sender, text, labels}` records. Records are accepted as returned; label
//! identifiers are not checked against the taxonomy.
//!
//! A reply that does not parse becomes [`LabelingOutcome::ParseFailed`]
//! carrying the raw text. Transport errors from the provider are returned
//! unchanged. One call per invocation, no retries.

use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{ClassifierParseError, LlmError};
use crate::llm::{ChatMessage, CompletionRequest, LlmProvider, TokenUsage};
use crate::pipeline::types::{InputMessage, LabeledMessage, LabelingOutcome};
use crate::taxonomy::keywords::KeywordDictionary;

/// Settings for the labeling call.
#[derive(Debug, Clone)]
pub struct HybridConfig {
    pub temperature: f32,
    pub max_tokens: u32,
    /// Strip markdown fences and surrounding prose before parsing.
    pub extract_json: bool,
}

impl Default for HybridConfig {
    fn default() -> Self {
        Self {
            temperature: 0.1,
            max_tokens: 4096,
            extract_json: false,
        }
    }
}

/// Labeling result of a combined labeling + summary call.
#[derive(Debug, Clone, PartialEq)]
pub struct CombinedOutcome {
    pub labeling: LabelingOutcome,
    /// `None` when the reply did not parse.
    pub summary: Option<String>,
}

/// A classifier reply together with the tokens it cost.
#[derive(Debug, Clone, PartialEq)]
pub struct Classified<T> {
    pub value: T,
    pub usage: TokenUsage,
}

/// LLM-backed classifier using the taxonomy as instructions.
pub struct HybridClassifier {
    llm: Arc<dyn LlmProvider>,
    dictionary: KeywordDictionary,
    config: HybridConfig,
}

impl HybridClassifier {
    pub fn new(llm: Arc<dyn LlmProvider>, config: HybridConfig) -> Self {
        Self {
            llm,
            dictionary: KeywordDictionary::standard(),
            config,
        }
    }

    pub fn with_dictionary(mut self, dictionary: KeywordDictionary) -> Self {
        self.dictionary = dictionary;
        self
    }

    /// Label a batch with one collaborator call.
    pub async fn classify(
        &self,
        messages: &[InputMessage],
    ) -> Result<Classified<LabelingOutcome>, LlmError> {
        let user_prompt = build_labeling_prompt(&self.dictionary, messages);
        let response = self
            .request(build_labeling_system_prompt(), user_prompt)
            .await?;

        let value = match parse_labeled_messages(&response.content, self.config.extract_json) {
            Ok(labeled) => {
                debug!(
                    records = labeled.len(),
                    messages = messages.len(),
                    "Parsed labeling reply"
                );
                LabelingOutcome::Labeled(labeled)
            }
            Err(e) => {
                warn!(
                    raw_response = %response.content,
                    error = %e,
                    "Failed to parse labeling reply"
                );
                LabelingOutcome::ParseFailed(e)
            }
        };

        Ok(Classified {
            value,
            usage: response.usage(),
        })
    }

    /// Label a single message.
    pub async fn classify_one(
        &self,
        message: &InputMessage,
    ) -> Result<Classified<LabelingOutcome>, LlmError> {
        self.classify(std::slice::from_ref(message)).await
    }

    /// Label a batch and ask for a conversation summary in the same call.
    pub async fn classify_with_summary(
        &self,
        messages: &[InputMessage],
    ) -> Result<Classified<CombinedOutcome>, LlmError> {
        let user_prompt = build_combined_prompt(&self.dictionary, messages);
        let response = self
            .request(build_combined_system_prompt(), user_prompt)
            .await?;

        let value = match parse_combined(&response.content, self.config.extract_json) {
            Ok((labeled, summary)) => CombinedOutcome {
                labeling: LabelingOutcome::Labeled(labeled),
                summary: Some(summary),
            },
            Err(e) => {
                warn!(
                    raw_response = %response.content,
                    error = %e,
                    "Failed to parse combined labeling reply"
                );
                CombinedOutcome {
                    labeling: LabelingOutcome::ParseFailed(e),
                    summary: None,
                }
            }
        };

        Ok(Classified {
            value,
            usage: response.usage(),
        })
    }

    async fn request(
        &self,
        system_prompt: String,
        user_prompt: String,
    ) -> Result<crate::llm::CompletionResponse, LlmError> {
        let request = CompletionRequest::new(vec![
            ChatMessage::system(system_prompt),
            ChatMessage::user(user_prompt),
        ])
        .with_temperature(self.config.temperature)
        .with_max_tokens(self.config.max_tokens);

        self.llm.complete(request).await
    }
}

// ── Prompt construction ─────────────────────────────────────────────

const RECORD_SCHEMA: &str = "{\"sender\": \"primary\", \"text\": \"...\", \"labels\": {\"emotion_expression\": [\"affection\"]}}";

fn build_labeling_system_prompt() -> String {
    format!(
        "You are a chat message labeling engine for couple conversations.\n\n\
         Label every message with the taxonomy provided by the user. Use only \
         category and label identifiers (the snake_case names), never display names.\n\n\
         Respond with ONLY a JSON array, one record per message, in input order:\n\
         [{RECORD_SCHEMA}, ...]\n\n\
         Rules:\n\
         - Copy sender and text exactly as given\n\
         - Omit a category when no label of it applies\n\
         - Keywords are hints, not the only triggers\n\
         - No markdown, no commentary"
    )
}

fn build_combined_system_prompt() -> String {
    format!(
        "You are a chat message labeling and interpretation engine for couple conversations.\n\n\
         1. Label every message with the taxonomy provided by the user, using only \
         category and label identifiers.\n\
         2. Based on those labels, summarize the speaker's emotions, communication, \
         attachment and notable traits in 3-5 Korean sentences.\n\n\
         Respond with ONLY a JSON object:\n\
         {{\"labeled_messages\": [{RECORD_SCHEMA}, ...], \"llm_summary\": \"...\"}}\n\n\
         No markdown, no commentary."
    )
}

/// Render the taxonomy, keyword lists and numbered messages.
pub fn build_labeling_prompt(dictionary: &KeywordDictionary, messages: &[InputMessage]) -> String {
    let mut prompt = String::with_capacity(4096);

    prompt.push_str("Categories and keywords:\n");
    for (category, entries) in dictionary.groups() {
        prompt.push_str(&format!("- {} ({}):\n", category.id(), category.display()));
        for entry in entries {
            prompt.push_str(&format!(
                "  * {} ({}): {}\n",
                entry.label,
                entry.display,
                entry.keywords.join(", ")
            ));
        }
    }

    prompt.push_str("\nMessages:\n");
    for (i, message) in messages.iter().enumerate() {
        prompt.push_str(&format!(
            "{}. ({}) {}\n",
            i + 1,
            message.sender.as_str(),
            message.text
        ));
    }

    prompt.push_str("\nReturn the labels of every message as a JSON array.");
    prompt
}

fn build_combined_prompt(dictionary: &KeywordDictionary, messages: &[InputMessage]) -> String {
    let mut prompt = build_labeling_prompt(dictionary, messages);
    prompt.push_str(" Then add the summary as described.");
    prompt
}

// ── Response parsing ────────────────────────────────────────────────

/// Parse a labeling reply into records.
///
/// Strict unless `extract` is set, in which case a JSON array is first cut out
/// of markdown fences or surrounding text.
pub fn parse_labeled_messages(
    raw: &str,
    extract: bool,
) -> Result<Vec<LabeledMessage>, ClassifierParseError> {
    let candidate = if extract {
        extract_json(raw, '[', ']')
    } else {
        raw.to_string()
    };

    serde_json::from_str::<Vec<LabeledMessage>>(&candidate)
        .map_err(|e| ClassifierParseError::new(raw, format!("JSON parse error: {e}")))
}

#[derive(Debug, Deserialize)]
struct CombinedReply {
    labeled_messages: Vec<LabeledMessage>,
    #[serde(default)]
    llm_summary: String,
}

fn parse_combined(
    raw: &str,
    extract: bool,
) -> Result<(Vec<LabeledMessage>, String), ClassifierParseError> {
    let candidate = if extract {
        extract_json(raw, '{', '}')
    } else {
        raw.to_string()
    };

    let reply: CombinedReply = serde_json::from_str(&candidate)
        .map_err(|e| ClassifierParseError::new(raw, format!("JSON parse error: {e}")))?;
    Ok((reply.labeled_messages, reply.llm_summary))
}

/// Extract a JSON value delimited by `open`/`close` from LLM output that may
/// be wrapped in markdown or prose.
fn extract_json(text: &str, open: char, close: char) -> String {
    let trimmed = text.trim();

    if trimmed.starts_with(open) {
        return trimmed.to_string();
    }

    // Wrapped in markdown code block
    if let Some(start) = trimmed.find("```json") {
        let after = &trimmed[start + 7..];
        if let Some(end) = after.find("```") {
            return after[..end].trim().to_string();
        }
    }

    if let Some(start) = trimmed.find("```") {
        let after = &trimmed[start + 3..];
        if let Some(end) = after.find("```") {
            let inner = after[..end].trim();
            if inner.starts_with(open) {
                return inner.to_string();
            }
        }
    }

    if let (Some(start), Some(end)) = (trimmed.find(open), trimmed.rfind(close)) {
        if end > start {
            return trimmed[start..=end].to_string();
        }
    }

    trimmed.to_string()
}
