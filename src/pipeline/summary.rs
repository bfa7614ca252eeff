//! Conversation summary: a short Korean free-text reading of the batch.
//!
//! The summary is opaque to the rest of the pipeline. It travels in the output
//! as `{"llm_summary": <text>}`.

use std::sync::Arc;

use serde_json::json;
use tracing::debug;

use crate::error::LlmError;
use crate::llm::{ChatMessage, CompletionRequest, LlmProvider};
use crate::pipeline::hybrid::Classified;
use crate::pipeline::types::InputMessage;

/// Summary text used when no summary could be obtained from a reply.
pub const SUMMARY_UNAVAILABLE: &str = "LLM 요약 생성 실패";

/// Max tokens for the summary call (a few sentences).
const SUMMARY_MAX_TOKENS: u32 = 512;

/// Writes the separate summary with its own collaborator call.
pub struct SummaryWriter {
    llm: Arc<dyn LlmProvider>,
    temperature: f32,
}

impl SummaryWriter {
    pub fn new(llm: Arc<dyn LlmProvider>, temperature: f32) -> Self {
        Self { llm, temperature }
    }

    /// Summarize the conversation in 3-5 Korean sentences.
    ///
    /// A blank reply yields [`SUMMARY_UNAVAILABLE`]; transport errors are
    /// returned unchanged.
    pub async fn summarize(
        &self,
        messages: &[InputMessage],
    ) -> Result<Classified<String>, LlmError> {
        let request = CompletionRequest::new(vec![
            ChatMessage::system(build_summary_system_prompt()),
            ChatMessage::user(build_summary_user_prompt(messages)),
        ])
        .with_temperature(self.temperature)
        .with_max_tokens(SUMMARY_MAX_TOKENS);

        let response = self.llm.complete(request).await?;
        let text = response.content.trim();
        let value = if text.is_empty() {
            debug!("Summary reply was blank");
            SUMMARY_UNAVAILABLE.to_string()
        } else {
            text.to_string()
        };

        Ok(Classified {
            value,
            usage: response.usage(),
        })
    }
}

/// Wrap summary text as the output's opaque summary object.
pub fn summary_value(text: &str) -> serde_json::Value {
    json!({ "llm_summary": text })
}

fn build_summary_system_prompt() -> String {
    "You read chat conversations between partners.\n\n\
     Summarize the emotions, communication habits, attachment tendencies and \
     notable traits of the speakers in 3-5 Korean sentences.\n\
     Reply with the summary text only. No JSON, no markdown."
        .to_string()
}

fn build_summary_user_prompt(messages: &[InputMessage]) -> String {
    let mut prompt = String::from("Conversation:\n");
    for message in messages {
        prompt.push_str(&format!("({}) {}\n", message.sender.as_str(), message.text));
    }
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    use rust_decimal::Decimal;

    use crate::llm::{CompletionResponse, FinishReason};
    use crate::pipeline::types::Sender;

    struct CannedLlm(&'static str);

    #[async_trait::async_trait]
    impl LlmProvider for CannedLlm {
        fn model_name(&self) -> &str {
            "canned"
        }

        fn cost_per_token(&self) -> (Decimal, Decimal) {
            (Decimal::ZERO, Decimal::ZERO)
        }

        async fn complete(
            &self,
            request: CompletionRequest,
        ) -> Result<CompletionResponse, LlmError> {
            assert_eq!(request.max_tokens, Some(SUMMARY_MAX_TOKENS));
            Ok(CompletionResponse {
                content: self.0.to_string(),
                input_tokens: 30,
                output_tokens: 12,
                finish_reason: FinishReason::Stop,
                response_id: None,
            })
        }
    }

    #[test]
    fn user_prompt_lists_messages_with_sender() {
        let prompt = build_summary_user_prompt(&[
            InputMessage::new(Sender::Primary, "고마워"),
            InputMessage::new(Sender::Secondary, "응"),
        ]);
        assert!(prompt.contains("(primary) 고마워\n"));
        assert!(prompt.contains("(secondary) 응\n"));
    }

    #[test]
    fn summary_value_shape() {
        assert_eq!(
            summary_value("따뜻한 대화입니다."),
            serde_json::json!({"llm_summary": "따뜻한 대화입니다."})
        );
    }

    #[tokio::test]
    async fn summarize_trims_reply() {
        let llm = Arc::new(CannedLlm("  서로 아끼는 대화입니다.\n"));
        let writer = SummaryWriter::new(llm, 0.1);
        let summary = writer
            .summarize(&[InputMessage::new(Sender::Primary, "사랑해")])
            .await
            .unwrap();
        assert_eq!(summary.value, "서로 아끼는 대화입니다.");
        assert_eq!(summary.usage.total(), 42);
    }

    #[tokio::test]
    async fn blank_reply_is_unavailable() {
        let writer = SummaryWriter::new(Arc::new(CannedLlm("   ")), 0.1);
        let summary = writer
            .summarize(&[InputMessage::new(Sender::Primary, "응")])
            .await
            .unwrap();
        assert_eq!(summary.value, SUMMARY_UNAVAILABLE);
    }
}
