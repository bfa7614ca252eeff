//! Integration tests for the labeling pipeline.
//!
//! Each test drives the public API end to end with a stub provider standing
//! in for the text generator.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde_json::{Value, json};
use tokio::time::timeout;

use trait_lens::error::LlmError;
use trait_lens::llm::{CompletionRequest, CompletionResponse, FinishReason, LlmProvider};
use trait_lens::taxonomy::{Category, EmotionExpression};
use trait_lens::{
    AggregateError, InputMessage, LabelingStrategy, ParseFailurePolicy, PipelineConfig,
    PipelineError, PipelineRequest, RuleClassifier, Sender, SummaryMode, TraitPipeline,
    aggregate,
};

/// Maximum time any test is allowed to run before we consider it hung.
const TEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Stub LLM provider that always returns the same text.
struct StubLlm(String);

#[async_trait]
impl LlmProvider for StubLlm {
    fn model_name(&self) -> &str {
        "stub"
    }
    fn cost_per_token(&self) -> (Decimal, Decimal) {
        (Decimal::ZERO, Decimal::ZERO)
    }
    async fn complete(&self, _request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        Ok(CompletionResponse {
            content: self.0.clone(),
            input_tokens: 0,
            output_tokens: 0,
            finish_reason: FinishReason::Stop,
            response_id: None,
        })
    }
}

fn build_pipeline(reply: &str, config: PipelineConfig) -> TraitPipeline {
    let llm: Arc<dyn LlmProvider> = Arc::new(StubLlm(reply.to_string()));
    TraitPipeline::new(llm, config)
}

fn conversation() -> Vec<InputMessage> {
    vec![
        InputMessage::new(Sender::Primary, "너무 보고 싶어, 사랑해!"),
        InputMessage::new(Sender::Secondary, "응"),
        InputMessage::new(Sender::Primary, "오늘도 고마워, 사랑해"),
        InputMessage::new(Sender::Secondary, "밥은 먹었어"),
    ]
}

#[tokio::test]
async fn rules_run_end_to_end() {
    let config = PipelineConfig {
        strategy: LabelingStrategy::Rules,
        summary: SummaryMode::Off,
        ..PipelineConfig::default()
    };
    let pipeline = build_pipeline("unused", config);

    let output = timeout(TEST_TIMEOUT, pipeline.run(Some("user-42"), &conversation()))
        .await
        .expect("timed out")
        .unwrap();

    let tv = &output.trait_vector;
    assert_eq!(tv.message_count, 4);
    assert_eq!(tv.affection_level, 0.5);
    assert_eq!(tv.gratitude_level, 0.25);
    assert_eq!(tv.silence_ratio, 0.25);
    assert_eq!(tv.dominant_emotion, Some(EmotionExpression::Affection));
    assert_eq!(tv.emotional_stability_score, 0.5);

    let json = serde_json::to_value(&output).unwrap();
    assert_eq!(json["summary"], Value::Null);
    assert_eq!(json["labeling"]["strategy"], "rules");
    assert_eq!(json["trait_vector"]["user_id"], "user-42");
    assert_eq!(json["trait_vector"]["dominant_communication"], "silence");
    assert_eq!(
        json["labeled_messages"][3]["labels"],
        json!({"topic_context": ["routine_checkin"]})
    );
}

#[tokio::test]
async fn non_json_reply_gives_unlabeled_messages() {
    let pipeline = build_pipeline(
        "Sure! Here are the labels you asked for.",
        PipelineConfig::default(),
    );

    let output = timeout(TEST_TIMEOUT, pipeline.run(None, &conversation()))
        .await
        .expect("timed out")
        .unwrap();

    assert!(output.labeled_messages.iter().all(|m| m.labels.is_empty()));
    let json = serde_json::to_value(&output.labeling).unwrap();
    assert_eq!(json["parse_error"]["error"], "parse_failed");
    assert_eq!(
        json["parse_error"]["raw"],
        "Sure! Here are the labels you asked for."
    );
    assert_eq!(json["rule_fallback"], false);

    let tv = serde_json::to_value(&output.trait_vector).unwrap();
    assert_eq!(tv["dominant_emotion"], "none");
    assert_eq!(tv["attachment_style"], "secure");
}

#[tokio::test]
async fn rule_fallback_is_opt_in() {
    let config = PipelineConfig {
        on_parse_failure: ParseFailurePolicy::RuleFallback,
        summary: SummaryMode::Off,
        ..PipelineConfig::default()
    };
    let pipeline = build_pipeline("not json", config);

    let output = pipeline.run(None, &conversation()).await.unwrap();

    assert!(output.labeling.rule_fallback);
    let rules = RuleClassifier::standard();
    for (labeled, input) in output.labeled_messages.iter().zip(conversation()) {
        assert_eq!(labeled.labels, rules.classify(&input.text));
    }
}

#[tokio::test]
async fn llm_records_are_used_verbatim() {
    let reply = json!([
        {"sender": "primary", "text": "a", "labels": {"emotion_expression": ["sadness"]}},
        {"sender": "partner", "text": "b", "labels": {"emotion_expression": ["sadness", "made_up"]}}
    ])
    .to_string();
    let config = PipelineConfig {
        summary: SummaryMode::Off,
        ..PipelineConfig::default()
    };
    let pipeline = build_pipeline(&reply, config);

    let output = pipeline
        .run(None, &[InputMessage::new(Sender::Primary, "whatever")])
        .await
        .unwrap();

    // The collaborator's record count wins over the input count.
    assert_eq!(output.labeled_messages.len(), 2);
    assert_eq!(output.labeled_messages[1].sender, Sender::Other);
    assert_eq!(
        output.labeled_messages[1].labels.get(Category::EmotionExpression),
        ["sadness".to_string(), "made_up".to_string()]
    );
    assert_eq!(output.trait_vector.sadness_level, 1.0);
}

#[tokio::test]
async fn separate_summary_is_attached() {
    let pipeline = build_pipeline("[]", PipelineConfig::default());
    // The stub answers every call with "[]", so labeling yields no records.
    let err = pipeline.run(None, &conversation()).await.unwrap_err();
    assert!(matches!(
        err,
        PipelineError::Aggregate(AggregateError::EmptyInput)
    ));

    let config = PipelineConfig {
        strategy: LabelingStrategy::Rules,
        ..PipelineConfig::default()
    };
    let pipeline = build_pipeline("  두 사람은 서로를 아낍니다.  ", config);
    let output = pipeline.run(None, &conversation()).await.unwrap();
    assert_eq!(
        output.summary,
        json!({"llm_summary": "두 사람은 서로를 아낍니다."})
    );
}

#[tokio::test]
async fn combined_reply_that_fails_to_parse_reports_korean_fallback() {
    let config = PipelineConfig {
        summary: SummaryMode::Combined,
        ..PipelineConfig::default()
    };
    let pipeline = build_pipeline("labels: affection", config);

    let output = pipeline.run(None, &conversation()).await.unwrap();

    assert_eq!(output.summary, json!({"llm_summary": "LLM 요약 생성 실패"}));
    assert!(!output.labeling.labels_available());
}

#[tokio::test]
async fn run_many_handles_requests_independently() {
    let config = PipelineConfig {
        strategy: LabelingStrategy::Rules,
        summary: SummaryMode::Off,
        ..PipelineConfig::default()
    };
    let pipeline = build_pipeline("unused", config);

    let requests: Vec<PipelineRequest> = serde_json::from_value(json!([
        {"user_id": "a", "messages": [{"sender": "primary", "text": "고마워"}]},
        {"messages": []},
        {"user_id": "c", "messages": [{"sender": "secondary", "text": "왜?"}]}
    ]))
    .unwrap();

    let results = timeout(TEST_TIMEOUT, pipeline.run_many(&requests))
        .await
        .expect("timed out");

    assert_eq!(results[0].as_ref().unwrap().trait_vector.gratitude_level, 1.0);
    assert!(matches!(
        results[1],
        Err(PipelineError::Aggregate(AggregateError::EmptyInput))
    ));
    assert_eq!(results[2].as_ref().unwrap().trait_vector.questioning_rate, 1.0);
}

#[test]
fn aggregate_is_usable_without_pipeline() {
    let rules = RuleClassifier::standard();
    let labeled = rules.label_history(&conversation());
    let tv = aggregate(Some("direct"), &labeled).unwrap();
    assert_eq!(tv.user_id.as_deref(), Some("direct"));
    assert_eq!(aggregate(None, &[]), Err(AggregateError::EmptyInput));
}
