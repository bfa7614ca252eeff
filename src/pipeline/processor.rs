//! Trait pipeline: label a message batch, aggregate it, attach a summary.
//!
//! Flow:
//! 1. Reject empty batches (no collaborator call)
//! 2. Label with the configured strategy; the separate summary call runs
//!    concurrently since it only needs the raw messages
//! 3. Resolve a parse failure with the configured policy
//! 4. Aggregate into a trait vector
//!
//! A parse failure never silently switches classifiers. With the default
//! policy every message comes back with an empty label set and the run's
//! labeling report carries the parse error.

use std::sync::Arc;

use chrono::Utc;
use futures::future::join_all;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::{ParseFailurePolicy, PipelineConfig, SummaryMode};
use crate::error::{AggregateError, LlmError, PipelineError};
use crate::llm::{LlmProvider, TokenUsage};
use crate::pipeline::aggregate::aggregate;
use crate::pipeline::hybrid::HybridClassifier;
use crate::pipeline::rules::RuleClassifier;
use crate::pipeline::summary::{SUMMARY_UNAVAILABLE, SummaryWriter, summary_value};
use crate::pipeline::types::{
    InputMessage, LabeledMessage, LabelingOutcome, LabelingReport, LabelingStrategy,
    PipelineOutput, PipelineRequest, UsageReport,
};

/// Labeling and aggregation pipeline over one collaborator.
pub struct TraitPipeline {
    llm: Arc<dyn LlmProvider>,
    config: PipelineConfig,
    rules: RuleClassifier,
    hybrid: HybridClassifier,
    summaries: SummaryWriter,
}

impl TraitPipeline {
    /// Create a pipeline with the built-in keyword dictionary.
    pub fn new(llm: Arc<dyn LlmProvider>, config: PipelineConfig) -> Self {
        Self {
            rules: RuleClassifier::standard(),
            hybrid: HybridClassifier::new(Arc::clone(&llm), config.hybrid()),
            summaries: SummaryWriter::new(Arc::clone(&llm), config.temperature),
            llm,
            config,
        }
    }

    /// Create a pipeline configured from `TRAIT_LENS_*` environment variables.
    pub fn from_env(llm: Arc<dyn LlmProvider>) -> crate::error::Result<Self> {
        let config = PipelineConfig::from_env()?;
        Ok(Self::new(llm, config))
    }

    /// Use `rules` for rule labeling and as the taxonomy sent to the
    /// collaborator.
    pub fn with_rules(mut self, rules: RuleClassifier) -> Self {
        self.hybrid = HybridClassifier::new(Arc::clone(&self.llm), self.config.hybrid())
            .with_dictionary(rules.dictionary().clone());
        self.rules = rules;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run the whole pipeline over one batch.
    pub async fn run(
        &self,
        user_id: Option<&str>,
        messages: &[InputMessage],
    ) -> Result<PipelineOutput, PipelineError> {
        if messages.is_empty() {
            return Err(AggregateError::EmptyInput.into());
        }

        let run_id = Uuid::new_v4();
        let strategy = self.config.strategy;
        info!(
            %run_id,
            user_id = user_id.unwrap_or("-"),
            count = messages.len(),
            strategy = strategy.label(),
            "Starting trait pipeline run"
        );

        let mut usage = UsageReport::default();

        let (outcome, summary_text) = match (strategy, self.config.summary) {
            (LabelingStrategy::Llm, SummaryMode::Combined) => {
                let combined = self.hybrid.classify_with_summary(messages).await?;
                record(&mut usage, combined.usage);
                let summary = combined
                    .value
                    .summary
                    .unwrap_or_else(|| SUMMARY_UNAVAILABLE.to_string());
                (combined.value.labeling, Some(summary))
            }
            (strategy, mode) => {
                let summary = async {
                    match mode {
                        SummaryMode::Off => Ok(None),
                        SummaryMode::Combined | SummaryMode::Separate => {
                            self.summaries.summarize(messages).await.map(Some)
                        }
                    }
                };
                let (labeling, summary) = tokio::join!(self.label(strategy, messages), summary);

                let (outcome, labeling_usage) = labeling?;
                if let Some(tokens) = labeling_usage {
                    record(&mut usage, tokens);
                }
                let summary = summary?.map(|s| {
                    record(&mut usage, s.usage);
                    s.value
                });
                (outcome, summary)
            }
        };

        let (labeled_messages, labeling) = self.resolve(strategy, outcome, messages);
        let trait_vector = aggregate(user_id, &labeled_messages)?;

        usage.cost = self
            .llm
            .calculate_cost(usage.tokens.input_tokens, usage.tokens.output_tokens);

        info!(
            %run_id,
            count = labeled_messages.len(),
            labels_available = labeling.labels_available(),
            llm_calls = usage.llm_calls,
            tokens = usage.tokens.total(),
            "Trait pipeline run complete"
        );

        Ok(PipelineOutput {
            run_id,
            labeled_messages,
            trait_vector,
            summary: summary_text
                .as_deref()
                .map(summary_value)
                .unwrap_or(serde_json::Value::Null),
            labeling,
            usage,
            processed_at: Utc::now(),
        })
    }

    /// Run one request.
    pub async fn run_request(
        &self,
        request: &PipelineRequest,
    ) -> Result<PipelineOutput, PipelineError> {
        self.run(request.user_id.as_deref(), &request.messages).await
    }

    /// Run independent requests concurrently. Results keep request order;
    /// one failure does not affect the others.
    pub async fn run_many(
        &self,
        requests: &[PipelineRequest],
    ) -> Vec<Result<PipelineOutput, PipelineError>> {
        info!(count = requests.len(), "Processing request batch");

        let results = join_all(requests.iter().map(|r| self.run_request(r))).await;

        let failed = results.iter().filter(|r| r.is_err()).count();
        info!(
            succeeded = results.len() - failed,
            failed,
            "Request batch complete"
        );
        results
    }

    /// Label with `strategy`. Token usage is `None` when no collaborator call
    /// was made.
    async fn label(
        &self,
        strategy: LabelingStrategy,
        messages: &[InputMessage],
    ) -> Result<(LabelingOutcome, Option<TokenUsage>), LlmError> {
        match strategy {
            LabelingStrategy::Rules => {
                debug!(count = messages.len(), "Labeling with rule classifier");
                let labeled = self.rules.label_history(messages);
                Ok((LabelingOutcome::Labeled(labeled), None))
            }
            LabelingStrategy::Llm => {
                let classified = self.hybrid.classify(messages).await?;
                Ok((classified.value, Some(classified.usage)))
            }
        }
    }

    /// Turn a labeling outcome into records plus a report, applying the
    /// parse-failure policy.
    fn resolve(
        &self,
        strategy: LabelingStrategy,
        outcome: LabelingOutcome,
        messages: &[InputMessage],
    ) -> (Vec<LabeledMessage>, LabelingReport) {
        match outcome {
            LabelingOutcome::Labeled(labeled) => (
                labeled,
                LabelingReport {
                    strategy,
                    parse_error: None,
                    rule_fallback: false,
                },
            ),
            LabelingOutcome::ParseFailed(error) => {
                let rule_fallback =
                    self.config.on_parse_failure == ParseFailurePolicy::RuleFallback;
                warn!(
                    error = %error,
                    rule_fallback,
                    "Labels unavailable for this batch"
                );

                let labeled = if rule_fallback {
                    self.rules.label_history(messages)
                } else {
                    messages.iter().map(LabeledMessage::unlabeled).collect()
                };

                (
                    labeled,
                    LabelingReport {
                        strategy,
                        parse_error: Some(error),
                        rule_fallback,
                    },
                )
            }
        }
    }
}

fn record(usage: &mut UsageReport, tokens: TokenUsage) {
    usage.tokens.add(tokens);
    usage.llm_calls += 1;
}
