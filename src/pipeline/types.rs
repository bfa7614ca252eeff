//! Shared types for the labeling pipeline.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ClassifierParseError;
use crate::llm::TokenUsage;
use crate::pipeline::aggregate::TraitVector;
use crate::taxonomy::{Category, TaxonomyLabel};

// ── Sender ──────────────────────────────────────────────────────────

/// Who wrote a message.
///
/// Decoding accepts any string; unknown values become [`Sender::Other`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum Sender {
    Primary,
    Secondary,
    #[default]
    Other,
}

impl Sender {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::Secondary => "secondary",
            Self::Other => "other",
        }
    }
}

impl From<String> for Sender {
    fn from(value: String) -> Self {
        match value.as_str() {
            "primary" => Self::Primary,
            "secondary" => Self::Secondary,
            _ => Self::Other,
        }
    }
}

// ── Messages ────────────────────────────────────────────────────────

/// One chat message to classify.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputMessage {
    pub sender: Sender,
    /// May be empty; empty text matches no label.
    pub text: String,
}

impl InputMessage {
    pub fn new(sender: Sender, text: impl Into<String>) -> Self {
        Self {
            sender,
            text: text.into(),
        }
    }
}

/// Matched label identifiers keyed by category identifier.
///
/// Keys are strings rather than [`Category`] so collaborator output can be
/// carried verbatim. A key is only present when its list is non-empty for
/// rule output; collaborator output is not re-validated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Labels(BTreeMap<String, Vec<String>>);

impl Labels {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the matched labels of one category. Empty lists are not stored.
    pub fn insert(&mut self, category: Category, labels: Vec<String>) {
        if !labels.is_empty() {
            self.0.insert(category.id().to_string(), labels);
        }
    }

    /// Label identifiers recorded for `category`, empty when absent.
    pub fn get(&self, category: Category) -> &[String] {
        self.0
            .get(category.id())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Whether `label` is present anywhere in its category's list.
    pub fn contains<L: TaxonomyLabel>(&self, label: L) -> bool {
        self.get(L::CATEGORY).iter().any(|id| id == label.id())
    }

    pub fn has_category(&self, category: Category) -> bool {
        self.0.contains_key(category.id())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of category keys present.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }
}

impl From<BTreeMap<String, Vec<String>>> for Labels {
    fn from(map: BTreeMap<String, Vec<String>>) -> Self {
        Self(map)
    }
}

/// A message together with its label assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabeledMessage {
    #[serde(default)]
    pub sender: Sender,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub labels: Labels,
}

impl LabeledMessage {
    /// A message whose labels are unavailable.
    pub fn unlabeled(message: &InputMessage) -> Self {
        Self {
            sender: message.sender,
            text: message.text.clone(),
            labels: Labels::new(),
        }
    }
}

// ── Labeling outcome ────────────────────────────────────────────────

/// Which classifier produced the labels of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelingStrategy {
    /// Send the batch to the external text generator.
    #[default]
    Llm,
    /// Deterministic keyword matching only.
    Rules,
}

impl LabelingStrategy {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Llm => "llm",
            Self::Rules => "rules",
        }
    }
}

/// Result of the hybrid classifier.
#[derive(Debug, Clone, PartialEq)]
pub enum LabelingOutcome {
    /// The collaborator's records, as returned.
    Labeled(Vec<LabeledMessage>),
    /// The reply did not parse; no labels are available.
    ParseFailed(ClassifierParseError),
}

impl LabelingOutcome {
    pub fn is_parse_failure(&self) -> bool {
        matches!(self, Self::ParseFailed(_))
    }
}

// ── Pipeline output ─────────────────────────────────────────────────

/// How the labels of a run were obtained.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelingReport {
    pub strategy: LabelingStrategy,
    /// Set when the collaborator's reply could not be parsed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parse_error: Option<ClassifierParseError>,
    /// True when a parse failure was answered with rule labels at the
    /// caller's request.
    pub rule_fallback: bool,
}

impl LabelingReport {
    /// False when the run carries no labels because parsing failed.
    pub fn labels_available(&self) -> bool {
        self.parse_error.is_none() || self.rule_fallback
    }
}

/// Token usage and estimated cost of the collaborator calls in one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UsageReport {
    pub tokens: TokenUsage,
    pub cost: Decimal,
    pub llm_calls: u32,
}

/// Everything one pipeline run returns to the caller.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineOutput {
    pub run_id: Uuid,
    pub labeled_messages: Vec<LabeledMessage>,
    pub trait_vector: TraitVector,
    /// Opaque summary object, `null` when summaries are off.
    pub summary: serde_json::Value,
    pub labeling: LabelingReport,
    pub usage: UsageReport,
    pub processed_at: DateTime<Utc>,
}

/// One request to the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineRequest {
    #[serde(default)]
    pub user_id: Option<String>,
    pub messages: Vec<InputMessage>,
}
