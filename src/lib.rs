//! Trait Lens: labels chat messages against a fixed relationship taxonomy
//! and condenses a batch into a trait vector.

pub mod config;
pub mod error;
pub mod llm;
pub mod pipeline;
pub mod taxonomy;

pub use config::{ParseFailurePolicy, PipelineConfig, SummaryMode};
pub use error::{AggregateError, ClassifierParseError, Error, LlmError, PipelineError};
pub use pipeline::aggregate::{TraitVector, aggregate};
pub use pipeline::hybrid::HybridClassifier;
pub use pipeline::processor::TraitPipeline;
pub use pipeline::rules::RuleClassifier;
pub use pipeline::types::{
    InputMessage, LabeledMessage, Labels, LabelingStrategy, PipelineOutput, PipelineRequest,
    Sender,
};
