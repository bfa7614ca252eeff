//! Message labeling and trait-vector pipeline.
//!
//! Every batch flows through:
//! 1. `RuleClassifier::classify()` or `HybridClassifier::classify()`: labels
//!    per message (keyword matching, or one LLM call)
//! 2. `aggregate()`: fixed-shape trait vector over the labeled batch
//! 3. `SummaryWriter::summarize()`: optional free-text summary
//!
//! `TraitPipeline` wires the steps together.

pub mod aggregate;
pub mod hybrid;
pub mod processor;
pub mod rules;
pub mod summary;
pub mod types;
