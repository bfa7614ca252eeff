//! LLM integration seam.
//!
//! The labeling pipeline talks to an external text generator through the
//! [`LlmProvider`] trait. Provider HTTP clients are supplied by the embedding
//! service; tests use in-process stubs.

pub mod provider;

pub use provider::*;
