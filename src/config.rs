//! Configuration types.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::pipeline::hybrid::HybridConfig;
use crate::pipeline::types::LabelingStrategy;

/// How the run obtains its conversation summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SummaryMode {
    /// Ask for labels and summary in one collaborator call.
    Combined,
    /// Second call, concurrent with labeling.
    #[default]
    Separate,
    /// No summary; the output carries `null`.
    Off,
}

/// What to do when the collaborator's labeling reply cannot be parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParseFailurePolicy {
    /// Every message gets an empty label set.
    #[default]
    EmptyLabels,
    /// Label the batch with the rule classifier instead.
    RuleFallback,
}

impl FromStr for LabelingStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "llm" => Ok(Self::Llm),
            "rules" => Ok(Self::Rules),
            other => Err(format!("expected llm or rules, got '{other}'")),
        }
    }
}

impl FromStr for SummaryMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "combined" => Ok(Self::Combined),
            "separate" => Ok(Self::Separate),
            "off" => Ok(Self::Off),
            other => Err(format!("expected combined, separate or off, got '{other}'")),
        }
    }
}

impl FromStr for ParseFailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "empty" => Ok(Self::EmptyLabels),
            "rules" => Ok(Self::RuleFallback),
            other => Err(format!("expected empty or rules, got '{other}'")),
        }
    }
}

/// Pipeline configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// Which classifier labels the batch.
    pub strategy: LabelingStrategy,
    pub summary: SummaryMode,
    pub on_parse_failure: ParseFailurePolicy,
    /// Sampling temperature for collaborator calls.
    pub temperature: f32,
    /// Max tokens for the labeling call.
    pub max_tokens: u32,
    /// Cut JSON out of fenced or chatty replies before parsing.
    pub extract_json: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            strategy: LabelingStrategy::Llm,
            summary: SummaryMode::Separate,
            on_parse_failure: ParseFailurePolicy::EmptyLabels,
            temperature: 0.1,
            max_tokens: 4096,
            extract_json: false,
        }
    }
}

impl PipelineConfig {
    /// Build config from `TRAIT_LENS_*` environment variables.
    /// Unset variables keep their defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        Ok(Self {
            strategy: parse_var(&lookup, "TRAIT_LENS_STRATEGY")?.unwrap_or(defaults.strategy),
            summary: parse_var(&lookup, "TRAIT_LENS_SUMMARY")?.unwrap_or(defaults.summary),
            on_parse_failure: parse_var(&lookup, "TRAIT_LENS_ON_PARSE_FAILURE")?
                .unwrap_or(defaults.on_parse_failure),
            temperature: parse_var(&lookup, "TRAIT_LENS_TEMPERATURE")?
                .unwrap_or(defaults.temperature),
            max_tokens: parse_var(&lookup, "TRAIT_LENS_MAX_TOKENS")?
                .unwrap_or(defaults.max_tokens),
            extract_json: parse_var(&lookup, "TRAIT_LENS_EXTRACT_JSON")?
                .unwrap_or(defaults.extract_json),
        })
    }

    /// Settings for the hybrid classifier.
    pub fn hybrid(&self) -> HybridConfig {
        HybridConfig {
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            extract_json: self.extract_json,
        }
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(key) else {
        return Ok(None);
    };
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }

    raw.parse::<T>()
        .map(Some)
        .map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.strategy, LabelingStrategy::Llm);
        assert_eq!(config.summary, SummaryMode::Separate);
        assert_eq!(config.on_parse_failure, ParseFailurePolicy::EmptyLabels);
        assert_eq!(config.max_tokens, 4096);
        assert!(!config.extract_json);
    }

    #[test]
    fn empty_lookup_gives_defaults() {
        let config = PipelineConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, PipelineConfig::default());
    }

    #[test]
    fn reads_every_variable() {
        let config = PipelineConfig::from_lookup(lookup(&[
            ("TRAIT_LENS_STRATEGY", "rules"),
            ("TRAIT_LENS_SUMMARY", "Combined"),
            ("TRAIT_LENS_ON_PARSE_FAILURE", "rules"),
            ("TRAIT_LENS_TEMPERATURE", "0.5"),
            ("TRAIT_LENS_MAX_TOKENS", "1024"),
            ("TRAIT_LENS_EXTRACT_JSON", "true"),
        ]))
        .unwrap();
        assert_eq!(config.strategy, LabelingStrategy::Rules);
        assert_eq!(config.summary, SummaryMode::Combined);
        assert_eq!(config.on_parse_failure, ParseFailurePolicy::RuleFallback);
        assert_eq!(config.temperature, 0.5);
        assert_eq!(config.max_tokens, 1024);
        assert!(config.extract_json);
    }

    #[test]
    fn blank_value_keeps_default() {
        let config = PipelineConfig::from_lookup(lookup(&[("TRAIT_LENS_SUMMARY", "  ")])).unwrap();
        assert_eq!(config.summary, SummaryMode::Separate);
    }

    #[test]
    fn invalid_value_names_the_key() {
        let err = PipelineConfig::from_lookup(lookup(&[("TRAIT_LENS_MAX_TOKENS", "lots")]))
            .unwrap_err();
        let ConfigError::InvalidValue { key, .. } = err;
        assert_eq!(key, "TRAIT_LENS_MAX_TOKENS");

        let err = PipelineConfig::from_lookup(lookup(&[("TRAIT_LENS_STRATEGY", "magic")]))
            .unwrap_err();
        assert!(err.to_string().contains("TRAIT_LENS_STRATEGY"));
    }

    #[test]
    fn hybrid_settings_follow_config() {
        let config = PipelineConfig {
            temperature: 0.3,
            max_tokens: 100,
            extract_json: true,
            ..PipelineConfig::default()
        };
        let hybrid = config.hybrid();
        assert_eq!(hybrid.temperature, 0.3);
        assert_eq!(hybrid.max_tokens, 100);
        assert!(hybrid.extract_json);
    }

    #[test]
    fn from_env_matches_lookup_over_process_environment() {
        let from_env = PipelineConfig::from_env().ok();
        let from_lookup = PipelineConfig::from_lookup(|key| std::env::var(key).ok()).ok();
        assert_eq!(from_env, from_lookup);
    }

    #[test]
    fn lookup_ignores_unrelated_keys() {
        let config = PipelineConfig::from_lookup(lookup(&[
            ("STRATEGY", "rules"),
            ("TRAIT_LENS_UNKNOWN", "x"),
        ]))
        .unwrap();
        assert_eq!(config, PipelineConfig::default());
    }
}
