//! Token usage reported by the chat service.

use serde::{Deserialize, Serialize};

/// Token counters for one completion call.
///
/// Streaming chunks repeat the running totals, so the latest value wins.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingUsage {
    /// Tokens generated across all outputs.
    pub completion_tokens: i32,
    /// Tokens spent on reasoning.
    pub reasoning_tokens: i32,
    /// Tokens in the prompt.
    pub prompt_tokens: i32,
    /// Prompt plus completion tokens.
    pub total_tokens: i32,
    /// Prompt tokens served from the prompt cache.
    pub cached_prompt_text_tokens: i32,
    /// Search sources consulted by server-side tools.
    pub num_sources_used: i32,
}

impl SamplingUsage {
    /// Create usage from prompt and completion counts.
    #[must_use]
    pub fn new(prompt_tokens: i32, completion_tokens: i32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
            ..Self::default()
        }
    }

    /// Set reasoning tokens.
    #[must_use]
    pub fn with_reasoning_tokens(mut self, tokens: i32) -> Self {
        self.reasoning_tokens = tokens;
        self
    }

    /// Whether no counter is set.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_totals() {
        let usage = SamplingUsage::new(3, 2);
        assert_eq!(usage.total_tokens, 5);
        assert!(!usage.is_empty());
        assert!(SamplingUsage::default().is_empty());
    }

    #[test]
    fn test_deserialize_partial() {
        let usage: SamplingUsage =
            serde_json::from_str(r#"{"prompt_tokens":4,"total_tokens":6}"#).unwrap();
        assert_eq!(usage.prompt_tokens, 4);
        assert_eq!(usage.completion_tokens, 0);
        assert_eq!(usage.total_tokens, 6);
    }
}
