//! Embedded system prompts for the two summarization modes.

/// First (or only) chunk of the day: produce a fresh report.
pub const SINGLE: &str = include_str!("../prompts/single.md");

/// Reduction step: fold another chunk into the running summary.
pub const MANY: &str = include_str!("../prompts/many.md");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompts_are_non_empty_and_distinct() {
        assert!(!SINGLE.trim().is_empty());
        assert!(!MANY.trim().is_empty());
        assert_ne!(SINGLE, MANY);
    }

    #[test]
    fn reduction_prompt_mentions_the_running_summary() {
        assert!(MANY.contains("summary produced so far"));
    }
}
