//! Token-bounded greedy packing of the merged event sequence.
//!
//! Token counts are a character-count heuristic, not provider tokenization:
//! close enough to keep each LLM call under its context budget, cheap
//! enough to run over a full day of events.

use anyhow::Result;

use recap_event::Event;

/// Rough characters-per-token constant for English-ish JSON payloads.
pub const CHARS_PER_TOKEN: usize = 4;

/// Heuristic token estimate for one serialized event.
pub fn estimated_tokens(event: &Event) -> usize {
    serde_json::to_string(event)
        .map(|s| s.len())
        .unwrap_or(0)
        / CHARS_PER_TOKEN
}

/// Greedily pack events into JSON-array chunks whose estimated token count
/// stays within `token_limit`.
///
/// Every event lands in exactly one chunk, in input order.  An event whose
/// own estimate exceeds the limit still becomes its own oversized chunk
/// rather than being dropped or split.
pub fn split_by_token_limit(events: &[Event], token_limit: usize) -> Result<Vec<String>> {
    let mut chunks = Vec::new();
    let mut current: Vec<&Event> = Vec::new();
    let mut current_tokens = 0usize;

    for event in events {
        let event_tokens = estimated_tokens(event);
        if !current.is_empty() && current_tokens + event_tokens > token_limit {
            chunks.push(serde_json::to_string(&current)?);
            current.clear();
            current_tokens = 0;
        }
        current.push(event);
        current_tokens += event_tokens;
    }
    if !current.is_empty() {
        chunks.push(serde_json::to_string(&current)?);
    }

    Ok(chunks)
}

// ── Tests ────────────────────────────────────────────────────────────────────
