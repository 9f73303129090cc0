//! Daily summarization: merge the two activity logs, pack them into
//! token-bounded chunks, and drive the configured chat model through a
//! single-pass or sequential-reduction summarization.

mod chunk;
mod merge;
mod pipeline;
pub mod prompt;

pub use chunk::{CHARS_PER_TOKEN, estimated_tokens, split_by_token_limit};
pub use merge::merge_logs;
pub use pipeline::{SummaryPipeline, check_provider};
