//! The conversational document-building core: extraction normalization,
//! merging, progress tracking, context caching, and the orchestrator that
//! sequences them per turn.

pub mod context_cache;
pub mod handlers;
pub mod merge;
pub mod normalize;
pub mod orchestrator;
pub mod progress;
pub mod prompts;

#[cfg(test)]
pub mod test_support;
