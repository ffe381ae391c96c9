// Search string generation: prompt building, the run state machine and its HTTP surface.
// Model calls go through llm_client; the fallback lives in synthesis.

pub mod handlers;
pub mod orchestrator;
pub mod prompts;
