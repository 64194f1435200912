// Tailor and refine: prompt compilation, output normalization and the two
// generation flows. All model calls go through llm_client.

pub mod handlers;
pub mod normalize;
pub mod pipeline;
pub mod prompts;
