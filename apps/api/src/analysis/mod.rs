// Fit analysis: request construction, the provider seam, response validation,
// and the derived views shown to the user.
// All provider calls go through llm_client.

pub mod contract;
pub mod presentation;
pub mod prompts;
pub mod schema;
