//! Provider implementations wrapper module.

mod gemini;
mod instruct;
mod mock;
mod pipeline;

pub use gemini::GeminiProvider;
pub use instruct::InstructProvider;
pub use mock::MockProvider;
pub use pipeline::PipelineProvider;
