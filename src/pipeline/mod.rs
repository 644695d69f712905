//! Sequential adapter pipelines
//!
//! Each stage's output feeds the next; there is no parallelism and no retry.
//! Writes are not transactional, so a failed run can leave a partial bundle
//! behind. The final validation stage is what decides success.

pub mod angular;
pub mod context;
pub mod nextjs;

pub use angular::AngularPipeline;
pub use context::PipelineContext;
pub use nextjs::NextJsPipeline;
