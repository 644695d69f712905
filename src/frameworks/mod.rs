//! Framework-specific steps
//!
//! - `angular`: builder checks run before the build
//! - `nextjs`: config override, standalone layout and route overrides

pub mod angular;
pub mod nextjs;
