//! Subprocess boundary
//!
//! The framework build, the Nx project introspection and the Node-based config
//! loaders all run through a [`CommandRunner`]. Each call blocks until the child
//! exits; output is buffered and handed back only after termination.

mod mock;
mod runner;

pub use mock::ScriptedRunner;
pub use runner::{CommandOutput, CommandRunner, Invocation, ProcessRunner};
