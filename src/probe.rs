//! Best-effort introspection helpers
//!
//! Workspace and tool introspection is flaky by nature: the user's toolchain
//! may be missing, old or configured in ways we cannot read. Nothing here
//! fails the pipeline. A [`ProbeChain`] tries each probe in order and stops at
//! the first answer; a [`Capability`] query may come back `Unknown`.

use std::fmt;
use tracing::{debug, warn};

type ProbeFn<'a, T> = Box<dyn FnOnce() -> anyhow::Result<Option<T>> + 'a>;

/// Answer of the probe that succeeded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Probed<T> {
    pub probe: &'static str,
    pub value: T,
}

/// Ordered list of fallible probes, each yielding an optional result
pub struct ProbeChain<'a, T> {
    subject: &'static str,
    probes: Vec<(&'static str, ProbeFn<'a, T>)>,
}

impl<'a, T> ProbeChain<'a, T> {
    /// `subject` names what is being probed for, in log messages
    pub fn new(subject: &'static str) -> Self {
        Self {
            subject,
            probes: Vec::new(),
        }
    }

    pub fn probe<F>(mut self, name: &'static str, probe: F) -> Self
    where
        F: FnOnce() -> anyhow::Result<Option<T>> + 'a,
    {
        self.probes.push((name, Box::new(probe)));
        self
    }

    pub fn len(&self) -> usize {
        self.probes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.probes.is_empty()
    }

    /// Runs probes until one answers. Failures are logged and skipped.
    pub fn run(self) -> Option<Probed<T>> {
        let subject = self.subject;
        for (name, probe) in self.probes {
            match probe() {
                Ok(Some(value)) => {
                    debug!(subject, probe = name, "Probe succeeded");
                    return Some(Probed { probe: name, value });
                }
                Ok(None) => debug!(subject, probe = name, "Probe found nothing"),
                Err(e) => debug!(subject, probe = name, error = %format!("{:#}", e), "Probe failed"),
            }
        }
        debug!(subject, "All probes exhausted, continuing unchecked");
        None
    }
}

/// Result of a best-effort capability query
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Capability {
    Supported,
    /// The tool answered and the answer is not acceptable
    Unsupported(String),
    /// The tool could not be asked or its answer could not be read
    Unknown(String),
}

impl Capability {
    pub fn is_supported(&self) -> bool {
        matches!(self, Capability::Supported)
    }

    /// Logs an `Unknown` answer; returns self for chaining
    pub fn log_unknown(self, subject: &str) -> Self {
        if let Capability::Unknown(reason) = &self {
            warn!(subject, reason = %reason, "Could not determine capability, proceeding anyway");
        }
        self
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Capability::Supported => f.write_str("supported"),
            Capability::Unsupported(detail) => write!(f, "unsupported ({})", detail),
            Capability::Unknown(reason) => write!(f, "unknown ({})", reason),
        }
    }
}
