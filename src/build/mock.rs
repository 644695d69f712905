use super::{CommandOutput, CommandRunner, Invocation};
use crate::error::{AdapterError, Result};
use std::sync::{Arc, Mutex};

type SideEffect = Arc<dyn Fn(&Invocation) + Send + Sync>;

struct Rule {
    needle: String,
    response: std::result::Result<String, String>,
    side_effect: Option<SideEffect>,
}

/// Command runner that answers from a script instead of spawning processes
///
/// Rules match when the command line contains the given text; the first match
/// wins. Unmatched commands fail like a missing program would.
#[derive(Default)]
pub struct ScriptedRunner {
    rules: Mutex<Vec<Rule>>,
    calls: Mutex<Vec<Invocation>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Succeed with `stdout` for commands containing `needle`
    pub fn respond(self, needle: &str, stdout: &str) -> Self {
        self.push(needle, Ok(stdout.to_string()), None)
    }

    /// Fail with a non-zero exit for commands containing `needle`
    pub fn fail(self, needle: &str, stderr: &str) -> Self {
        self.push(needle, Err(stderr.to_string()), None)
    }

    /// Like [`respond`](Self::respond), running `effect` first, e.g. to drop build artifacts
    pub fn respond_with<F>(self, needle: &str, stdout: &str, effect: F) -> Self
    where
        F: Fn(&Invocation) + Send + Sync + 'static,
    {
        self.push(needle, Ok(stdout.to_string()), Some(Arc::new(effect)))
    }

    fn push(
        self,
        needle: &str,
        response: std::result::Result<String, String>,
        side_effect: Option<SideEffect>,
    ) -> Self {
        if let Ok(mut rules) = self.rules.lock() {
            rules.push(Rule {
                needle: needle.to_string(),
                response,
                side_effect,
            });
        }
        self
    }

    pub fn calls(&self) -> Vec<Invocation> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Number of recorded calls whose command line contains `needle`
    pub fn count(&self, needle: &str) -> usize {
        self.calls()
            .iter()
            .filter(|inv| inv.command_line().contains(needle))
            .count()
    }
}

impl CommandRunner for ScriptedRunner {
    fn run(&self, invocation: &Invocation) -> Result<CommandOutput> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(invocation.clone());
        }

        let command = invocation.command_line();
        let (response, effect) = {
            let rules = self.rules.lock().map_err(|_| AdapterError::BuildFailed {
                command: command.clone(),
                status: "runner script poisoned".to_string(),
            })?;
            match rules.iter().find(|r| command.contains(&r.needle)) {
                Some(rule) => (rule.response.clone(), rule.side_effect.clone()),
                None => {
                    return Err(AdapterError::BuildFailed {
                        command,
                        status: "failed to spawn: no scripted response".to_string(),
                    })
                }
            }
        };

        if let Some(effect) = effect {
            effect(invocation);
        }

        match response {
            Ok(stdout) => Ok(CommandOutput {
                stdout,
                stderr: String::new(),
            }),
            Err(stderr) => Err(AdapterError::BuildFailed {
                command,
                status: format!("exit status: 1\n{}", stderr),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_matching_rule_wins() {
        let runner = ScriptedRunner::new()
            .respond("nx show project", "{}")
            .fail("npm run build", "boom");

        let ok = runner
            .run(&Invocation::new("npx", "/app").args(["nx", "show", "project", "web"]))
            .unwrap();
        assert_eq!(ok.stdout, "{}");

        let err = runner
            .run(&Invocation::new("npm", "/app").args(["run", "build"]))
            .unwrap_err();
        assert!(err.to_string().contains("boom"));

        assert_eq!(runner.calls().len(), 2);
        assert_eq!(runner.count("npm run build"), 1);
    }

    #[test]
    fn test_unmatched_command_fails() {
        let runner = ScriptedRunner::new();
        assert!(runner.run(&Invocation::new("node", "/app")).is_err());
    }
}
