//! Test support for shoal: a scripted, recording [`ProcessRunner`].
//!
//! [`ScriptedRunner`] replays canned outcomes in push order and records
//! every spawn request it sees, so tests can assert on the exact argv,
//! cwd, environment, and stream dispositions a command resolved to,
//! without spawning anything.

use std::collections::{BTreeMap, VecDeque};
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use shoal::{ProcessRunner, RawOutcome, SpawnRequest, StdioKind};

/// One spawn request, as the runner saw it.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub argv: Vec<String>,
    pub cwd: PathBuf,
    pub env: BTreeMap<String, String>,
    pub stdout: StdioKind,
    pub stderr: StdioKind,
}

/// A [`ProcessRunner`] that records requests and replays scripted
/// outcomes.
///
/// Outcomes are consumed in push order; when the script runs dry, every
/// further call succeeds with an empty zero-exit outcome. Keep a second
/// `Arc` to the runner to inspect [`ScriptedRunner::calls`] after the
/// code under test has run.
#[derive(Debug, Default)]
pub struct ScriptedRunner {
    outcomes: Mutex<VecDeque<io::Result<RawOutcome>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedRunner {
    pub fn new() -> Arc<Self> {
        Arc::new(ScriptedRunner::default())
    }

    /// Queue an outcome for the next run.
    pub fn push(&self, outcome: RawOutcome) {
        self.outcomes.lock().unwrap().push_back(Ok(outcome));
    }

    /// Queue a launch failure for the next run.
    pub fn push_spawn_error(&self, error: io::Error) {
        self.outcomes.lock().unwrap().push_back(Err(error));
    }

    /// Every request seen so far, in order.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    /// The single request seen so far; panics when there was not exactly
    /// one.
    pub fn only_call(&self) -> RecordedCall {
        let calls = self.calls();
        assert_eq!(calls.len(), 1, "expected exactly one spawn, saw {}", calls.len());
        calls.into_iter().next().unwrap()
    }
}

impl ProcessRunner for ScriptedRunner {
    fn run(&self, req: SpawnRequest) -> io::Result<RawOutcome> {
        self.calls.lock().unwrap().push(RecordedCall {
            argv: req.argv,
            cwd: req.cwd,
            env: req.env,
            stdout: req.stdout.kind(),
            stderr: req.stderr.kind(),
        });
        self.outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(RawOutcome::default()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shoal::StdioSpec;

    fn request(argv: &[&str]) -> SpawnRequest {
        SpawnRequest {
            argv: argv.iter().map(|s| s.to_string()).collect(),
            cwd: PathBuf::from("/work"),
            env: BTreeMap::new(),
            stdout: StdioSpec::Capture,
            stderr: StdioSpec::Capture,
        }
    }

    #[test]
    fn replays_outcomes_in_order() {
        let runner = ScriptedRunner::new();
        runner.push(RawOutcome::ok("first"));
        runner.push(RawOutcome::exit(2));

        assert_eq!(runner.run(request(&["a"])).unwrap().stdout, b"first");
        assert_eq!(runner.run(request(&["b"])).unwrap().code, 2);
        // Script exhausted: default success
        assert_eq!(runner.run(request(&["c"])).unwrap(), RawOutcome::default());
    }

    #[test]
    fn records_requests() {
        let runner = ScriptedRunner::new();
        runner.run(request(&["git", "status"])).unwrap();

        let call = runner.only_call();
        assert_eq!(call.argv, ["git", "status"]);
        assert_eq!(call.cwd, PathBuf::from("/work"));
        assert_eq!(call.stdout, StdioKind::Capture);
    }
}
