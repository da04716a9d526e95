//! Scripted process spawner for testing.
//!
//! Each spawn is matched against a list of rules; the first rule whose
//! needle appears in an argument decides what the fake child prints and how
//! it exits. Every spawn is recorded so tests can assert on the exact
//! command lines, environments, and whether each child was killed.

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use harness_core::{
    application::{
        ApplicationError,
        ports::{ManagedProcess, ProcessSpawner},
    },
    domain::{CommandSpec, ExitReport, OutputLine},
    error::HarnessResult,
};

use crate::filesystem::MemoryFilesystem;

/// What a fake child does.
#[derive(Debug, Clone, Default)]
pub struct Script {
    lines: Vec<OutputLine>,
    exit_code: i32,
    fail_spawn: bool,
    creates: Option<(MemoryFilesystem, PathBuf)>,
}

impl Script {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stdout(mut self, text: impl Into<String>) -> Self {
        self.lines.push(OutputLine::stdout(text));
        self
    }

    pub fn stderr(mut self, text: impl Into<String>) -> Self {
        self.lines.push(OutputLine::stderr(text));
        self
    }

    pub fn exit_code(mut self, code: i32) -> Self {
        self.exit_code = code;
        self
    }

    /// The spawn itself fails, as if the program were missing.
    pub fn fail_spawn(mut self) -> Self {
        self.fail_spawn = true;
        self
    }

    /// Create `dir` in `fs` when the child is spawned.
    pub fn creates_dir(mut self, fs: &MemoryFilesystem, dir: impl Into<PathBuf>) -> Self {
        self.creates = Some((fs.clone(), dir.into()));
        self
    }
}

/// One spawn as observed by the [`ScriptedSpawner`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpawnRecord {
    pub spec: CommandSpec,
    pub killed: bool,
    pub waited: bool,
}

#[derive(Debug, Default)]
struct SpawnerState {
    rules: Vec<(String, Script)>,
    records: Vec<SpawnRecord>,
}

/// Fake [`ProcessSpawner`]. Clones share rules and records.
#[derive(Debug, Clone, Default)]
pub struct ScriptedSpawner {
    state: Arc<Mutex<SpawnerState>>,
}

impl ScriptedSpawner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `script` for spawns whose program or any argument contains `needle`.
    pub fn on(self, needle: impl Into<String>, script: Script) -> Self {
        if let Ok(mut state) = self.state.lock() {
            state.rules.push((needle.into(), script));
        }
        self
    }

    /// Every spawn so far, in order.
    pub fn records(&self) -> Vec<SpawnRecord> {
        self.state
            .lock()
            .map(|s| s.records.clone())
            .unwrap_or_default()
    }

    /// Spawned command specs, in order.
    pub fn spawned(&self) -> Vec<CommandSpec> {
        self.records().into_iter().map(|r| r.spec).collect()
    }

    fn script_for(state: &SpawnerState, spec: &CommandSpec) -> Script {
        state
            .rules
            .iter()
            .find(|(needle, _)| {
                spec.program().contains(needle.as_str()) || spec.has_arg_containing(needle)
            })
            .map(|(_, script)| script.clone())
            .unwrap_or_default()
    }
}

impl ProcessSpawner for ScriptedSpawner {
    fn spawn(&self, spec: &CommandSpec) -> HarnessResult<Box<dyn ManagedProcess>> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| ApplicationError::LockPoisoned)?;
        let script = Self::script_for(&state, spec);

        if script.fail_spawn {
            return Err(ApplicationError::SpawnFailed {
                command: spec.to_string(),
                reason: "scripted spawn failure".into(),
            }
            .into());
        }
        if let Some((fs, dir)) = &script.creates {
            fs.create_dir_all(dir);
        }

        let index = state.records.len();
        state.records.push(SpawnRecord {
            spec: spec.clone(),
            killed: false,
            waited: false,
        });

        Ok(Box::new(ScriptedProcess {
            index,
            lines: script.lines.into(),
            exit_code: script.exit_code,
            running: true,
            detached: false,
            state: Arc::clone(&self.state),
        }))
    }
}

struct ScriptedProcess {
    index: usize,
    lines: VecDeque<OutputLine>,
    exit_code: i32,
    running: bool,
    detached: bool,
    state: Arc<Mutex<SpawnerState>>,
}

impl ScriptedProcess {
    fn update(&self, f: impl FnOnce(&mut SpawnRecord)) {
        if let Ok(mut state) = self.state.lock() {
            if let Some(record) = state.records.get_mut(self.index) {
                f(record);
            }
        }
    }
}

impl ManagedProcess for ScriptedProcess {
    fn id(&self) -> Option<u32> {
        u32::try_from(self.index).ok().map(|i| 10_000 + i)
    }

    fn next_line(&mut self) -> Option<OutputLine> {
        if self.detached {
            return None;
        }
        self.lines.pop_front()
    }

    fn detach_output(&mut self) {
        self.detached = true;
    }

    fn kill(&mut self) -> HarnessResult<()> {
        if self.running {
            self.running = false;
            self.update(|r| r.killed = true);
        }
        Ok(())
    }

    fn wait(&mut self) -> HarnessResult<ExitReport> {
        self.running = false;
        self.lines.clear();
        self.update(|r| r.waited = true);
        Ok(ExitReport::from_code(self.exit_code))
    }

    fn is_running(&mut self) -> bool {
        self.running
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use harness_core::domain::Stream;

    #[test]
    fn first_matching_rule_wins() {
        let spawner = ScriptedSpawner::new()
            .on("new", Script::new().stdout("generated"))
            .on("start", Script::new().stdout("serving"));

        let mut child = spawner
            .spawn(&CommandSpec::new("node").args(["bin.js", "start"]))
            .unwrap();
        assert_eq!(child.next_line().map(|l| l.text), Some("serving".into()));
        assert_eq!(child.next_line(), None);
    }

    #[test]
    fn unmatched_spawn_exits_cleanly() {
        let spawner = ScriptedSpawner::new();
        let mut child = spawner.spawn(&CommandSpec::new("npx")).unwrap();
        assert!(child.wait().unwrap().success);
        assert!(spawner.records()[0].waited);
    }

    #[test]
    fn kill_is_recorded() {
        let spawner = ScriptedSpawner::new();
        let mut child = spawner.spawn(&CommandSpec::new("node")).unwrap();
        assert!(child.is_running());
        child.kill().unwrap();
        assert!(!child.is_running());
        assert!(spawner.records()[0].killed);
    }

    #[test]
    fn stderr_lines_keep_their_stream() {
        let spawner = ScriptedSpawner::new().on("x", Script::new().stderr("warn"));
        let mut child = spawner.spawn(&CommandSpec::new("x")).unwrap();
        assert_eq!(child.next_line().unwrap().stream, Stream::Stderr);
    }

    #[test]
    fn spawn_can_create_directories() {
        let fs = MemoryFilesystem::new();
        let spawner =
            ScriptedSpawner::new().on("new", Script::new().creates_dir(&fs, "/work/testApp_pg"));
        spawner
            .spawn(&CommandSpec::new("node").arg("new"))
            .unwrap();
        assert!(fs.directories().contains(&PathBuf::from("/work/testApp_pg")));
    }

    #[test]
    fn scripted_spawn_failure() {
        let spawner = ScriptedSpawner::new().on("npx", Script::new().fail_spawn());
        assert!(spawner.spawn(&CommandSpec::new("npx")).is_err());
        assert!(spawner.records().is_empty());
    }
}
