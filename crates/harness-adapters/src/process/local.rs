//! OS child processes via `std::process`.
//!
//! Each child gets two reader threads, one per pipe. They echo every line
//! (when enabled) and forward it over a channel to whoever holds the handle,
//! so a child never stalls on a full pipe even after its output has been
//! detached.

use std::io::{self, BufRead, BufReader, Read, Write};
use std::process::{Child, Command, Stdio};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

use tracing::{debug, trace, warn};

use harness_core::{
    application::{
        ApplicationError,
        ports::{ManagedProcess, ProcessSpawner},
    },
    domain::{CommandSpec, ExitReport, OutputLine, Stream},
    error::HarnessResult,
};

/// Spawns real OS processes.
#[derive(Debug, Clone, Copy)]
pub struct LocalSpawner {
    echo: bool,
}

impl LocalSpawner {
    /// Spawner that echoes child output to the terminal.
    pub fn new() -> Self {
        Self { echo: true }
    }

    /// Spawner that keeps child output to itself (tests, `--quiet`).
    pub fn silent() -> Self {
        Self { echo: false }
    }

    pub fn with_echo(mut self, echo: bool) -> Self {
        self.echo = echo;
        self
    }
}

impl Default for LocalSpawner {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessSpawner for LocalSpawner {
    fn spawn(&self, spec: &CommandSpec) -> HarnessResult<Box<dyn ManagedProcess>> {
        let mut command = Command::new(spec.program());
        command
            .args(spec.arguments())
            .envs(spec.envs().iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = spec.working_dir() {
            command.current_dir(dir);
        }

        let mut child = command.spawn().map_err(|e| ApplicationError::SpawnFailed {
            command: spec.to_string(),
            reason: e.to_string(),
        })?;
        debug!(pid = child.id(), command = %spec, "Spawned");

        let (tx, rx) = mpsc::channel();
        if let Some(stdout) = child.stdout.take() {
            pump(stdout, Stream::Stdout, tx.clone(), self.echo, spec.name().to_string());
        }
        if let Some(stderr) = child.stderr.take() {
            pump(stderr, Stream::Stderr, tx, self.echo, spec.name().to_string());
        }

        Ok(Box::new(LocalProcess {
            child,
            command: spec.to_string(),
            lines: Some(rx),
        }))
    }
}

/// Read `reader` line by line on a background thread until EOF.
fn pump<R>(reader: R, stream: Stream, tx: Sender<OutputLine>, echo: bool, label: String)
where
    R: Read + Send + 'static,
{
    thread::spawn(move || {
        let mut reader = BufReader::new(reader);
        let mut buf = Vec::new();
        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf) {
                Ok(0) => break,
                Ok(_) => {}
                Err(e) => {
                    trace!(%label, error = %e, "Output pipe closed");
                    break;
                }
            }
            let text = String::from_utf8_lossy(&buf)
                .trim_end_matches(['\n', '\r'])
                .to_string();
            if echo {
                echo_line(stream, &label, &text);
            }
            // The receiver is gone once output is detached; keep draining.
            let _ = tx.send(OutputLine { stream, text });
        }
    });
}

fn echo_line(stream: Stream, label: &str, text: &str) {
    let text = text.trim();
    if text.is_empty() {
        return;
    }
    let _ = match stream {
        Stream::Stdout => writeln!(io::stdout().lock(), "[{label}] {text}"),
        Stream::Stderr => writeln!(io::stderr().lock(), "[{label}] {text}"),
    };
}

/// Handle to a child spawned by [`LocalSpawner`].
#[derive(Debug)]
pub struct LocalProcess {
    child: Child,
    command: String,
    lines: Option<Receiver<OutputLine>>,
}

impl ManagedProcess for LocalProcess {
    fn id(&self) -> Option<u32> {
        Some(self.child.id())
    }

    fn next_line(&mut self) -> Option<OutputLine> {
        self.lines.as_ref()?.recv().ok()
    }

    fn detach_output(&mut self) {
        self.lines = None;
    }

    fn kill(&mut self) -> HarnessResult<()> {
        if !self.is_running() {
            return Ok(());
        }
        let pid = self.child.id();
        self.child.kill().map_err(|e| ApplicationError::KillFailed {
            pid: Some(pid),
            reason: e.to_string(),
        })?;
        self.child.wait().map_err(|e| ApplicationError::KillFailed {
            pid: Some(pid),
            reason: e.to_string(),
        })?;
        debug!(pid, command = %self.command, "Killed");
        Ok(())
    }

    fn wait(&mut self) -> HarnessResult<ExitReport> {
        self.lines = None;
        let status = self.child.wait().map_err(|e| ApplicationError::WaitFailed {
            command: self.command.clone(),
            reason: e.to_string(),
        })?;
        Ok(ExitReport {
            code: status.code(),
            success: status.success(),
        })
    }

    fn is_running(&mut self) -> bool {
        matches!(self.child.try_wait(), Ok(None))
    }
}

impl Drop for LocalProcess {
    fn drop(&mut self) {
        if self.is_running() {
            warn!(pid = self.child.id(), command = %self.command, "Killing orphaned child");
            let _ = self.child.kill();
            let _ = self.child.wait();
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn sh(script: &str) -> CommandSpec {
        CommandSpec::new("sh").arg("-c").arg(script)
    }

    #[test]
    fn lines_arrive_tagged_by_stream() {
        let spawner = LocalSpawner::silent();
        let mut child = spawner.spawn(&sh("echo out; echo err 1>&2")).unwrap();

        let mut lines = Vec::new();
        while let Some(line) = child.next_line() {
            lines.push(line);
        }
        assert!(lines.contains(&OutputLine::stdout("out")));
        assert!(lines.contains(&OutputLine::stderr("err")));
        assert!(child.wait().unwrap().success);
    }

    #[test]
    fn kill_stops_a_running_child() {
        let spawner = LocalSpawner::silent();
        let mut child = spawner.spawn(&sh("echo up; exec sleep 30")).unwrap();
        assert_eq!(child.next_line(), Some(OutputLine::stdout("up")));
        assert!(child.is_running());

        child.kill().unwrap();
        assert!(!child.is_running());
    }

    #[test]
    fn kill_after_exit_is_ok() {
        let spawner = LocalSpawner::silent();
        let mut child = spawner.spawn(&sh("true")).unwrap();
        child.wait().unwrap();
        assert!(child.kill().is_ok());
    }

    #[test]
    fn wait_reports_exit_code() {
        let spawner = LocalSpawner::silent();
        let mut child = spawner.spawn(&sh("exit 3")).unwrap();
        let exit = child.wait().unwrap();
        assert_eq!(exit.code, Some(3));
        assert!(!exit.success);
    }

    #[test]
    fn env_and_working_dir_are_applied() {
        let temp = std::env::temp_dir();
        let spec = sh("echo \"$__PORT__\"; pwd")
            .env("__PORT__", "2345")
            .current_dir(&temp);
        let mut child = LocalSpawner::silent().spawn(&spec).unwrap();

        assert_eq!(child.next_line(), Some(OutputLine::stdout("2345")));
        let pwd = child.next_line().unwrap().text;
        assert_eq!(
            std::fs::canonicalize(pwd).unwrap(),
            std::fs::canonicalize(&temp).unwrap()
        );
    }

    #[test]
    fn missing_program_is_spawn_error() {
        let err = LocalSpawner::silent()
            .spawn(&CommandSpec::new("definitely-not-a-real-program-4711"))
            .err()
            .unwrap();
        assert!(err.to_string().contains("Failed to spawn"));
    }

    #[test]
    fn detached_output_yields_nothing() {
        let mut child = LocalSpawner::silent().spawn(&sh("echo a; echo b")).unwrap();
        child.detach_output();
        assert_eq!(child.next_line(), None);
        child.wait().unwrap();
    }
}
