//! Test Runner - main application orchestrator.
//!
//! For every backend of a [`RunPlan`] this service walks one lifecycle,
//! strictly in order and never overlapping with another backend:
//! 1. Clean stale test databases and the previous project directory
//! 2. Generate a fresh project (skipped in fast mode)
//! 3. Start the generated server
//! 4. Run the test suites against it
//! 5. Kill the server
//!
//! The first error ends the whole run; later backends never start.

use std::path::PathBuf;

use tracing::{debug, info, instrument, trace, warn};

use crate::{
    application::{
        ApplicationError,
        ports::{
            DatabaseJanitor, Filesystem, ManagedProcess, NoopListener, PhaseListener,
            ProcessSpawner,
        },
    },
    domain::{
        AppInstance, Backend, BackendPlan, CommandSpec, DEFAULT_APP_NAME, DEFAULT_PORT_ENV,
        DatabaseConfig, ExitReport, OutputPredicate, Phase, ReadinessProbe, RunMode, RunPlan,
        Stream, TEST_DATABASE_MARKER, TestContext, Verdict, project_dir_name,
    },
    error::{HarnessError, HarnessResult},
};

/// Everything the runner needs to know besides its adapters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunnerSettings {
    /// Base name of generated projects (`<app_name>_<label>`).
    pub app_name: String,
    /// Directory the generator, the server and the test runner execute in.
    pub workspace_root: PathBuf,
    /// Directory (relative to the root) whose matching children get their
    /// own test-runner invocation.
    pub packages_dir: PathBuf,
    pub package_marker: String,
    /// Program plus leading arguments; `new …` or `start …` is appended.
    pub generator: CommandSpec,
    /// Program plus leading arguments; the suite path is appended.
    pub test_command: CommandSpec,
    pub port_env: String,
    pub test_database_marker: String,
    pub generator_probe: ReadinessProbe,
    pub server_probe: ReadinessProbe,
    pub mode: RunMode,
}

impl Default for RunnerSettings {
    fn default() -> Self {
        Self {
            app_name: DEFAULT_APP_NAME.into(),
            workspace_root: PathBuf::from("."),
            packages_dir: PathBuf::from("packages"),
            package_marker: "strapi".into(),
            generator: CommandSpec::new("node").arg("packages/strapi/bin/strapi.js"),
            test_command: CommandSpec::new("npx").args(["jest", "--passWithNoTests", "--verbose"]),
            port_env: DEFAULT_PORT_ENV.into(),
            test_database_marker: TEST_DATABASE_MARKER.into(),
            generator_probe: ReadinessProbe::generator(),
            server_probe: ReadinessProbe::server(),
            mode: RunMode::normal(),
        }
    }
}

impl RunnerSettings {
    /// Reject settings that would make a step meaningless.
    pub fn validate(&self) -> HarnessResult<()> {
        self.generator_probe.validate()?;
        self.server_probe.validate()?;
        CommandSpec::from_parts(self.generator.program(), self.generator.arguments())?;
        CommandSpec::from_parts(self.test_command.program(), self.test_command.arguments())?;
        if self.app_name.is_empty() {
            return Err(HarnessError::Configuration {
                message: "app name must not be empty".into(),
            });
        }
        Ok(())
    }
}

/// One test-runner invocation and how it ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuiteRun {
    pub target: PathBuf,
    pub exit: ExitReport,
}

/// Outcome of the test phase for one backend.
///
/// Failures are recorded, never raised.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SuiteSummary {
    pub runs: Vec<SuiteRun>,
}

impl SuiteSummary {
    pub fn total(&self) -> usize {
        self.runs.len()
    }

    pub fn failed(&self) -> usize {
        self.runs.iter().filter(|r| !r.exit.success).count()
    }
}

/// What happened to one backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendReport {
    pub backend: Backend,
    pub dir_name: String,
    pub port: u16,
    /// False in fast mode, where the previous project is reused.
    pub generated: bool,
    pub suites: SuiteSummary,
}

/// What happened to every backend, in run order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub backends: Vec<BackendReport>,
}

impl RunReport {
    pub fn failed_suites(&self) -> usize {
        self.backends.iter().map(|b| b.suites.failed()).sum()
    }
}

/// Drives the clean → generate → start → test → stop lifecycle.
pub struct TestRunner {
    spawner: Box<dyn ProcessSpawner>,
    filesystem: Box<dyn Filesystem>,
    janitor: Box<dyn DatabaseJanitor>,
    listener: Box<dyn PhaseListener>,
    settings: RunnerSettings,
}

impl TestRunner {
    /// Create a new runner with the given adapters.
    pub fn new(
        spawner: Box<dyn ProcessSpawner>,
        filesystem: Box<dyn Filesystem>,
        janitor: Box<dyn DatabaseJanitor>,
        settings: RunnerSettings,
    ) -> Self {
        Self {
            spawner,
            filesystem,
            janitor,
            listener: Box::new(NoopListener),
            settings,
        }
    }

    pub fn with_listener(mut self, listener: Box<dyn PhaseListener>) -> Self {
        self.listener = listener;
        self
    }

    pub fn settings(&self) -> &RunnerSettings {
        &self.settings
    }

    /// Where the project for `backend` lives.
    pub fn project_dir(&self, backend: Backend) -> PathBuf {
        self.settings
            .workspace_root
            .join(project_dir_name(&self.settings.app_name, backend))
    }

    /// Run every backend of the plan, one after another.
    pub fn run(&self, plan: &RunPlan) -> HarnessResult<RunReport> {
        let mut report = RunReport::default();
        for slot in plan.backends() {
            report.backends.push(self.test_process(slot)?);
        }
        info!(
            backends = report.backends.len(),
            failed_suites = report.failed_suites(),
            "Run finished"
        );
        Ok(report)
    }

    /// Full lifecycle for one backend.
    #[instrument(skip_all, fields(backend = %plan.backend(), port = plan.port))]
    pub fn test_process(&self, plan: &BackendPlan) -> HarnessResult<BackendReport> {
        let backend = plan.backend();
        let mode = self.settings.mode;

        self.enter(backend, Phase::Cleaning);
        self.clean(backend, mode)?;

        if !mode.is_fast() {
            self.enter(backend, Phase::Generating);
            self.generate(&plan.database)?;
        }

        self.enter(backend, Phase::Starting);
        let mut server = self.start(backend, plan.port)?;

        self.enter(backend, Phase::Testing);
        let context = TestContext::new(plan.port).with_port_env(self.settings.port_env.as_str());
        let suites = self.test(&context)?;

        server.kill()?;
        self.enter(backend, Phase::Stopped);

        Ok(BackendReport {
            backend,
            dir_name: project_dir_name(&self.settings.app_name, backend),
            port: plan.port,
            generated: !mode.is_fast(),
            suites,
        })
    }

    /// Remove leftovers from a previous run.
    ///
    /// Test database cleanup is best-effort: any failure is swallowed.
    /// The project directory is kept in fast mode.
    #[instrument(skip(self), fields(fast = mode.is_fast()))]
    pub fn clean(&self, backend: Backend, mode: RunMode) -> HarnessResult<()> {
        if backend.is_document_store() {
            match self.janitor.drop_matching(&self.settings.test_database_marker) {
                Ok(dropped) => debug!(count = dropped.len(), "Dropped test databases"),
                Err(e) => debug!(error = %e, "Test database cleanup skipped"),
            }
        }

        if mode.is_fast() {
            debug!("Fast mode: keeping project directory");
            return Ok(());
        }

        let dir = self.project_dir(backend);
        if self.filesystem.exists(&dir) {
            info!(dir = %dir.display(), "Removing stale project");
            self.filesystem.remove_dir_all(&dir)?;
        }
        Ok(())
    }

    /// Scaffold a project for `database`'s backend.
    ///
    /// The generator is killed as soon as it reports either outcome.
    #[instrument(skip_all, fields(backend = %database.backend()))]
    pub fn generate(&self, database: &DatabaseConfig) -> HarnessResult<()> {
        let backend = database.backend();
        let dir_name = project_dir_name(&self.settings.app_name, backend);
        let spec = self
            .settings
            .generator
            .clone()
            .args(["new", dir_name.as_str(), "--dev"])
            .args(database.generator_args())
            .current_dir(&self.settings.workspace_root)
            .label(format!("generate:{}", backend.label()));

        info!(command = %spec, "Generating project");
        let mut child = self.spawner.spawn(&spec)?;

        let verdict = await_verdict(
            child.as_mut(),
            &self.settings.generator_probe,
            &spec,
            "the project was ready",
        );
        let killed = child.kill();
        let verdict = verdict?;
        killed?;

        match verdict {
            Verdict::Ready => {
                info!(dir = %dir_name, "Project generated");
                Ok(())
            }
            Verdict::Failed | Verdict::Pending => Err(ApplicationError::GenerationFailed {
                backend: backend.to_string(),
            }
            .into()),
        }
    }

    /// Boot the generated server and hand back its live process.
    ///
    /// The caller owns the handle and must kill it.
    #[instrument(skip(self))]
    pub fn start(&self, backend: Backend, port: u16) -> HarnessResult<Box<dyn ManagedProcess>> {
        let app = AppInstance::new(&self.settings.app_name, backend, port);
        let spec = self
            .settings
            .generator
            .clone()
            .arg("start")
            .args(app.start_args())
            .current_dir(&self.settings.workspace_root)
            .label(format!("server:{}", backend.label()));

        info!(command = %spec, "Starting server");
        let mut server = self.spawner.spawn(&spec)?;

        match await_verdict(
            server.as_mut(),
            &self.settings.server_probe,
            &spec,
            "the server was ready",
        )? {
            Verdict::Ready => {
                server.detach_output();
                info!(app = %app, pid = ?server.id(), "Server ready");
                Ok(server)
            }
            Verdict::Failed | Verdict::Pending => {
                server.kill()?;
                Err(ApplicationError::ServerFailed {
                    backend: backend.to_string(),
                }
                .into())
            }
        }
    }

    /// Run the root suite, then every matching package suite, in order.
    ///
    /// The port reaches each test-runner child through `context`. A suite
    /// that fails is logged and recorded; it never stops the sequence.
    #[instrument(skip_all, fields(port = context.port()))]
    pub fn test(&self, context: &TestContext) -> HarnessResult<SuiteSummary> {
        let mut summary = SuiteSummary::default();

        for target in self.suite_targets()? {
            let (key, value) = context.env_pair();
            let spec = self
                .settings
                .test_command
                .clone()
                .arg(target.display().to_string())
                .env(key, value)
                .current_dir(&self.settings.workspace_root)
                .label("tests");

            info!(target = %target.display(), "Running test suite");
            let mut child = self.spawner.spawn(&spec)?;
            let exit = child.wait()?;

            if exit.success {
                debug!(target = %target.display(), "Suite passed");
            } else {
                warn!(target = %target.display(), code = ?exit.code, "Suite reported failures");
            }
            summary.runs.push(SuiteRun { target, exit });
        }

        Ok(summary)
    }

    /// Root first, then `<root>/<packages>/<name>` for each child whose name
    /// contains the package marker, sorted by name.
    fn suite_targets(&self) -> HarnessResult<Vec<PathBuf>> {
        let root = &self.settings.workspace_root;
        let mut targets = vec![root.clone()];

        let packages = root.join(&self.settings.packages_dir);
        if !self.filesystem.exists(&packages) {
            warn!(dir = %packages.display(), "No packages directory; running root suite only");
            return Ok(targets);
        }

        let mut names = self.filesystem.list_dir(&packages)?;
        names.sort();
        targets.extend(
            names
                .into_iter()
                .filter(|name| name.contains(self.settings.package_marker.as_str()))
                .map(|name| packages.join(name)),
        );
        Ok(targets)
    }

    fn enter(&self, backend: Backend, phase: Phase) {
        debug!(%backend, %phase, "Phase");
        self.listener.on_phase(backend, phase);
    }
}

/// Read output until the predicate decides. Stderr is logged, never matched.
fn await_verdict(
    child: &mut dyn ManagedProcess,
    probe: &dyn OutputPredicate,
    spec: &CommandSpec,
    waiting_for: &str,
) -> HarnessResult<Verdict> {
    while let Some(line) = child.next_line() {
        match line.stream {
            Stream::Stderr => trace!(command = spec.name(), line = %line.text, "stderr"),
            Stream::Stdout => match probe.classify(&line.text) {
                Verdict::Pending => trace!(command = spec.name(), line = %line.text, "stdout"),
                verdict => {
                    debug!(command = spec.name(), ?verdict, line = %line.text, "Marker matched");
                    return Ok(verdict);
                }
            },
        }
    }

    Err(ApplicationError::ProcessExited {
        command: spec.to_string(),
        waiting_for: waiting_for.into(),
    }
    .into())
}

// ── tests ─────────────────────────────────────────────────────────────────────
