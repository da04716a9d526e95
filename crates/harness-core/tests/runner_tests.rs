//! Lifecycle tests for the test runner against in-memory adapters.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use harness_adapters::{MemoryFilesystem, MemoryJanitor, Script, ScriptedSpawner};
use harness_core::{
    application::ApplicationError,
    domain::{GENERATOR_FAILURE_MARKER, GENERATOR_READY_MARKER, SERVER_READY_MARKER},
    prelude::*,
};

const ROOT: &str = "/work";

fn settings(mode: RunMode) -> RunnerSettings {
    RunnerSettings {
        workspace_root: PathBuf::from(ROOT),
        mode,
        ..RunnerSettings::default()
    }
}

/// Generator that creates the project dir and reports ready, server that
/// boots, and a workspace with two matching packages and one other.
fn happy_world() -> (ScriptedSpawner, MemoryFilesystem, MemoryJanitor) {
    let fs = MemoryFilesystem::new();
    fs.create_dir_all("/work/packages/strapi-admin");
    fs.create_dir_all("/work/packages/strapi-utils");
    fs.create_dir_all("/work/packages/docs");

    // The server rule comes first: its `--path=<dir>` also names the project.
    let spawner = ScriptedSpawner::new()
        .on(
            "--path=",
            Script::new()
                .stdout("Server booting")
                .stdout(format!("{SERVER_READY_MARKER}, press CTRL+C")),
        )
        .on(
            "testApp_mongo",
            Script::new()
                .creates_dir(&fs, "/work/testApp_mongo")
                .stdout("Creating project")
                .stdout(format!("Your application {GENERATOR_READY_MARKER} /work")),
        )
        .on(
            "testApp_pg",
            Script::new()
                .creates_dir(&fs, "/work/testApp_pg")
                .stdout(format!("Your application {GENERATOR_READY_MARKER} /work")),
        )
        .on(
            "testApp_mysql",
            Script::new()
                .creates_dir(&fs, "/work/testApp_mysql")
                .stdout(format!("Your application {GENERATOR_READY_MARKER} /work")),
        );

    let janitor = MemoryJanitor::with_databases(["admin", "strapi-test-1699999999999"]);
    (spawner, fs, janitor)
}

fn runner(
    spawner: &ScriptedSpawner,
    fs: &MemoryFilesystem,
    janitor: &MemoryJanitor,
    mode: RunMode,
) -> TestRunner {
    TestRunner::new(
        Box::new(spawner.clone()),
        Box::new(fs.clone()),
        Box::new(janitor.clone()),
        settings(mode),
    )
}

fn plan(backends: &[Backend], port: u16) -> RunPlan {
    RunPlan::new(
        backends
            .iter()
            .map(|b| BackendPlan::new(DatabaseConfig::local_default(*b), port))
            .collect(),
    )
}

fn generator_spawns(spawner: &ScriptedSpawner) -> Vec<CommandSpec> {
    spawner
        .spawned()
        .into_iter()
        .filter(|s| s.arguments().iter().any(|a| a == "new"))
        .collect()
}

#[test]
fn postgres_lifecycle_runs_in_order() {
    let (spawner, fs, janitor) = happy_world();
    let runner = runner(&spawner, &fs, &janitor, RunMode::normal());

    let report = runner.run(&plan(&[Backend::Postgres], 3210)).unwrap();

    let records = spawner.records();
    // generate, start, root suite, two package suites
    assert_eq!(records.len(), 5);

    let generate = &records[0];
    assert!(generate.spec.has_arg_containing("--dbclient=postgres"));
    assert!(generate.spec.arguments().iter().any(|a| a == "testApp_pg"));
    assert!(generate.spec.arguments().iter().any(|a| a == "--dev"));
    assert!(generate.killed, "generator must be killed once ready");

    let start = &records[1];
    assert!(start.spec.arguments().iter().any(|a| a == "--path=testApp_pg"));
    assert!(start.spec.arguments().iter().any(|a| a == "--port=3210"));
    assert!(start.killed, "server must be killed after testing");

    let suites: Vec<_> = records[2..].iter().collect();
    assert!(suites.iter().all(|r| r.waited && !r.killed));
    assert!(suites[0].spec.has_arg_containing(ROOT));
    assert!(suites[1].spec.has_arg_containing("packages/strapi-admin"));
    assert!(suites[2].spec.has_arg_containing("packages/strapi-utils"));
    assert!(!suites.iter().any(|r| r.spec.has_arg_containing("docs")));

    let backend = &report.backends[0];
    assert_eq!(backend.dir_name, "testApp_pg");
    assert!(backend.generated);
    assert_eq!(backend.suites.total(), 3);

    // relational backends never touch the document store
    assert_eq!(janitor.calls(), 0);
}

#[test]
fn every_test_runner_sees_the_port() {
    let (spawner, fs, janitor) = happy_world();
    let runner = runner(&spawner, &fs, &janitor, RunMode::normal());

    runner.run(&plan(&[Backend::Mysql], 4321)).unwrap();

    let suites: Vec<_> = spawner
        .spawned()
        .into_iter()
        .filter(|s| s.name() == "tests")
        .collect();
    assert!(suites.len() >= 2);
    assert!(suites.iter().all(|s| s.env_value("__PORT__") == Some("4321")));
}

#[test]
fn clean_then_generate_leaves_one_project_per_backend() {
    let (spawner, fs, janitor) = happy_world();
    fs.create_dir_all("/work/testApp_pg/stale");
    let runner = runner(&spawner, &fs, &janitor, RunMode::normal());

    for backend in Backend::ALL {
        runner.clean(backend, RunMode::normal()).unwrap();
        runner
            .generate(&DatabaseConfig::local_default(backend))
            .unwrap();
    }

    let dirs = fs.directories();
    for name in ["testApp_mongo", "testApp_pg", "testApp_mysql"] {
        let dir = PathBuf::from(ROOT).join(name);
        assert_eq!(dirs.iter().filter(|d| **d == dir).count(), 1);
    }
    assert!(!fs.exists(std::path::Path::new("/work/testApp_pg/stale")));
    assert_eq!(fs.removed(), vec![PathBuf::from("/work/testApp_pg")]);
}

#[test]
fn mongo_clean_drops_test_databases() {
    let (spawner, fs, janitor) = happy_world();
    let runner = runner(&spawner, &fs, &janitor, RunMode::normal());

    runner.clean(Backend::Mongo, RunMode::normal()).unwrap();
    assert_eq!(janitor.databases(), vec!["admin"]);
}

#[test]
fn unreachable_document_store_does_not_stop_the_run() {
    let (spawner, fs, _) = happy_world();
    let janitor = MemoryJanitor::unreachable();
    let runner = runner(&spawner, &fs, &janitor, RunMode::normal());

    let report = runner.run(&plan(&[Backend::Mongo], 2000)).unwrap();
    assert_eq!(janitor.calls(), 1);
    assert_eq!(report.backends.len(), 1);
}

#[test]
fn generator_failure_marker_rejects_and_kills() {
    let fs = MemoryFilesystem::new();
    let spawner = ScriptedSpawner::new().on(
        "testApp_pg",
        Script::new()
            .stdout(format!("⛔️ {GENERATOR_FAILURE_MARKER}!"))
            .stdout(format!("Your application {GENERATOR_READY_MARKER} /work")),
    );
    let runner = runner(&spawner, &fs, &MemoryJanitor::new(), RunMode::normal());

    let err = runner
        .generate(&DatabaseConfig::local_default(Backend::Postgres))
        .unwrap_err();
    assert!(matches!(
        err,
        HarnessError::Application(ApplicationError::GenerationFailed { .. })
    ));
    assert!(spawner.records()[0].killed);
}

#[test]
fn generator_stderr_is_never_matched() {
    let fs = MemoryFilesystem::new();
    let spawner = ScriptedSpawner::new().on(
        "testApp_pg",
        Script::new()
            .stderr(GENERATOR_FAILURE_MARKER)
            .stdout(GENERATOR_READY_MARKER),
    );
    let runner = runner(&spawner, &fs, &MemoryJanitor::new(), RunMode::normal());

    runner
        .generate(&DatabaseConfig::local_default(Backend::Postgres))
        .unwrap();
}

#[test]
fn generator_exiting_silently_is_an_error() {
    let fs = MemoryFilesystem::new();
    let spawner =
        ScriptedSpawner::new().on("testApp_pg", Script::new().stdout("Installing..."));
    let runner = runner(&spawner, &fs, &MemoryJanitor::new(), RunMode::normal());

    let err = runner
        .generate(&DatabaseConfig::local_default(Backend::Postgres))
        .unwrap_err();
    assert!(matches!(
        err,
        HarnessError::Application(ApplicationError::ProcessExited { .. })
    ));
}

#[test]
fn start_returns_a_live_killable_handle() {
    let (spawner, fs, janitor) = happy_world();
    let runner = runner(&spawner, &fs, &janitor, RunMode::normal());

    let mut server = runner.start(Backend::Postgres, 1777).unwrap();
    assert!(server.is_running());
    server.kill().unwrap();
    assert!(!server.is_running());
    assert!(spawner.records()[0].killed);
}

#[test]
fn fast_mode_skips_generation_and_removal() {
    let (spawner, fs, janitor) = happy_world();
    fs.create_dir_all("/work/testApp_pg");
    let runner = runner(&spawner, &fs, &janitor, RunMode::fast());

    let report = runner.run(&plan(&[Backend::Postgres], 2500)).unwrap();

    assert!(generator_spawns(&spawner).is_empty());
    assert!(fs.removed().is_empty());
    assert!(fs.exists(std::path::Path::new("/work/testApp_pg")));
    assert!(
        spawner
            .spawned()
            .iter()
            .any(|s| s.has_arg_containing("--path=testApp_pg"))
    );
    assert!(!report.backends[0].generated);
}

#[test]
fn failing_backend_stops_later_backends() {
    let (_, fs, janitor) = happy_world();
    // Mongo's generator can't reach its database.
    let failing = ScriptedSpawner::new()
        .on(
            "testApp_mongo",
            Script::new().stdout(GENERATOR_FAILURE_MARKER),
        )
        .on("testApp", Script::new().stdout(GENERATOR_READY_MARKER));
    let runner = runner(&failing, &fs, &janitor, RunMode::normal());

    let err = runner.run(&plan(&Backend::ALL, 3000)).unwrap_err();
    assert!(matches!(
        err,
        HarnessError::Application(ApplicationError::GenerationFailed { ref backend }) if backend == "mongo"
    ));
    assert_eq!(failing.records().len(), 1);
    assert!(failing.records()[0].killed);
}

#[test]
fn failing_suites_are_recorded_not_raised() {
    let (spawner, fs, janitor) = happy_world();
    let spawner = spawner.on("jest", Script::new().exit_code(1));
    let runner = runner(&spawner, &fs, &janitor, RunMode::normal());

    let report = runner.run(&plan(&[Backend::Postgres], 3100)).unwrap();
    assert_eq!(report.backends[0].suites.failed(), 3);
    assert_eq!(report.failed_suites(), 3);
    // server still torn down
    assert!(spawner.records()[1].killed);
}

#[test]
fn test_runner_spawn_failure_propagates() {
    let (spawner, fs, janitor) = happy_world();
    let spawner = spawner.on("jest", Script::new().fail_spawn());
    let runner = runner(&spawner, &fs, &janitor, RunMode::normal());

    let err = runner.run(&plan(&[Backend::Postgres], 3100)).unwrap_err();
    assert!(matches!(
        err,
        HarnessError::Application(ApplicationError::SpawnFailed { .. })
    ));
}

#[derive(Clone, Default)]
struct Recorder(Arc<Mutex<Vec<(Backend, Phase)>>>);

impl PhaseListener for Recorder {
    fn on_phase(&self, backend: Backend, phase: Phase) {
        self.0.lock().unwrap().push((backend, phase));
    }
}

#[test]
fn phases_are_reported_in_order() {
    let (spawner, fs, janitor) = happy_world();
    let recorder = Recorder::default();
    let runner = runner(&spawner, &fs, &janitor, RunMode::normal())
        .with_listener(Box::new(recorder.clone()));

    runner
        .run(&plan(&[Backend::Mongo, Backend::Postgres], 3300))
        .unwrap();

    let phases = recorder.0.lock().unwrap().clone();
    let expected: Vec<_> = [Backend::Mongo, Backend::Postgres]
        .into_iter()
        .flat_map(|b| {
            [
                Phase::Cleaning,
                Phase::Generating,
                Phase::Starting,
                Phase::Testing,
                Phase::Stopped,
            ]
            .map(|p| (b, p))
        })
        .collect();
    assert_eq!(phases, expected);
}
