//! Harness Core - Hexagonal Architecture Implementation
//!
//! This crate provides the domain and application layers of the end-to-end
//! harness that exercises a project generator against several database
//! backends, following hexagonal (ports and adapters) architecture.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │           harness-cli (CLI)             │
//! │   config, logging, exit-code policy     │
//! └──────────────────┬──────────────────────┘
//!                    │ calls
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │         Application Services            │
//! │              (TestRunner)               │
//! │  clean → generate → start → test → stop │
//! └──────────────────┬──────────────────────┘
//!                    │ uses
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │      Application Ports (Traits)         │
//! │ (Spawner, Filesystem, DatabaseJanitor)  │
//! └──────────────────┬──────────────────────┘
//!                    │ implemented by
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │    harness-adapters (Infrastructure)    │
//! │ (LocalSpawner, LocalFilesystem, Mongo)  │
//! └─────────────────────────────────────────┘
//!                    │
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │         Domain Layer (Pure Logic)       │
//! │ (Backend, RunPlan, ReadinessProbe, …)   │
//! └─────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,no_run
//! use harness_core::prelude::*;
//!
//! # fn adapters() -> (Box<dyn ProcessSpawner>, Box<dyn Filesystem>, Box<dyn DatabaseJanitor>) { unimplemented!() }
//! let (spawner, filesystem, janitor) = adapters();
//! let runner = TestRunner::new(spawner, filesystem, janitor, RunnerSettings::default());
//!
//! let plan = RunPlan::with_random_ports(
//!     Backend::ALL.map(DatabaseConfig::local_default),
//!     PortRange::default(),
//!     &mut rand::thread_rng(),
//! );
//! let report = runner.run(&plan).unwrap();
//! println!("{} suites failed", report.failed_suites());
//! ```

pub mod domain;

pub mod application;

pub mod error;

// Public API - what external crates should use
pub mod prelude {
    pub use crate::application::{
        BackendReport, RunReport, RunnerSettings, SuiteSummary, TestRunner,
        ports::{
            DatabaseJanitor, Filesystem, ManagedProcess, NoopListener, PhaseListener,
            ProcessSpawner,
        },
    };
    pub use crate::domain::{
        AppInstance, Backend, BackendPlan, CommandSpec, DatabaseConfig, ExitReport, OutputLine,
        OutputPredicate, Phase, PortRange, ReadinessProbe, RunMode, RunPlan, Stream, TestContext,
        Verdict,
    };
    pub use crate::error::{HarnessError, HarnessResult};
}

// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
