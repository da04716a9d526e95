//! Child process adapters.

mod local;
mod scripted;

pub use local::{LocalProcess, LocalSpawner};
pub use scripted::{Script, ScriptedSpawner, SpawnRecord};
