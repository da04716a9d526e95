//! Document database adapters.

mod memory;
mod mongo;

pub use memory::MemoryJanitor;
pub use mongo::{DEFAULT_MONGO_URI, DEFAULT_SELECTION_TIMEOUT, MongoJanitor};
