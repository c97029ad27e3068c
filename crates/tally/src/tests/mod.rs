//! In-memory collaborators and fixtures for testing code built on top of the engine.

mod utils;

pub use utils::{Job, JobBuilder, MemoryHistory, record};
