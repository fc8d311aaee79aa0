//! Session layer: run state, durable checkpoints and the run registry

pub mod checkpoint;
pub mod registry;
pub mod state;

pub use checkpoint::{CheckpointError, CheckpointStore, JsonCheckpointStore, MemoryCheckpointStore};
pub use registry::RunRegistry;
pub use state::{RunSnapshot, RunState};
