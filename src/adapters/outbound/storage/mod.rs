/// Storage adapters implementing the scan store ports
mod in_memory_store;

pub use in_memory_store::{FaultPlan, InMemoryScanStore, InMemorySession};
