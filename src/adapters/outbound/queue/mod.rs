/// Queue adapters distributing scan jobs to workers
mod worker_pool;

pub use worker_pool::{ChannelScanQueue, ScanWorkerPool};
