/// Adapters layer - Infrastructure implementations
///
/// This layer contains concrete implementations of the ports,
/// providing the actual integration with the scanner tool, the NVD feed,
/// the filesystem and the in-process job queue.
pub mod outbound;
