/// Network adapters for vulnerability feeds
mod nvd_client;
mod nvd_mapper;

pub use nvd_client::NvdClient;
pub use nvd_mapper::{NvdItem, NvdMapper, NvdResponse};
