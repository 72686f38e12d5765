pub mod config;
pub mod parser;
pub mod writer;

pub use config::{MetadataQuery, MetadataQueryConfigs};
pub use writer::SYNTHETIC_ID_BASE;
