pub mod gateway;
pub mod types;
pub mod version;

pub use gateway::{ClusterGateway, CommandGateway, Query, QueryRunner, Tool};
pub use version::{CephVersion, Feature, VersionGate, VersionNumber, VersionResolver};
