mod error;
pub mod source;
mod types;

pub use error::FetchError;
pub use source::{HttpSource, SnapshotSource};
pub use types::{Air, ChargingStatus, Environment, LightReading, Power, Snapshot, Vector3};
