// fleetdash-api: Async Rust client for the fleet tracking server REST API

pub mod client;
pub mod error;
pub mod transport;
pub mod types;

pub use client::FleetClient;
pub use error::Error;
pub use transport::{TlsMode, TransportConfig};
pub use types::{
    Device, DeviceId, DeviceStatus, EventRecord, EventsQuery, Position, SummaryQuery,
    SummaryRecord, User,
};
