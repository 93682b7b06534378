// hcsync-api: Async Rust client for the hub REST API
//
// Covers the three endpoints the mirror needs: the device inventory
// (`/api/devices`) and the refresh-state long-poll (`/api/refreshStates`,
// with and without a `last` cursor). Everything is read-only.

pub mod auth;
pub mod client;
pub mod devices;
pub mod error;
pub mod models;
pub mod refresh;
pub mod transport;

pub use auth::Credentials;
pub use client::HubClient;
pub use error::Error;
pub use models::{ChangeSet, RefreshStatus};
pub use transport::{TlsMode, TransportConfig};
