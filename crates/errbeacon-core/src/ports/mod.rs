//! Port definitions (hexagonal architecture)
//!
//! Traits implemented by adapters: the settings surface, the host runtime
//! integration and the delivery transport.

pub mod host;
pub mod settings;
pub mod transport;

pub use host::{ErrorTrap, HostError, HostRuntime};
pub use settings::{SettingsProvider, StaticSettings};
pub use transport::{DeliveryResponse, Transport};
