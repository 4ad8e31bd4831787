//! Errbeacon Client - Delivery adapters for the telemetry forwarder
//!
//! This crate wires the domain core to the outside world:
//! - [`dsn::Dsn`] - DSN parsing and endpoint derivation
//! - [`transport::HttpTransport`] - best-effort HTTP delivery
//! - [`client::TelemetryClient`] - one-time init, capture entry points,
//!   host error trap
//! - [`host::ProcessHost`] - in-process host runtime adapter
//! - [`hook::install_panic_reporter`] - chained panic hook

pub mod client;
pub mod dsn;
pub mod hook;
pub mod host;
pub mod transport;

pub use client::{TelemetryClient, TelemetryClientBuilder};
pub use dsn::{Dsn, DsnError};
pub use hook::install_panic_reporter;
pub use host::ProcessHost;
pub use transport::HttpTransport;
