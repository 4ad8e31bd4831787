//! Errbeacon Core - Domain logic for the telemetry forwarder
//!
//! This crate contains the hexagonal core with:
//! - **Config sanitation** - [`config::sanitize`] turns untyped admin
//!   settings into a typed [`config::DeliveryConfig`] (or nothing, when
//!   delivery is disabled or misconfigured)
//! - **Severity classification** - [`severity::classify`] maps host
//!   error codes to the severity scale of the remote service
//! - **Capture scope** - [`scope::ScopeContext`] accumulates breadcrumbs,
//!   context blocks and (PII-gated) identity per unit of work
//! - **Report payloads** - [`report::ReportPayload`] is the normalized,
//!   immutable per-capture unit handed to the transport
//! - **Port definitions** - Traits for adapters: `SettingsProvider`,
//!   `HostRuntime`, `Transport`
//!
//! # Architecture
//!
//! This crate follows the hexagonal (ports & adapters) architecture pattern.
//! Everything here is pure domain logic; the HTTP transport, the host error
//! trap and the settings surface are adapters implementing the port traits.

pub mod config;
pub mod event;
pub mod ports;
pub mod report;
pub mod scope;
pub mod severity;

pub use config::{sanitize, DeliveryConfig, RawConfig};
pub use event::HostEvent;
pub use report::{ReportKind, ReportPayload};
pub use scope::{Breadcrumb, ScopeContext, ScopeSnapshot, UserIdentity};
pub use severity::{classify, Severity};
