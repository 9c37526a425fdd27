//! Bluetooth Module
//!
//! Drives Govee lights over BLE.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                     LightService                         │
//! │   (per-device lock, registry keyed by address)           │
//! └─────────────────────┬───────────────────────────────────┘
//!                       │
//!                       ▼
//!               ┌──────────────┐        ┌──────────────┐
//!               │   Session    │───────>│   Protocol   │
//!               │ - retry      │        │ - frames     │
//!               │ - ordering   │        │ - checksum   │
//!               │ - state      │        │ - payloads   │
//!               └──────┬───────┘        └──────────────┘
//!                      │
//!                      ▼
//!        BleConnector / GattLink (WinRT, mock, host-provided)
//! ```
//!
//! ## Modules
//!
//! - [`protocol`] - Frame codec, command codes and payload builders
//! - [`transport`] - Traits the session uses to reach a device
//! - [`session`] - Connection acquisition and ordered frame writes
//! - [`service`] - Shared light handles and the device registry

pub mod protocol;
pub mod service;
pub mod session;
pub mod transport;

#[cfg(windows)]
pub mod winrt;

#[cfg(test)]
pub(crate) mod mock;

pub use service::{Light, LightService};
pub use session::{Session, SessionConfig};
pub use transport::{BleConnector, GattLink};
