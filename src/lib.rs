//! govee_ble_lights: drive Govee light fixtures over Bluetooth LE.
//!
//! Lighting requests (power, brightness, RGB, color temperature) are turned
//! into the vendor's 20-byte command frames and written, in order, to the
//! control characteristic of the light.
//!
//! # Key types
//!
//! - [`Session`] -- one light: bounded-retry connect, ordered frame writes,
//!   last commanded state
//! - [`Light`] / [`LightService`] -- shared, serialized access to sessions
//! - [`BleConnector`] / [`GattLink`] -- the BLE capability a host provides
//! - [`protocol`] -- the pure frame codec
//! - [`Error`] / [`Result`] -- error handling
//!
//! # Example
//!
//! ```
//! use govee_ble_lights::protocol::{encode_single, power_payload, LedCommand};
//!
//! let frame = encode_single(LedCommand::Power, &power_payload(true)).unwrap();
//! assert_eq!(&frame[..3], &[0x33, 0x01, 0x01]);
//! assert_eq!(frame[19], 0x33);
//! ```

pub mod domain;
pub mod error;
pub mod infrastructure;

pub use domain::models::{Brightness, ColorMode, LightState, Rgb, SessionPhase, TurnOn};
pub use domain::profile::{Capabilities, ColorEncoding, DeviceProfile};
pub use domain::settings::{DeviceEntry, Settings, SettingsService};
pub use error::{Error, Result};
pub use infrastructure::bluetooth::protocol;
pub use infrastructure::bluetooth::{
    BleConnector, GattLink, Light, LightService, Session, SessionConfig,
};
pub use infrastructure::logging::{init_logger, LoggingGuard};

#[cfg(windows)]
pub use infrastructure::bluetooth::winrt::{WinRtConnector, WinRtLink};
