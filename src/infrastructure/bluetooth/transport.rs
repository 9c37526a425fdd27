//! BLE capability traits.
//!
//! The session never touches a Bluetooth stack directly. It is handed a
//! [`BleConnector`] that can open a [`GattLink`] to one device, and the
//! link can do exactly one useful thing: write bytes to a characteristic.
//! Service discovery, pairing and scanning all live behind these traits.

use async_trait::async_trait;

use crate::error::{Error, Result};

/// An open connection to one device.
#[async_trait]
pub trait GattLink: Send {
    /// Write `data` to the characteristic identified by `characteristic`.
    ///
    /// Resolves once the stack reports the write as issued (or, with
    /// `with_response`, acknowledged at the GATT layer).
    async fn write(&mut self, characteristic: &str, data: &[u8], with_response: bool) -> Result<()>;

    /// Close the connection. Further writes should fail.
    async fn disconnect(&mut self) -> Result<()>;

    /// Whether the stack still considers the link up.
    fn is_connected(&self) -> bool;
}

/// Opens links to devices by address.
#[async_trait]
pub trait BleConnector: Send + Sync {
    type Link: GattLink + 'static;

    async fn connect(&self, address: &str) -> Result<Self::Link>;
}

/// Parse a `AA:BB:CC:DD:EE:FF` (or dash separated) address into its 48-bit value.
pub fn parse_address(address: &str) -> Result<u64> {
    let octets: Vec<&str> = address.split([':', '-']).collect();
    if octets.len() != 6 {
        return Err(Error::Transport(format!("invalid BLE address: {address}")));
    }

    octets.iter().try_fold(0u64, |acc, octet| {
        if octet.len() != 2 {
            return Err(Error::Transport(format!("invalid BLE address: {address}")));
        }
        let value = u8::from_str_radix(octet, 16)
            .map_err(|_| Error::Transport(format!("invalid BLE address: {address}")))?;
        Ok((acc << 8) | u64::from(value))
    })
}

/// Canonical upper-case, colon separated form of an address.
pub fn normalize_address(address: &str) -> String {
    address.trim().replace('-', ":").to_ascii_uppercase()
}
