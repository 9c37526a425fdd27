//! WinRT BLE backend
//!
//! [`BleConnector`] implementation on top of the Windows Bluetooth LE APIs.
//! The device is opened by address; the Govee service and its control
//! characteristic are looked up by their fixed UUIDs only.

use async_trait::async_trait;
use tracing::{debug, info};
use windows::core::GUID;
use windows::Devices::Bluetooth::GenericAttributeProfile::{
    GattCharacteristic, GattCommunicationStatus, GattWriteOption,
};
use windows::Devices::Bluetooth::{BluetoothConnectionStatus, BluetoothLEDevice};
use windows::Storage::Streams::DataWriter;

use crate::error::{Error, Result};
use crate::infrastructure::bluetooth::protocol::{CONTROL_CHAR_UUID, SERVICE_UUID};
use crate::infrastructure::bluetooth::transport::{parse_address, BleConnector, GattLink};

/// Parse a UUID string into a Windows GUID
pub fn parse_uuid(uuid_str: &str) -> Result<GUID> {
    let hex = uuid_str.replace('-', "");
    let invalid = || Error::Transport(format!("invalid UUID: {uuid_str}"));

    if hex.len() != 32 || !hex.is_ascii() {
        return Err(invalid());
    }

    let d1 = u32::from_str_radix(&hex[0..8], 16).map_err(|_| invalid())?;
    let d2 = u16::from_str_radix(&hex[8..12], 16).map_err(|_| invalid())?;
    let d3 = u16::from_str_radix(&hex[12..16], 16).map_err(|_| invalid())?;

    let mut d4 = [0u8; 8];
    for (i, byte) in d4.iter_mut().enumerate() {
        *byte = u8::from_str_radix(&hex[16 + i * 2..18 + i * 2], 16).map_err(|_| invalid())?;
    }

    Ok(GUID::from_values(d1, d2, d3, d4))
}

/// Opens Govee lights through WinRT.
#[derive(Debug, Clone, Default)]
pub struct WinRtConnector;

impl WinRtConnector {
    pub fn new() -> Self {
        Self
    }

    async fn control_characteristic(device: &BluetoothLEDevice) -> Result<GattCharacteristic> {
        let services = device
            .GetGattServicesForUuidAsync(parse_uuid(SERVICE_UUID)?)?
            .await?;
        if services.Status()? != GattCommunicationStatus::Success {
            return Err(Error::Transport(format!(
                "GATT service lookup returned {:?}",
                services.Status()?
            )));
        }
        let services = services.Services()?;
        if services.Size()? == 0 {
            return Err(Error::Transport("Govee control service not found".into()));
        }
        let service = services.GetAt(0)?;

        let characteristics = service
            .GetCharacteristicsForUuidAsync(parse_uuid(CONTROL_CHAR_UUID)?)?
            .await?;
        if characteristics.Status()? != GattCommunicationStatus::Success {
            return Err(Error::Transport(format!(
                "characteristic lookup returned {:?}",
                characteristics.Status()?
            )));
        }
        let characteristics = characteristics.Characteristics()?;
        if characteristics.Size()? == 0 {
            return Err(Error::Transport("control characteristic not found".into()));
        }
        Ok(characteristics.GetAt(0)?)
    }
}

#[async_trait]
impl BleConnector for WinRtConnector {
    type Link = WinRtLink;

    async fn connect(&self, address: &str) -> Result<WinRtLink> {
        let raw = parse_address(address)?;
        debug!("Opening BLE device {} ({:#X})", address, raw);

        let device = BluetoothLEDevice::FromBluetoothAddressAsync(raw)?.await?;
        let control = Self::control_characteristic(&device).await?;
        info!("Resolved control characteristic on {}", address);

        Ok(WinRtLink { device, control })
    }
}

/// Open WinRT connection holding the resolved control characteristic.
pub struct WinRtLink {
    device: BluetoothLEDevice,
    control: GattCharacteristic,
}

#[async_trait]
impl GattLink for WinRtLink {
    async fn write(
        &mut self,
        characteristic: &str,
        data: &[u8],
        with_response: bool,
    ) -> Result<()> {
        if !characteristic.eq_ignore_ascii_case(CONTROL_CHAR_UUID) {
            return Err(Error::Transport(format!(
                "characteristic {characteristic} is not resolved on this link"
            )));
        }

        let writer = DataWriter::new()?;
        writer.WriteBytes(data)?;
        let buffer = writer.DetachBuffer()?;

        let option = if with_response {
            GattWriteOption::WriteWithResponse
        } else {
            GattWriteOption::WriteWithoutResponse
        };
        let status = self.control.WriteValueWithOptionAsync(&buffer, option)?.await?;

        if status != GattCommunicationStatus::Success {
            return Err(Error::Transport(format!("GATT write returned {:?}", status)));
        }
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<()> {
        self.device.Close()?;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.device
            .ConnectionStatus()
            .map(|s| s == BluetoothConnectionStatus::Connected)
            .unwrap_or(false)
    }
}
