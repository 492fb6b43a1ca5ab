//! WinRT Pairing Cache
//!
//! Windows keeps BLE pairings (and an open GATT session) even after the
//! peripheral is gone. Enumerates paired LE devices, closes live sessions and
//! unpairs through `Windows.Devices.Enumeration`.

use crate::domain::errors::SweepError;
use crate::domain::platform::PairingRecord;
use crate::infrastructure::bluetooth::PairingCache;
use async_trait::async_trait;
use tracing::{debug, info};
use windows::core::HSTRING;
use windows::Devices::Bluetooth::{BluetoothConnectionStatus, BluetoothLEDevice};
use windows::Devices::Enumeration::{DeviceInformation, DeviceUnpairingResultStatus};

impl From<windows::core::Error> for SweepError {
    fn from(e: windows::core::Error) -> Self {
        SweepError::Platform(e.message().to_string())
    }
}

#[derive(Debug, Default)]
pub struct WinRtPairingCache;

impl WinRtPairingCache {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl PairingCache for WinRtPairingCache {
    async fn list(&self) -> Result<Vec<PairingRecord>, SweepError> {
        let selector = BluetoothLEDevice::GetDeviceSelectorFromPairingState(true)?;
        let devices = DeviceInformation::FindAllAsyncAqsFilter(&selector)?.await?;

        let mut records = Vec::new();
        for i in 0..devices.Size()? {
            let info = devices.GetAt(i)?;
            records.push(PairingRecord {
                id: info.Id()?.to_string(),
                name: info.Name()?.to_string(),
            });
        }
        debug!("Found {} paired LE device(s)", records.len());
        Ok(records)
    }

    async fn disconnect_if_live(&self, record: &PairingRecord) -> Result<bool, SweepError> {
        let id = HSTRING::from(record.id.as_str());
        let device = BluetoothLEDevice::FromIdAsync(&id)?.await?;

        if device.ConnectionStatus()? != BluetoothConnectionStatus::Connected {
            return Ok(false);
        }

        device.Close()?;
        info!("Closed live session for {}", record.name);
        Ok(true)
    }

    async fn unpair(&self, record: &PairingRecord) -> Result<(), SweepError> {
        let id = HSTRING::from(record.id.as_str());
        let info = DeviceInformation::CreateFromIdAsync(&id)?.await?;
        let result = info.Pairing()?.UnpairAsync()?.await?;

        match result.Status()? {
            DeviceUnpairingResultStatus::Unpaired | DeviceUnpairingResultStatus::AlreadyUnpaired => {
                info!("Unpaired {}", record.name);
                Ok(())
            }
            status => Err(SweepError::platform(format!(
                "Unpairing {} returned {:?}",
                record.name, status
            ))),
        }
    }
}
