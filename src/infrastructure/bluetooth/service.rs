//! Light Service Module
//!
//! Shares sessions between tasks. Each [`Light`] wraps its session in an
//! async mutex, so at most one operation per physical light is in flight
//! and frame sequences from different callers never interleave. Lights
//! for different devices are independent.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::domain::models::{LightState, TurnOn};
use crate::domain::profile::DeviceProfile;
use crate::domain::settings::Settings;
use crate::error::{Error, Result};
use crate::infrastructure::bluetooth::protocol::LedCommand;
use crate::infrastructure::bluetooth::session::{Session, SessionConfig};
use crate::infrastructure::bluetooth::transport::{normalize_address, BleConnector};

/// Cloneable handle to one light.
pub struct Light<C: BleConnector> {
    session: Arc<Mutex<Session<C>>>,
}

impl<C: BleConnector> Clone for Light<C> {
    fn clone(&self) -> Self {
        Self {
            session: Arc::clone(&self.session),
        }
    }
}

impl<C: BleConnector> Light<C> {
    pub fn new(session: Session<C>) -> Self {
        Self {
            session: Arc::new(Mutex::new(session)),
        }
    }

    pub async fn turn_on(&self, request: TurnOn) -> Result<()> {
        self.session.lock().await.turn_on(request).await
    }

    pub async fn turn_off(&self) -> Result<()> {
        self.session.lock().await.turn_off().await
    }

    pub async fn send_command(&self, command: LedCommand, payload: &[u8]) -> Result<()> {
        self.session.lock().await.send_command(command, payload).await
    }

    pub async fn disconnect(&self) -> Result<()> {
        self.session.lock().await.disconnect().await
    }

    /// Snapshot of the last commanded state.
    pub async fn state(&self) -> LightState {
        self.session.lock().await.state().clone()
    }

    pub async fn profile(&self) -> DeviceProfile {
        self.session.lock().await.profile().clone()
    }
}

/// Registry of lights keyed by normalized address.
pub struct LightService<C: BleConnector + Clone> {
    connector: C,
    config: SessionConfig,
    lights: HashMap<String, Light<C>>,
}

impl<C: BleConnector + Clone> LightService<C> {
    pub fn new(connector: C, config: SessionConfig) -> Self {
        Self {
            connector,
            config,
            lights: HashMap::new(),
        }
    }

    /// Build a service with one light per configured device.
    pub fn from_settings(settings: &Settings, connector: C) -> Self {
        let mut service = Self::new(connector, SessionConfig::from(settings));
        for device in &settings.devices {
            service.add(&device.address, &device.model);
        }
        info!(
            "Light service ready with {} device(s)",
            service.lights.len()
        );
        service
    }

    /// Register a light, replacing any existing light at the same address.
    pub fn add(&mut self, address: &str, model: &str) -> Light<C> {
        let session = Session::new(address, model, self.connector.clone(), self.config.clone());
        let light = Light::new(session);
        self.lights.insert(normalize_address(address), light.clone());
        light
    }

    pub fn light(&self, address: &str) -> Option<Light<C>> {
        self.lights.get(&normalize_address(address)).cloned()
    }

    pub fn addresses(&self) -> impl Iterator<Item = &str> {
        self.lights.keys().map(String::as_str)
    }

    /// Turn every light off, collecting the failures.
    pub async fn turn_off_all(&self) -> Vec<(String, Error)> {
        let mut failures = Vec::new();
        for (address, light) in &self.lights {
            if let Err(e) = light.turn_off().await {
                warn!("Failed to turn off {}: {}", address, e);
                failures.push((address.clone(), e));
            }
        }
        failures
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{Brightness, Rgb};
    use crate::domain::settings::DeviceEntry;
    use crate::infrastructure::bluetooth::mock::{MockConnector, MockEvent};
    use std::time::Duration;

    fn settings_with(devices: &[(&str, &str)]) -> Settings {
        Settings {
            devices: devices
                .iter()
                .map(|(address, model)| DeviceEntry {
                    address: address.to_string(),
                    model: model.to_string(),
                    name: None,
                })
                .collect(),
            ..Settings::default()
        }
    }

    #[tokio::test]
    async fn lookup_is_address_insensitive() {
        let settings = settings_with(&[("a4:c1:38:00:00:01", "H6008")]);
        let service = LightService::from_settings(&settings, MockConnector::new());

        let light = service.light("A4-C1-38-00-00-01").expect("light registered");
        assert_eq!(light.profile().await.model(), "H6008");
        assert!(service.light("A4:C1:38:00:00:02").is_none());
        assert_eq!(
            service.addresses().collect::<Vec<_>>(),
            vec!["A4:C1:38:00:00:01"]
        );
    }

    #[tokio::test]
    async fn concurrent_callers_do_not_interleave() {
        let mock = MockConnector::new();
        mock.delay_write(0, Duration::from_millis(30));
        let mut service = LightService::new(mock.clone(), SessionConfig::default());
        let light = service.add("A4:C1:38:00:00:01", "H6008");

        let a = {
            let light = light.clone();
            tokio::spawn(async move {
                light
                    .turn_on(
                        TurnOn::default()
                            .brightness(Brightness::Percent(20))
                            .rgb(Rgb::new(1, 2, 3)),
                    )
                    .await
            })
        };
        let b = {
            let light = light.clone();
            tokio::spawn(async move {
                light.turn_on(TurnOn::default().rgb(Rgb::new(4, 5, 6))).await
            })
        };
        a.await.unwrap().unwrap();
        b.await.unwrap().unwrap();

        let writes: Vec<MockEvent> = mock
            .events()
            .into_iter()
            .filter(|e| matches!(e, MockEvent::WriteStarted(_) | MockEvent::WriteFinished(_)))
            .collect();
        for pair in writes.chunks(2) {
            match pair {
                [MockEvent::WriteStarted(s), MockEvent::WriteFinished(f)] => assert_eq!(s, f),
                other => panic!("interleaved writes: {other:?}"),
            }
        }
        assert_eq!(mock.written().len(), 3);
        assert_eq!(mock.connect_calls(), 1);
    }

    #[tokio::test]
    async fn turn_off_all_reports_failures() {
        let mock = MockConnector::new();
        mock.fail_connects(3);
        let settings = settings_with(&[
            ("A4:C1:38:00:00:01", "H6008"),
            ("A4:C1:38:00:00:02", "H6053"),
        ]);
        let service = LightService::from_settings(&settings, mock.clone());

        let failures = service.turn_off_all().await;
        assert_eq!(failures.len(), 1);
        assert!(matches!(failures[0].1, Error::ConnectionUnavailable { attempts: 3 }));
        assert_eq!(mock.written().len(), 1);
    }

    #[tokio::test]
    async fn state_reflects_last_command() {
        let mock = MockConnector::new();
        let mut service = LightService::new(mock, SessionConfig::default());
        let light = service.add("A4:C1:38:00:00:01", "H6053");

        light.turn_on(TurnOn::default()).await.unwrap();
        assert_eq!(light.state().await.is_on, Some(true));
        light.turn_off().await.unwrap();
        assert_eq!(light.state().await.is_on, Some(false));
        light.disconnect().await.unwrap();
    }
}
