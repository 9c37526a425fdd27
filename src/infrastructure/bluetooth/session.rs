//! Transport Session
//!
//! One [`Session`] per physical light. It owns the link, acquires it with a
//! bounded number of attempts, and writes frame sequences to the control
//! characteristic strictly in order, awaiting each write before the next.
//!
//! ```text
//! Disconnected ──> Connecting ──> Connected ──> Writing ──> Connected
//!      ^               │                           │
//!      └───────────────┴───────── failure ─────────┘
//! ```
//!
//! Every command is validated and encoded before the radio is touched, so
//! bad input never produces a partial write.

use std::future::Future;
use std::time::Duration;

use tracing::{debug, error, info, trace, warn};

use crate::domain::color;
use crate::domain::models::{ColorMode, LightState, SessionPhase, TurnOn};
use crate::domain::profile::DeviceProfile;
use crate::domain::settings::Settings;
use crate::error::{Error, Result};
use crate::infrastructure::bluetooth::protocol::{self, Frame, LedCommand, CONTROL_CHAR_UUID};
use crate::infrastructure::bluetooth::transport::{normalize_address, BleConnector, GattLink};

/// Connection and write policy for a session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Connect attempts before giving up with `ConnectionUnavailable`.
    pub connect_attempts: u32,
    /// Deadline for a single connect attempt.
    pub connect_timeout: Option<Duration>,
    /// Deadline for a single frame write.
    pub write_timeout: Option<Duration>,
    /// Request GATT write-with-response instead of write-without-response.
    pub write_with_response: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            connect_attempts: 3,
            connect_timeout: None,
            write_timeout: None,
            write_with_response: false,
        }
    }
}

impl From<&Settings> for SessionConfig {
    fn from(settings: &Settings) -> Self {
        Self {
            connect_attempts: settings.connect_attempts,
            connect_timeout: settings.connect_timeout_ms.map(Duration::from_millis),
            write_timeout: settings.write_timeout_ms.map(Duration::from_millis),
            write_with_response: settings.write_with_response,
        }
    }
}

/// An encoded command waiting to be written.
struct Planned {
    command: LedCommand,
    frames: Vec<Frame>,
}

impl Planned {
    fn new(command: LedCommand, payload: &[u8]) -> Result<Self> {
        Ok(Self {
            command,
            frames: protocol::encode(command, payload)?,
        })
    }
}

/// Driver for a single light.
pub struct Session<C: BleConnector> {
    address: String,
    profile: DeviceProfile,
    connector: C,
    config: SessionConfig,
    link: Option<C::Link>,
    phase: SessionPhase,
    state: LightState,
}

impl<C: BleConnector> Session<C> {
    pub fn new(address: &str, model: &str, connector: C, config: SessionConfig) -> Self {
        let profile = DeviceProfile::for_model(model);
        if !profile.is_known() {
            warn!(
                "Unknown model {}, using on/off + RGB profile for {}",
                model, address
            );
        }

        Self {
            address: normalize_address(address),
            profile,
            connector,
            config,
            link: None,
            phase: SessionPhase::Disconnected,
            state: LightState::default(),
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    /// Address without separators, suitable as a stable host identifier.
    pub fn unique_id(&self) -> String {
        self.address.replace(':', "")
    }

    pub fn profile(&self) -> &DeviceProfile {
        &self.profile
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Last commanded state. Never read back from the device.
    pub fn state(&self) -> &LightState {
        &self.state
    }

    pub fn is_connected(&self) -> bool {
        self.link.as_ref().is_some_and(|link| link.is_connected())
    }

    /// Return the live link, connecting first if needed.
    pub async fn ensure_connected(&mut self) -> Result<&mut C::Link> {
        let link = self.take_connected_link().await?;
        Ok(self.link.insert(link))
    }

    /// Take the link out of the session, reusing it when still up.
    async fn take_connected_link(&mut self) -> Result<C::Link> {
        match self.link.take() {
            Some(link) if link.is_connected() => Ok(link),
            Some(_) => {
                debug!("Link to {} dropped, reconnecting", self.address);
                self.connect_with_retry().await
            }
            None => self.connect_with_retry().await,
        }
    }

    async fn connect_with_retry(&mut self) -> Result<C::Link> {
        let phase = PhaseReset::enter(&mut self.phase, SessionPhase::Connecting);
        let attempts = self.config.connect_attempts.max(1);

        for attempt in 1..=attempts {
            let result = bounded(
                self.config.connect_timeout,
                self.connector.connect(&self.address),
            )
            .await;

            match result {
                Ok(link) => {
                    info!(
                        "Connected to {} (attempt {}/{})",
                        self.address, attempt, attempts
                    );
                    phase.settle(SessionPhase::Connected);
                    return Ok(link);
                }
                Err(e) => warn!(
                    "Connection attempt {}/{} to {} failed: {}",
                    attempt, attempts, self.address, e
                ),
            }
        }

        error!(
            "Could not connect to {} after {} attempts",
            self.address, attempts
        );
        Err(Error::ConnectionUnavailable { attempts })
    }

    /// Encode one command and write its frames in order.
    pub async fn send_command(&mut self, command: LedCommand, payload: &[u8]) -> Result<()> {
        let planned = Planned::new(command, payload)?;
        self.transmit(&planned).await
    }

    async fn transmit(&mut self, planned: &Planned) -> Result<()> {
        let mut link = self.take_connected_link().await?;
        let phase = PhaseReset::enter(&mut self.phase, SessionPhase::Writing);

        let total = planned.frames.len();
        for (index, frame) in planned.frames.iter().enumerate() {
            trace!(
                "{:?} frame {}/{} -> {}: {:02X?}",
                planned.command,
                index + 1,
                total,
                self.address,
                frame
            );

            let write = link.write(CONTROL_CHAR_UUID, frame, self.config.write_with_response);
            if let Err(e) = bounded(self.config.write_timeout, write).await {
                warn!(
                    "Write of {:?} frame {} to {} failed: {}",
                    planned.command, index, self.address, e
                );
                if let Err(close_err) = link.disconnect().await {
                    debug!("Closing failed link to {}: {}", self.address, close_err);
                }
                return Err(Error::TransmissionFailed {
                    frame_index: index,
                    reason: e.to_string(),
                });
            }
        }

        self.link = Some(link);
        phase.settle(SessionPhase::Connected);
        Ok(())
    }

    /// Turn the light on, optionally setting brightness and color.
    ///
    /// All commands are built before the first write. The recorded state
    /// changes only once every write was dispatched.
    pub async fn turn_on(&mut self, request: TurnOn) -> Result<()> {
        let plan = self.plan_turn_on(&request)?;
        for planned in &plan {
            self.transmit(planned).await?;
        }

        self.state.is_on = Some(true);
        if let Some(brightness) = request.brightness {
            self.state.brightness = Some(brightness.to_percent());
            if self.state.color_mode.is_none() {
                self.state.color_mode = Some(ColorMode::Brightness);
            }
        }
        if let Some(rgb) = request.rgb {
            self.state.rgb = Some(rgb);
            self.state.color_mode = Some(ColorMode::Rgb);
        } else if let Some(kelvin) = request.color_temp_kelvin {
            let kelvin = self.clamp_kelvin(kelvin);
            self.state.color_temp_kelvin = Some(kelvin);
            self.state.color_mode = Some(ColorMode::ColorTemp);
        }
        Ok(())
    }

    pub async fn turn_off(&mut self) -> Result<()> {
        let planned = Planned::new(LedCommand::Power, &protocol::power_payload(false))?;
        self.transmit(&planned).await?;
        self.state.is_on = Some(false);
        Ok(())
    }

    /// Close the link if one is open.
    pub async fn disconnect(&mut self) -> Result<()> {
        self.phase = SessionPhase::Disconnected;
        if let Some(mut link) = self.link.take() {
            link.disconnect().await?;
            info!("Disconnected from {}", self.address);
        }
        Ok(())
    }

    fn plan_turn_on(&self, request: &TurnOn) -> Result<Vec<Planned>> {
        let caps = self.profile.capabilities();
        let mut plan = Vec::new();

        if !request.has_attributes() || self.state.is_on == Some(false) {
            plan.push(Planned::new(LedCommand::Power, &protocol::power_payload(true))?);
        }

        if let Some(brightness) = request.brightness {
            if !caps.brightness {
                return Err(self.unsupported("brightness"));
            }
            let payload = protocol::brightness_payload(brightness.to_percent())?;
            plan.push(Planned::new(LedCommand::Brightness, &payload)?);
        }

        if let Some(rgb) = request.rgb {
            let payload = protocol::color_payload(caps.color_encoding, rgb);
            plan.push(Planned::new(LedCommand::Color, &payload)?);
        } else if let Some(kelvin) = request.color_temp_kelvin {
            if caps.color_temp.is_none() {
                return Err(self.unsupported("color temperature"));
            }
            let kelvin = self.clamp_kelvin(kelvin);
            let payload = protocol::color_temp_payload(kelvin, color::kelvin_to_rgb(kelvin));
            plan.push(Planned::new(LedCommand::Color, &payload)?);
        }

        Ok(plan)
    }

    fn clamp_kelvin(&self, kelvin: u16) -> u16 {
        match self.profile.capabilities().color_temp {
            Some(range) => range.clamp(kelvin),
            None => kelvin,
        }
    }

    fn unsupported(&self, feature: &'static str) -> Error {
        Error::Unsupported {
            model: self.profile.model().to_string(),
            feature,
        }
    }
}

/// Holds the session phase during a transition.
///
/// Falls back to `Disconnected` when dropped unsettled, which covers both
/// error returns and a caller dropping the future mid-await.
struct PhaseReset<'a> {
    phase: &'a mut SessionPhase,
    settled: bool,
}

impl<'a> PhaseReset<'a> {
    fn enter(phase: &'a mut SessionPhase, during: SessionPhase) -> Self {
        *phase = during;
        Self {
            phase,
            settled: false,
        }
    }

    fn settle(mut self, to: SessionPhase) {
        *self.phase = to;
        self.settled = true;
    }
}

impl Drop for PhaseReset<'_> {
    fn drop(&mut self) {
        if !self.settled {
            *self.phase = SessionPhase::Disconnected;
        }
    }
}

/// Await `fut`, failing with [`Error::Timeout`] once `limit` elapses.
async fn bounded<T>(limit: Option<Duration>, fut: impl Future<Output = Result<T>>) -> Result<T> {
    match limit {
        Some(limit) => tokio::time::timeout(limit, fut).await.unwrap_or(Err(Error::Timeout)),
        None => fut.await,
    }
}
