//! WiFi station-mode adapter.
//!
//! The uplink only carries alerts and reminders; monitoring and cutoff
//! never depend on it.  Bring-up is therefore a bounded loop: try
//! `attempts` times with a fixed delay, then give up and run offline.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: `BlockingWifi<EspWifi>` STA driver.
//! - **all other targets**: scripted link for host-side tests.

use core::fmt;
use core::time::Duration;

use log::{info, warn};

use crate::config::SystemConfig;
use crate::error::{self, CommsError, Error};

// ───────────────────────────────────────────────────────────────
// Credentials
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialError {
    InvalidSsid,
    InvalidPassword,
}

impl fmt::Display for CredentialError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidSsid => write!(f, "SSID invalid (must be 1-32 printable ASCII bytes)"),
            Self::InvalidPassword => {
                write!(f, "password invalid (must be 8-64 bytes for WPA2, or empty for open)")
            }
        }
    }
}

fn is_printable_ascii(s: &str) -> bool {
    s.bytes().all(|b| (0x20..=0x7E).contains(&b))
}

fn validate_ssid(ssid: &str) -> Result<(), CredentialError> {
    if ssid.is_empty() || ssid.len() > 32 || !is_printable_ascii(ssid) {
        return Err(CredentialError::InvalidSsid);
    }
    Ok(())
}

fn validate_password(password: &str) -> Result<(), CredentialError> {
    if password.is_empty() {
        return Ok(());
    }
    if password.len() < 8 || password.len() > 64 {
        return Err(CredentialError::InvalidPassword);
    }
    Ok(())
}

/// Validated station credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WifiCredentials {
    ssid: heapless::String<32>,
    password: heapless::String<64>,
}

impl WifiCredentials {
    pub fn new(ssid: &str, password: &str) -> Result<Self, CredentialError> {
        validate_ssid(ssid)?;
        validate_password(password)?;
        let mut creds = Self {
            ssid: heapless::String::new(),
            password: heapless::String::new(),
        };
        creds
            .ssid
            .push_str(ssid)
            .map_err(|_| CredentialError::InvalidSsid)?;
        creds
            .password
            .push_str(password)
            .map_err(|_| CredentialError::InvalidPassword)?;
        Ok(creds)
    }

    pub fn ssid(&self) -> &str {
        &self.ssid
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    pub fn is_open(&self) -> bool {
        self.password.is_empty()
    }
}

// ───────────────────────────────────────────────────────────────
// Retry policy
// ───────────────────────────────────────────────────────────────

/// One connection attempt.  Implemented by the STA driver on target and
/// by a scripted link in tests.
pub trait WifiLink {
    fn try_connect(&mut self) -> Result<(), CommsError>;
    fn is_connected(&self) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &SystemConfig) -> Self {
        Self {
            attempts: config.wifi_connect_attempts,
            delay: Duration::from_millis(u64::from(config.wifi_retry_delay_ms)),
        }
    }
}

/// Try to bring the link up, sleeping `policy.delay` between attempts.
/// Returns the attempt that succeeded (1-based).
pub fn connect_with_retries(
    link: &mut impl WifiLink,
    policy: RetryPolicy,
    mut sleep: impl FnMut(Duration),
) -> error::Result<u32> {
    for attempt in 1..=policy.attempts {
        match link.try_connect() {
            Ok(()) if link.is_connected() => {
                info!("WiFi: connected on attempt {}/{}", attempt, policy.attempts);
                return Ok(attempt);
            }
            Ok(()) => warn!("WiFi: attempt {} returned without a link", attempt),
            Err(e) => warn!("WiFi: attempt {}/{} failed: {}", attempt, policy.attempts, e),
        }
        if attempt < policy.attempts {
            sleep(policy.delay);
        }
    }
    warn!(
        "WiFi: giving up after {} attempts, running offline",
        policy.attempts
    );
    Err(Error::Comms(CommsError::WifiConnectFailed))
}

// ───────────────────────────────────────────────────────────────
// ESP-IDF station
// ───────────────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
pub struct EspWifiLink {
    wifi: esp_idf_svc::wifi::BlockingWifi<esp_idf_svc::wifi::EspWifi<'static>>,
}

#[cfg(target_os = "espidf")]
impl EspWifiLink {
    /// Configure the STA interface and start the radio.  Does not connect.
    pub fn new(
        modem: esp_idf_hal::modem::Modem,
        sysloop: esp_idf_svc::eventloop::EspSystemEventLoop,
        nvs: Option<esp_idf_svc::nvs::EspDefaultNvsPartition>,
        creds: &WifiCredentials,
    ) -> error::Result<Self> {
        use esp_idf_svc::wifi::{
            AuthMethod, BlockingWifi, ClientConfiguration, Configuration, EspWifi,
        };

        let esp_wifi = EspWifi::new(modem, sysloop.clone(), nvs)
            .map_err(|_| Error::Init("wifi driver"))?;
        let mut wifi =
            BlockingWifi::wrap(esp_wifi, sysloop).map_err(|_| Error::Init("wifi event loop"))?;

        let auth_method = if creds.is_open() {
            AuthMethod::None
        } else {
            AuthMethod::WPA2Personal
        };
        let config = Configuration::Client(ClientConfiguration {
            ssid: creds
                .ssid()
                .try_into()
                .map_err(|_| Error::Init("wifi ssid"))?,
            password: creds
                .password()
                .try_into()
                .map_err(|_| Error::Init("wifi password"))?,
            auth_method,
            ..Default::default()
        });
        wifi.set_configuration(&config)
            .map_err(|_| Error::Init("wifi configuration"))?;
        wifi.start().map_err(|_| Error::Init("wifi start"))?;
        info!("WiFi: STA started for '{}'", creds.ssid());
        Ok(Self { wifi })
    }
}

#[cfg(target_os = "espidf")]
impl WifiLink for EspWifiLink {
    fn try_connect(&mut self) -> Result<(), CommsError> {
        self.wifi
            .connect()
            .map_err(|_| CommsError::WifiConnectFailed)?;
        self.wifi
            .wait_netif_up()
            .map_err(|_| CommsError::WifiConnectFailed)
    }

    fn is_connected(&self) -> bool {
        self.wifi.is_connected().unwrap_or(false)
    }
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────
