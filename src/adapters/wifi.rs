//! WiFi station-mode adapter.
//!
//! The garden device only needs the network for a few seconds per wake: one
//! status report, then back to deep sleep.  So instead of a resident
//! reconnect loop, the adapter makes a bounded number of connection
//! attempts (5 attempts, 2 s apart) and gives up — a missed report costs
//! nothing, a device kept awake retrying costs battery.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: ESP-IDF WiFi driver calls.
//! - **all other targets**: simulation stubs for host-side tests.

use core::fmt;
use log::{info, warn};

// ───────────────────────────────────────────────────────────────
// Errors
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityError {
    NoCredentials,
    InvalidSsid,
    InvalidPassword,
    ConnectionFailed,
}

impl fmt::Display for ConnectivityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoCredentials => write!(f, "no WiFi credentials configured"),
            Self::InvalidSsid => write!(f, "SSID invalid (must be 1-32 printable ASCII bytes)"),
            Self::InvalidPassword => {
                write!(f, "password invalid (must be 8-64 bytes for WPA2, or empty for open)")
            }
            Self::ConnectionFailed => write!(f, "WiFi connection failed"),
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Connection state
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WifiState {
    Disconnected,
    Connected,
}

/// Bounded connect policy: the device must reach deep sleep promptly even
/// with the access point down.
const MAX_ATTEMPTS: u32 = 5;
const ATTEMPT_PAUSE_SECS: u32 = 2;

// ───────────────────────────────────────────────────────────────
// Validation
// ───────────────────────────────────────────────────────────────

fn is_printable_ascii(s: &str) -> bool {
    s.bytes().all(|b| (0x20..=0x7E).contains(&b))
}

fn validate_ssid(ssid: &str) -> Result<(), ConnectivityError> {
    if ssid.is_empty() || ssid.len() > 32 {
        return Err(ConnectivityError::InvalidSsid);
    }
    if !is_printable_ascii(ssid) {
        return Err(ConnectivityError::InvalidSsid);
    }
    Ok(())
}

fn validate_password(password: &str) -> Result<(), ConnectivityError> {
    if password.is_empty() {
        return Ok(());
    }
    if password.len() < 8 || password.len() > 64 {
        return Err(ConnectivityError::InvalidPassword);
    }
    Ok(())
}

// ───────────────────────────────────────────────────────────────
// WiFi adapter
// ───────────────────────────────────────────────────────────────

pub struct WifiAdapter {
    state: WifiState,
    ssid: heapless::String<32>,
    password: heapless::String<64>,
}

impl Default for WifiAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl WifiAdapter {
    pub fn new() -> Self {
        Self {
            state: WifiState::Disconnected,
            ssid: heapless::String::new(),
            password: heapless::String::new(),
        }
    }

    pub fn set_credentials(&mut self, ssid: &str, password: &str) -> Result<(), ConnectivityError> {
        validate_ssid(ssid)?;
        validate_password(password)?;
        self.ssid.clear();
        self.ssid
            .push_str(ssid)
            .map_err(|()| ConnectivityError::InvalidSsid)?;
        self.password.clear();
        self.password
            .push_str(password)
            .map_err(|()| ConnectivityError::InvalidPassword)?;
        Ok(())
    }

    /// Connect with up to [`MAX_ATTEMPTS`] tries, pausing between attempts.
    pub fn connect(&mut self) -> Result<(), ConnectivityError> {
        if self.ssid.is_empty() {
            return Err(ConnectivityError::NoCredentials);
        }
        if self.state == WifiState::Connected {
            return Ok(());
        }

        for attempt in 1..=MAX_ATTEMPTS {
            info!("WiFi: connecting to '{}' (attempt {attempt}/{MAX_ATTEMPTS})", self.ssid);
            if self.platform_connect().is_ok() {
                self.state = WifiState::Connected;
                info!("WiFi: connected");
                return Ok(());
            }
            if attempt < MAX_ATTEMPTS {
                pause_secs(ATTEMPT_PAUSE_SECS);
            }
        }
        warn!("WiFi: giving up after {MAX_ATTEMPTS} attempts");
        Err(ConnectivityError::ConnectionFailed)
    }

    pub fn disconnect(&mut self) {
        if self.state == WifiState::Connected {
            self.platform_disconnect();
            self.state = WifiState::Disconnected;
            info!("WiFi: disconnected");
        }
    }

    pub fn is_connected(&self) -> bool {
        self.state == WifiState::Connected
    }

    // ── Platform-specific ─────────────────────────────────────

    #[cfg(target_os = "espidf")]
    fn platform_connect(&mut self) -> Result<(), ConnectivityError> {
        // ESP-IDF WiFi STA connection.
        //
        // The full wiring requires the modem peripheral from
        // `Peripherals::take()` in main:
        // 1. EspWifi::new(modem, sysloop, None)
        // 2. wifi.set_configuration(&Configuration::Client(ClientConfiguration {
        //        ssid: self.ssid.as_str().try_into().unwrap(),
        //        password: self.password.as_str().try_into().unwrap(),
        //        auth_method: AuthMethod::WPA2Personal,
        //        ..Default::default()
        //    }))
        // 3. wifi.start() / wifi.connect() / wait for the IP event
        info!("WiFi(espidf): STA connect deferred until peripheral wiring");
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_connect(&mut self) -> Result<(), ConnectivityError> {
        info!("WiFi(sim): connected to '{}'", self.ssid);
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn platform_disconnect(&mut self) {
        // wifi.disconnect().ok(); wifi.stop().ok();
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_disconnect(&mut self) {
        info!("WiFi(sim): disconnected");
    }
}

#[cfg(target_os = "espidf")]
fn pause_secs(secs: u32) {
    esp_idf_hal::delay::FreeRtos::delay_ms(secs * 1000);
}

#[cfg(not(target_os = "espidf"))]
fn pause_secs(secs: u32) {
    std::thread::sleep(std::time::Duration::from_secs(u64::from(secs)));
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────
