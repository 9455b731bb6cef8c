//! WiFi station link for the node.
//!
//! [`WifiAdapter`] is the [`ConnectivityPort`] the service consults before
//! every backend call.  Credentials live in the `wifi` namespace (written by
//! provisioning, wiped by factory reset).  On device the adapter drives
//! `esp_idf_svc::wifi::EspWifi`; on the host a simulated access point stands
//! in so link loss can be scripted.
//!
//! ```text
//!   Idle ──connect──▶ Associating ──up──▶ Up
//!                        │  ▲              │ lost
//!                  fail  ▼  │ retry due    ▼
//!                     Waiting { retry_at } ◀┘
//! ```
//!
//! Retry delays double from 2 s up to 60 s and reset once the link is up.
//! `poll()` never blocks.

use core::fmt;
use log::{info, warn};

use crate::app::ports::{ConnectivityPort, PersistencePort, ns};
use crate::error::StorageError;

#[cfg(target_os = "espidf")]
use esp_idf_svc::wifi::{AuthMethod, ClientConfiguration, Configuration, EspWifi};

pub const SSID_KEY: &str = "ssid";
pub const PASSWORD_KEY: &str = "pass";

const FIRST_RETRY_MS: u64 = 2_000;
const MAX_RETRY_MS: u64 = 60_000;
/// Association that has not completed by then counts as a failure.
const ASSOCIATE_TIMEOUT_MS: u64 = 15_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WifiError {
    /// Nothing stored in the `wifi` namespace.
    Unprovisioned,
    BadSsid,
    BadPassword,
    /// Driver missing or the association request was refused.
    Association,
    Storage(StorageError),
}

impl fmt::Display for WifiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unprovisioned => write!(f, "not provisioned"),
            Self::BadSsid => write!(f, "SSID must be 1-32 printable ASCII bytes"),
            Self::BadPassword => write!(f, "password must be empty or 8-64 bytes"),
            Self::Association => write!(f, "association failed"),
            Self::Storage(e) => write!(f, "storage: {e}"),
        }
    }
}

impl From<StorageError> for WifiError {
    fn from(e: StorageError) -> Self {
        Self::Storage(e)
    }
}

// ───────────────────────────────────────────────────────────────
// Credentials
// ───────────────────────────────────────────────────────────────

/// A validated SSID / password pair.  An empty password means an open AP.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WifiCredentials {
    ssid: heapless::String<32>,
    password: heapless::String<64>,
}

impl WifiCredentials {
    pub fn new(ssid: &str, password: &str) -> Result<Self, WifiError> {
        if !ssid.bytes().all(|b| b.is_ascii_graphic() || b == b' ') {
            return Err(WifiError::BadSsid);
        }
        let ssid = heapless::String::try_from(ssid)
            .ok()
            .filter(|s: &heapless::String<32>| !s.is_empty())
            .ok_or(WifiError::BadSsid)?;
        if !password.is_empty() && password.len() < 8 {
            return Err(WifiError::BadPassword);
        }
        let password = heapless::String::try_from(password).map_err(|_| WifiError::BadPassword)?;
        Ok(Self { ssid, password })
    }

    pub fn load(store: &impl PersistencePort) -> Result<Self, WifiError> {
        let ssid = store
            .get_str(ns::WIFI, SSID_KEY)
            .filter(|s| !s.is_empty())
            .ok_or(WifiError::Unprovisioned)?;
        Self::new(&ssid, &store.str_or(ns::WIFI, PASSWORD_KEY, ""))
    }

    pub fn save(&self, store: &mut impl PersistencePort) -> Result<(), WifiError> {
        store.put_str(ns::WIFI, SSID_KEY, &self.ssid)?;
        store.put_str(ns::WIFI, PASSWORD_KEY, &self.password)?;
        Ok(())
    }

    pub fn ssid(&self) -> &str {
        &self.ssid
    }

    pub fn is_open(&self) -> bool {
        self.password.is_empty()
    }
}

// ───────────────────────────────────────────────────────────────
// Link state
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Idle,
    Associating { since_ms: u64, failures: u32 },
    Up,
    Waiting { retry_at_ms: u64, failures: u32 },
}

/// Doubling retry delay.
#[derive(Debug, Clone, Copy)]
struct Backoff {
    next_ms: u64,
}

impl Backoff {
    const fn new() -> Self {
        Self {
            next_ms: FIRST_RETRY_MS,
        }
    }

    /// Delay to wait now; the one after it is twice as long.
    fn take(&mut self) -> u64 {
        let delay = self.next_ms;
        self.next_ms = (self.next_ms * 2).min(MAX_RETRY_MS);
        delay
    }
}

pub struct WifiAdapter {
    credentials: Option<WifiCredentials>,
    state: LinkState,
    backoff: Backoff,
    rssi: Option<i8>,
    #[cfg(target_os = "espidf")]
    driver: Option<EspWifi<'static>>,
    #[cfg(not(target_os = "espidf"))]
    sim_ap_up: bool,
}

impl WifiAdapter {
    pub fn new() -> Self {
        Self {
            credentials: None,
            state: LinkState::Idle,
            backoff: Backoff::new(),
            rssi: None,
            #[cfg(target_os = "espidf")]
            driver: None,
            #[cfg(not(target_os = "espidf"))]
            sim_ap_up: true,
        }
    }

    pub fn state(&self) -> LinkState {
        self.state
    }

    pub fn credentials(&self) -> Option<&WifiCredentials> {
        self.credentials.as_ref()
    }

    /// Pick up the provisioned network from the store.
    pub fn load_credentials(&mut self, store: &impl PersistencePort) -> Result<(), WifiError> {
        let creds = WifiCredentials::load(store)?;
        info!("WiFi: provisioned for '{}'", creds.ssid());
        self.credentials = Some(creds);
        Ok(())
    }

    /// Start associating.  A refused request schedules a retry instead of
    /// failing permanently.
    pub fn connect(&mut self, now_ms: u64) -> Result<(), WifiError> {
        let Some(creds) = self.credentials.clone() else {
            return Err(WifiError::Unprovisioned);
        };
        if self.state == LinkState::Up {
            return Ok(());
        }
        info!("WiFi: joining '{}'", creds.ssid());
        self.try_associate(&creds, 0, now_ms)
    }

    /// Advance the link state.  Call once per loop iteration.
    pub fn poll(&mut self, now_ms: u64) {
        match self.state {
            LinkState::Idle => {}
            LinkState::Associating { since_ms, failures } => {
                if self.platform_is_connected() {
                    self.backoff = Backoff::new();
                    self.rssi = self.platform_rssi();
                    self.state = LinkState::Up;
                    info!("WiFi: up (RSSI {:?})", self.rssi);
                } else if now_ms.saturating_sub(since_ms) >= ASSOCIATE_TIMEOUT_MS {
                    warn!("WiFi: association timed out");
                    self.wait(failures + 1, now_ms);
                }
            }
            LinkState::Up => {
                if self.platform_is_connected() {
                    self.rssi = self.platform_rssi();
                } else {
                    warn!("WiFi: link lost");
                    self.rssi = None;
                    self.backoff = Backoff::new();
                    self.wait(0, now_ms);
                }
            }
            LinkState::Waiting {
                retry_at_ms,
                failures,
            } if now_ms >= retry_at_ms => {
                if let Some(creds) = self.credentials.clone() {
                    let _ = self.try_associate(&creds, failures, now_ms);
                }
            }
            LinkState::Waiting { .. } => {}
        }
    }

    fn try_associate(&mut self, creds: &WifiCredentials, failures: u32, now_ms: u64) -> Result<(), WifiError> {
        self.state = LinkState::Associating {
            since_ms: now_ms,
            failures,
        };
        self.platform_connect(creds).inspect_err(|e| {
            warn!("WiFi: {} (failure {})", e, failures + 1);
            self.wait(failures + 1, now_ms);
        })
    }

    fn wait(&mut self, failures: u32, now_ms: u64) {
        self.state = LinkState::Waiting {
            retry_at_ms: now_ms + self.backoff.take(),
            failures,
        };
    }
}

impl Default for WifiAdapter {
    fn default() -> Self {
        Self::new()
    }
}

// ── ESP-IDF driver ────────────────────────────────────────────

#[cfg(target_os = "espidf")]
impl WifiAdapter {
    /// Hand over the driver built in `main` from the modem peripheral.
    pub fn attach(&mut self, driver: EspWifi<'static>) {
        self.driver = Some(driver);
    }

    fn platform_connect(&mut self, creds: &WifiCredentials) -> Result<(), WifiError> {
        let wifi = self.driver.as_mut().ok_or(WifiError::Association)?;
        let config = Configuration::Client(ClientConfiguration {
            ssid: creds.ssid.as_str().try_into().map_err(|_| WifiError::BadSsid)?,
            password: creds
                .password
                .as_str()
                .try_into()
                .map_err(|_| WifiError::BadPassword)?,
            auth_method: if creds.is_open() {
                AuthMethod::None
            } else {
                AuthMethod::WPA2Personal
            },
            ..Default::default()
        });
        wifi.set_configuration(&config)
            .map_err(|_| WifiError::Association)?;
        if !wifi.is_started().unwrap_or(false) {
            wifi.start().map_err(|_| WifiError::Association)?;
        }
        wifi.connect().map_err(|_| WifiError::Association)
    }

    fn platform_is_connected(&self) -> bool {
        self.driver
            .as_ref()
            .is_some_and(|w| w.is_connected().unwrap_or(false))
    }

    fn platform_rssi(&self) -> Option<i8> {
        // SAFETY: plain C struct, all-zero is a valid value.
        let mut info: esp_idf_svc::sys::wifi_ap_record_t = unsafe { core::mem::zeroed() };
        // SAFETY: `info` is a valid out-pointer for the duration of the call.
        let ret = unsafe { esp_idf_svc::sys::esp_wifi_sta_get_ap_info(&mut info) };
        (ret == esp_idf_svc::sys::ESP_OK).then_some(info.rssi)
    }
}

// ── Host simulation ───────────────────────────────────────────

#[cfg(not(target_os = "espidf"))]
impl WifiAdapter {
    /// Bring the simulated access point up or down.
    pub fn set_sim_ap(&mut self, up: bool) {
        self.sim_ap_up = up;
    }

    fn platform_connect(&mut self, _creds: &WifiCredentials) -> Result<(), WifiError> {
        if self.sim_ap_up {
            Ok(())
        } else {
            Err(WifiError::Association)
        }
    }

    fn platform_is_connected(&self) -> bool {
        self.sim_ap_up && matches!(self.state, LinkState::Associating { .. } | LinkState::Up)
    }

    fn platform_rssi(&self) -> Option<i8> {
        Some(-61)
    }
}

impl ConnectivityPort for WifiAdapter {
    fn is_connected(&self) -> bool {
        self.state == LinkState::Up && self.platform_is_connected()
    }

    fn signal_strength(&self) -> Option<i8> {
        self.rssi.filter(|_| self.is_connected())
    }
}
