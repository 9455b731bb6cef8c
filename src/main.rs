//! MohnNode firmware entry point.
//!
//! Hexagonal architecture with a single cooperative loop.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  NvsStore          WifiAdapter        HttpClientTransport      │
//! │  (Persistence)     (Connectivity)     (HttpTransport)          │
//! │  LogEventSink      Esp32TimeAdapter   StatusLed · Button       │
//! │  (EventSink)       (uptime)           (GPIO)                   │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │              NodeService (pure logic)                  │    │
//! │  │  Scheduler · Creature · HeartbeatClient · Status       │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use anyhow::Result;
use log::{info, warn};

use esp_idf_hal::delay::FreeRtos;
use esp_idf_hal::gpio::{PinDriver, Pull};
use esp_idf_hal::peripherals::Peripherals;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::wifi::EspWifi;

use mohnnode::adapters::device_id;
use mohnnode::adapters::http::HttpClientTransport;
use mohnnode::adapters::log_sink::LogEventSink;
use mohnnode::adapters::nvs::NvsStore;
use mohnnode::adapters::time::Esp32TimeAdapter;
use mohnnode::adapters::wifi::WifiAdapter;
use mohnnode::app::commands::CommandOutcome;
use mohnnode::app::service::{BootInfo, NodeService};
use mohnnode::capabilities::DeviceCapabilities;
use mohnnode::config;
use mohnnode::drivers::led_patterns::LedPatternEngine;
use mohnnode::drivers::status_led::StatusLed;
use mohnnode::input::{ButtonGestures, InputMap};
use mohnnode::pins;

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  MohnNode v{}                        ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    let peripherals = Peripherals::take()?;
    let sysloop = EspSystemEventLoop::take()?;
    let time = Esp32TimeAdapter::new();

    // ── 2. Persistence + config ───────────────────────────────
    let mut store = NvsStore::init().map_err(|e| anyhow::anyhow!("NVS init failed: {}", e))?;
    let config = config::load_config(&store);
    let caps = DeviceCapabilities::for_tier(config.device_tier);
    info!("Capabilities: {:?}", caps);

    // ── 3. GPIO ───────────────────────────────────────────────
    let mut led = StatusLed::new(
        PinDriver::output(peripherals.pins.gpio2)?,
        pins::STATUS_LED_ACTIVE_LOW,
    );
    let mut button = PinDriver::input(peripherals.pins.gpio0)?;
    button.set_pull(Pull::Up)?;

    // ── 4. WiFi ───────────────────────────────────────────────
    let mut wifi = WifiAdapter::new();
    wifi.attach(EspWifi::new(peripherals.modem, sysloop, None)?);
    match wifi.load_credentials(&store) {
        Ok(()) => {
            if let Err(e) = wifi.connect(time.uptime_ms()) {
                warn!("WiFi: initial connect failed ({}), will retry", e);
            }
        }
        Err(e) => warn!("WiFi: no usable credentials ({}), running offline", e),
    }

    // ── 5. Application service ────────────────────────────────
    let mut sink = LogEventSink::new();
    let boot = BootInfo {
        mac: device_id::read_mac(),
        nonce: device_id::entropy_nonce(),
    };
    let mut node = NodeService::boot(
        config,
        caps,
        HttpClientTransport::new(),
        boot,
        time.uptime_ms(),
        &mut store,
        &mut sink,
    );

    let mut gestures = ButtonGestures::new();
    let mut led_engine = LedPatternEngine::new();
    let loop_ms = node.config().loop_interval_ms;
    let mut last_ms = time.uptime_ms();

    info!("System ready. Entering main loop.");

    // ── 6. Cooperative loop ───────────────────────────────────
    loop {
        let now_ms = time.uptime_ms();
        wifi.poll(now_ms);

        if let Some(gesture) = gestures.poll(button.is_low(), now_ms) {
            let cmd = InputMap::command_for(gesture);
            info!("Button: {:?} → {:?}", gesture, cmd);
            if node.handle_command(cmd, now_ms, &mut store, &wifi, &mut sink)
                == CommandOutcome::RestartRequired
            {
                FreeRtos::delay_ms(500);
                esp_idf_hal::reset::restart();
            }
        }

        let pattern = node.tick(now_ms, &mut store, &wifi, &mut sink);
        let delta = now_ms.saturating_sub(last_ms) as u32;
        last_ms = now_ms;
        led.set(led_engine.tick(pattern, delta));

        FreeRtos::delay_ms(loop_ms);
    }
}
