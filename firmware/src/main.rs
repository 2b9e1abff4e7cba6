//! TftClock Firmware — Main Entry Point
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                   Adapters (outer ring)                    │
//! │                                                            │
//! │  ClockFace (DisplayPort)   SntpAdapter (TimePort)          │
//! │  WifiAdapter (Connectivity)   NvsAdapter (CredentialPort)  │
//! │  LogEventSink (EventSink)                                  │
//! │                                                            │
//! │  ──────────────── Port Trait Boundary ───────────────      │
//! │                                                            │
//! │      ┌──────────────────────────────────────────────┐      │
//! │      │        ClockService (pure logic)             │      │
//! │      └──────────────────────────────────────────────┘      │
//! │                                                            │
//! │  SystemConfig — frozen once at boot, read-only afterwards  │
//! └────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use std::time::Duration;

use anyhow::Result;
use log::{error, info, warn};

use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::hal::peripherals::Peripherals;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use esp_idf_svc::wifi::{BlockingWifi, EspWifi};

use tftclock::adapters::log_sink::LogEventSink;
use tftclock::adapters::nvs::NvsAdapter;
use tftclock::adapters::sntp::SntpAdapter;
use tftclock::adapters::wifi::{ConnectivityPort, WifiAdapter};
use tftclock::app::ports::{ConfigError, CredentialPort, SyncError};
use tftclock::app::service::ClockService;
use tftclock::config::{self, SystemConfig};
use tftclock::credentials::WifiCredentials;
use tftclock::drivers::hw_init;

/// Main loop period.  Short enough that the seconds digits never lag.
const LOOP_PERIOD: Duration = Duration::from_millis(250);
const LOOPS_PER_SEC: u32 = 4;

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  TftClock v{}                        ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Resolve and freeze config ──────────────────────────
    let nvs = match NvsAdapter::new() {
        Ok(n) => Some(n),
        Err(e) => {
            warn!("NVS init failed ({}), running without persistence", e);
            None
        }
    };
    let stored = nvs.as_ref().and_then(|n| match n.load() {
        Ok(creds) => Some(creds),
        Err(e) => {
            info!("No stored credentials ({})", e);
            None
        }
    });
    let build = SystemConfig::from_build_env();
    let from_build = build.wifi.is_complete();
    let resolved = config::resolve(build, stored, WifiCredentials::from_env());

    if let Err(e) = resolved.display.validate() {
        warn!("Config: {} (panel will not start)", ConfigError::from(e));
    }
    if let Err(e) = resolved.ntp.validate() {
        warn!("Config: {} (time sync disabled)", e);
    }
    match resolved.wifi.validate() {
        Ok(()) if from_build => {
            // Persist injected credentials so later builds can omit them.
            if let Some(n) = nvs.as_ref() {
                if let Err(e) = n.save(&resolved.wifi) {
                    warn!("Credential save failed: {}", e);
                }
            }
        }
        Ok(()) => {}
        Err(e) => warn!("Config: {} (clock will run without network)", e),
    }
    let config = config::install(resolved)?;
    info!(
        "Config: TFT DC=GPIO{} CS=GPIO{}, SSID='{}', NTP={} utc{:+}",
        config.display.dc,
        config.display.cs,
        config.wifi.ssid,
        config.ntp.effective_server(),
        config.ntp.utc_offset_hours
    );

    // ── 3. Peripherals ────────────────────────────────────────
    let peripherals = Peripherals::take()?;
    let sysloop = EspSystemEventLoop::take()?;
    let nvs_partition = EspDefaultNvsPartition::take()?;

    let mut display = hw_init::init_display(peripherals.spi2, &config.display)?;

    let driver = BlockingWifi::wrap(
        EspWifi::new(peripherals.modem, sysloop.clone(), Some(nvs_partition))?,
        sysloop,
    )?;
    let mut wifi = WifiAdapter::new(driver);
    let mut sntp = SntpAdapter::new();
    let mut sink = LogEventSink::new();

    // ── 4. Clock service ──────────────────────────────────────
    let mut clock = ClockService::new(config);
    clock.start(&mut sink);

    match wifi.set_credentials(&config.wifi) {
        Ok(()) => {
            if let Err(e) = wifi.connect() {
                warn!("WiFi: initial connect failed ({}), will retry", e);
            }
        }
        Err(e) => warn!("WiFi: disabled ({})", e),
    }

    info!("System ready. Entering main loop.");

    // ── 5. Main loop ──────────────────────────────────────────
    let mut sync_started = false;
    let mut sync_reported = false;
    let mut loops: u32 = 0;

    loop {
        let online = wifi.is_connected();
        clock.set_network_up(online);

        if online && !sync_started {
            match clock.begin_sync(&mut sntp) {
                Ok(()) => sync_started = true,
                Err(e @ SyncError::InvalidSettings) => {
                    // Retrying cannot help; the settings are frozen.
                    error!("SNTP: {}", e);
                    sync_started = true;
                }
                Err(e) => error!("SNTP: {}", e),
            }
        }
        if sync_started && !sync_reported && sntp.is_synced() {
            info!("SNTP: first exchange completed");
            sync_reported = true;
        }

        clock.tick(&sntp, &mut display.face, &mut sink);

        loops = loops.wrapping_add(1);
        if loops % LOOPS_PER_SEC == 0 {
            wifi.poll();
        }

        std::thread::sleep(LOOP_PERIOD);
    }
}
