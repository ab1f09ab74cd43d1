//! PetFeeder Firmware: Main Entry Point
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │     NvsAdapter            LogEventSink          WallClock      │
//! │     (Storage+Config)      (EventSink)           (local time)   │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │             FeederService (pure logic)                 │    │
//! │  │        RecordChain (net, feed) · Planner               │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use std::time::Duration;

use anyhow::Result;
use log::{info, warn};

use petfeeder::adapters::log_sink::LogEventSink;
use petfeeder::adapters::nvs::NvsAdapter;
use petfeeder::adapters::time::WallClock;
use petfeeder::app::ports::ConfigPort;
use petfeeder::app::service::FeederService;
use petfeeder::config::SystemConfig;
use petfeeder::planner::PlannerEntry;

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("PetFeeder v{}", env!("CARGO_PKG_VERSION"));

    // ── 2. Storage + config ───────────────────────────────────
    let mut nvs = match NvsAdapter::new() {
        Ok(n) => n,
        Err(e) => {
            // Records fall back to defaults and nothing persists this
            // session; NVS self-heals on the next boot.
            warn!("NVS init failed ({}), running without persistence", e);
            NvsAdapter::default()
        }
    };
    let config = match nvs.load() {
        Ok(cfg) => cfg,
        Err(e) => {
            warn!("NVS config load failed ({}), using defaults", e);
            SystemConfig::default()
        }
    };

    // ── 3. Records + planner ──────────────────────────────────
    let mut sink = LogEventSink::new();
    let mut feeder = FeederService::new(&config)?;
    feeder.boot(&mut nvs, &mut sink);

    if let Some(net) = feeder.network() {
        if net.dhcp_enabled() {
            info!("Network: DHCP");
        } else {
            info!(
                "Network: static {} / {} via {}",
                net.ip_addr(),
                net.subnet_mask(),
                net.gateway()
            );
        }
    }

    // ── 4. Main loop ──────────────────────────────────────────
    // Scheduled feedings need a set wall clock.  Nothing here starts SNTP:
    // until the clock is set (by SNTP once networking is up, or an RTC)
    // only periodic feedings run.
    let clock = WallClock::new();
    let tick = Duration::from_millis(u64::from(config.tick_interval_ms));
    let mut prev_now: Option<PlannerEntry> = None;
    let mut last_feed_uptime: Option<u64> = None;
    let mut warned_unsynced = false;

    loop {
        let uptime = clock.uptime_secs();

        match clock.now() {
            Some(now) => {
                if let Some(entry) = prev_now.and_then(|prev| feeder.feed_due(prev, now)) {
                    info!(
                        "Scheduled feeding {}: dispense {} portion(s)",
                        entry,
                        feeder.portions()
                    );
                    last_feed_uptime = Some(uptime);
                    if let Some(next) = feeder.next_feed_after(now) {
                        info!("Next feeding {} (in {} s)", next.entry, next.secs_until);
                    }
                }
                prev_now = Some(now);
            }
            None if !warned_unsynced => {
                warn!("Wall clock not set, scheduled feedings paused");
                warned_unsynced = true;
            }
            None => {}
        }

        // Fixed-period feedings run off uptime, independent of the clock.
        let since_last = last_feed_uptime.map_or(uptime, |t| uptime - t);
        if feeder.periodic_feed_due(u32::try_from(since_last).unwrap_or(u32::MAX)) {
            info!("Periodic feeding: dispense {} portion(s)", feeder.portions());
            last_feed_uptime = Some(uptime);
        }

        // Retry write-back of anything a previous save left dirty.
        if feeder.has_unsaved_changes() {
            let _ = feeder.persist(&mut nvs, &mut sink);
        }

        std::thread::sleep(tick);
    }
}
