//! Wall-clock adapter.
//!
//! Turns local time into the planner's [`PlannerEntry`] (weekday plus
//! seconds since midnight) and tracks monotonic uptime for feed lockouts.
//!
//! - **`target_os = "espidf"`**: `gettimeofday()` + `localtime_r()`;
//!   reports `None` until something has set the system clock.  This
//!   adapter does not start SNTP itself: the clock source (SNTP once a
//!   network is up, an RTC, or a companion app) is owned by whoever
//!   brings up networking.
//! - **`not(target_os = "espidf")`**: `chrono::Local` for host-side
//!   simulation.

use crate::planner::{PlannerEntry, Weekday};

/// 2020-01-01T00:00:00Z.  An unset ESP32 clock starts at the epoch.
pub const CLOCK_SYNCED_AFTER: i64 = 1_577_836_800;

/// Whether a Unix timestamp looks like a set wall clock.
pub fn is_synced(unix_secs: i64) -> bool {
    unix_secs >= CLOCK_SYNCED_AFTER
}

/// Time adapter for the feeder.
pub struct WallClock {
    #[cfg(not(target_os = "espidf"))]
    start: std::time::Instant,
}

impl Default for WallClock {
    fn default() -> Self {
        Self::new()
    }
}

impl WallClock {
    pub fn new() -> Self {
        Self {
            #[cfg(not(target_os = "espidf"))]
            start: std::time::Instant::now(),
        }
    }

    /// Seconds since boot (monotonic).
    #[cfg(target_os = "espidf")]
    pub fn uptime_secs(&self) -> u64 {
        (unsafe { esp_idf_svc::sys::esp_timer_get_time() }) as u64 / 1_000_000
    }

    /// Seconds since boot (monotonic).
    #[cfg(not(target_os = "espidf"))]
    pub fn uptime_secs(&self) -> u64 {
        self.start.elapsed().as_secs()
    }

    /// Current local weekday and time of day.  `None` if the wall clock
    /// has not been synced yet.
    #[cfg(target_os = "espidf")]
    pub fn now(&self) -> Option<PlannerEntry> {
        use core::ptr;
        let mut tv = esp_idf_svc::sys::timeval {
            tv_sec: 0,
            tv_usec: 0,
        };
        if unsafe { esp_idf_svc::sys::gettimeofday(&mut tv, ptr::null_mut()) } != 0 {
            return None;
        }
        if !is_synced(tv.tv_sec as i64) {
            return None;
        }
        let secs = tv.tv_sec as esp_idf_svc::sys::time_t;
        let mut tm: esp_idf_svc::sys::tm = unsafe { core::mem::zeroed() };
        if unsafe { esp_idf_svc::sys::localtime_r(&secs, &mut tm) }.is_null() {
            return None;
        }
        // tm_wday counts from Sunday.
        let weekday = Weekday::from_index(((tm.tm_wday + 6) % 7) as u8)?;
        let hour = u8::try_from(tm.tm_hour).ok()?;
        let minute = u8::try_from(tm.tm_min).ok()?;
        // tm_sec may be 60 on a leap second.
        let second = u8::try_from(tm.tm_sec).ok()?.min(59);
        PlannerEntry::at(weekday, hour, minute, second)
    }

    /// Current local weekday and time of day.
    #[cfg(not(target_os = "espidf"))]
    pub fn now(&self) -> Option<PlannerEntry> {
        Some(from_chrono(&chrono::Local::now().naive_local()))
    }
}

/// Map a chrono timestamp onto a planner entry.
#[cfg(not(target_os = "espidf"))]
pub fn from_chrono(dt: &chrono::NaiveDateTime) -> PlannerEntry {
    use chrono::{Datelike, Timelike};

    let weekday = match dt.weekday() {
        chrono::Weekday::Mon => Weekday::Monday,
        chrono::Weekday::Tue => Weekday::Tuesday,
        chrono::Weekday::Wed => Weekday::Wednesday,
        chrono::Weekday::Thu => Weekday::Thursday,
        chrono::Weekday::Fri => Weekday::Friday,
        chrono::Weekday::Sat => Weekday::Saturday,
        chrono::Weekday::Sun => Weekday::Sunday,
    };
    // `num_seconds_from_midnight` folds a leap second into second 59.
    PlannerEntry::new(weekday, dt.num_seconds_from_midnight().min(86_399))
}
