use std::time::Duration;

pub const DOMAIN: &str = "hughes_power_watchdog";

pub const MANUFACTURER: &str = "Hughes";
pub const MODEL: &str = "Power Watchdog";

/// How often the watchdog task checks (and restores) the device connection
/// while monitoring is enabled.
pub const CONNECTION_CHECK_INTERVAL: Duration = Duration::from_secs(30);

// Entity keys
pub const SWITCH_MONITORING: &str = "monitoring";
