//! Service configuration

use std::time::Duration;

/// Runtime configuration for the player service
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP listen port
    pub port: u16,
    /// Interval between position samples while audible
    pub position_interval: Duration,
    /// Idle time after which an inactive session tears itself down
    pub watchdog_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 5750,
            position_interval: Duration::from_millis(500),
            watchdog_timeout: Duration::from_secs(60),
        }
    }
}
