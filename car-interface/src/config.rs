//! Fingerprinting configuration
//!
//! Timing constants for the fingerprint loop, the bus/address filter and the
//! simulator override switches.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Environment switch selecting the second simulator (checked first)
pub const SIMULATOR2_ENV: &str = "SIMULATOR2";
/// Environment switch selecting the simulator
pub const SIMULATOR_ENV: &str = "SIMULATOR";

/// Simulator override that bypasses fingerprinting entirely
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Simulator {
    Simulator,
    Simulator2,
}

impl Simulator {
    /// Sentinel model identifier reported for this simulator
    pub fn model(&self) -> &'static str {
        match self {
            Simulator::Simulator => "simulator",
            Simulator::Simulator2 => "simulator2",
        }
    }

    /// Read the override from the process environment
    pub fn from_env() -> Option<Self> {
        if std::env::var_os(SIMULATOR2_ENV).is_some() {
            Some(Simulator::Simulator2)
        } else if std::env::var_os(SIMULATOR_ENV).is_some() {
            Some(Simulator::Simulator)
        } else {
            None
        }
    }
}

/// Configuration for the fingerprint engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FingerprintConfig {
    /// Delay between two drains of the frame source
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,

    /// Session timeout when only observing traffic
    #[serde(default = "default_passive_timeout")]
    pub passive_timeout_ms: u64,

    /// Settle duration for a single remaining candidate
    #[serde(default = "default_settle")]
    pub settle_ms: u64,

    /// Settle duration for families whose control units broadcast late
    #[serde(default = "default_slow_settle")]
    pub slow_settle_ms: u64,

    /// Model name markers identifying slow-broadcast families
    #[serde(default = "default_slow_markers")]
    pub slow_broadcast_markers: Vec<String>,

    /// Only frames on this bus take part in fingerprinting
    #[serde(default)]
    pub fingerprint_bus: u8,

    /// Only addresses below this limit take part in fingerprinting
    #[serde(default = "default_max_address")]
    pub max_address: u32,

    /// Optional simulator override
    #[serde(default)]
    pub simulator: Option<Simulator>,
}

fn default_poll_interval() -> u64 {
    10
}

fn default_passive_timeout() -> u64 {
    2000
}

fn default_settle() -> u64 {
    100
}

fn default_slow_settle() -> u64 {
    1000
}

fn default_slow_markers() -> Vec<String> {
    vec!["TOYOTA".to_string(), "LEXUS".to_string()]
}

fn default_max_address() -> u32 {
    crate::types::STANDARD_ID_LIMIT
}

impl Default for FingerprintConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval(),
            passive_timeout_ms: default_passive_timeout(),
            settle_ms: default_settle(),
            slow_settle_ms: default_slow_settle(),
            slow_broadcast_markers: default_slow_markers(),
            fingerprint_bus: 0,
            max_address: default_max_address(),
            simulator: None,
        }
    }
}

impl FingerprintConfig {
    /// Create a new configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: set the poll interval
    pub fn with_poll_interval_ms(mut self, ms: u64) -> Self {
        self.poll_interval_ms = ms;
        self
    }

    /// Builder method: set the passive-mode timeout
    pub fn with_passive_timeout_ms(mut self, ms: u64) -> Self {
        self.passive_timeout_ms = ms;
        self
    }

    /// Builder method: set both settle durations
    pub fn with_settle_ms(mut self, settle_ms: u64, slow_settle_ms: u64) -> Self {
        self.settle_ms = settle_ms;
        self.slow_settle_ms = slow_settle_ms;
        self
    }

    /// Builder method: add a slow-broadcast marker
    pub fn add_slow_broadcast_marker(mut self, marker: impl Into<String>) -> Self {
        self.slow_broadcast_markers.push(marker.into());
        self
    }

    /// Builder method: force a simulator override
    pub fn with_simulator(mut self, simulator: Option<Simulator>) -> Self {
        self.simulator = simulator;
        self
    }

    /// Builder method: pick up `SIMULATOR2` / `SIMULATOR` from the environment
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(simulator) = Simulator::from_env() {
            self.simulator = Some(simulator);
        }
        self
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Timeout for a session: bounded when passive, unbounded otherwise
    pub fn timeout(&self, passive: bool) -> Option<Duration> {
        passive.then(|| Duration::from_millis(self.passive_timeout_ms))
    }

    /// Required settle duration before a sole candidate is accepted
    pub fn settle_duration(&self, candidate: &str) -> Duration {
        let slow = self
            .slow_broadcast_markers
            .iter()
            .any(|marker| candidate.contains(marker.as_str()));
        if slow {
            Duration::from_millis(self.slow_settle_ms)
        } else {
            Duration::from_millis(self.settle_ms)
        }
    }

    /// Check if a frame takes part in fingerprinting
    pub fn is_fingerprint_frame(&self, bus: u8, address: u32) -> bool {
        bus == self.fingerprint_bus && address < self.max_address
    }
}
