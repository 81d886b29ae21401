use serde::{Serialize, Deserialize};
use std::collections::HashSet;
use std::fs;
use std::io::Write;
use std::path::Path;
use std::time::Duration;

use crate::error::ConfigError;

/// One button + LED + project triple. Fixed for the process lifetime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelConfig {
    pub project: String,
    pub button_pin: u8,
    pub led_pin: u8,
}

impl ChannelConfig {
    fn new(project: &'static str, button_pin: u8, led_pin: u8) -> Self {
        ChannelConfig {
            project: String::from(project),
            button_pin,
            led_pin,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteConfig {
    pub host: String,
    pub port: u16,
    /// Upper bound for one request, connect to last byte
    pub timeout_ms: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        RemoteConfig {
            host: String::from("timetracker.local"),
            port: 8080,
            timeout_ms: 5000,
        }
    }
}

impl RemoteConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimingConfig {
    pub debounce_ms: u64,
    pub snapshot_interval_ms: u64,
    pub tick_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        TimingConfig {
            debounce_ms: 50,
            snapshot_interval_ms: 10_000,
            tick_ms: 10,
        }
    }
}

impl TimingConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn snapshot_interval(&self) -> Duration {
        Duration::from_millis(self.snapshot_interval_ms)
    }

    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }
}

/// The network link is brought up by the OS; we only watch its state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkConfig {
    pub interface: String,
}

impl Default for LinkConfig {
    fn default() -> Self {
        LinkConfig {
            interface: String::from("wlan0"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub channels: Vec<ChannelConfig>,
    #[serde(default)]
    pub remote: RemoteConfig,
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default)]
    pub link: LinkConfig,
}

impl Default for Config {
    fn default() -> Self {
        let mut channels = Vec::new();
        channels.push(ChannelConfig::new("KraftBank", 6, 1));
        channels.push(ChannelConfig::new("MindFit", 7, 2));
        channels.push(ChannelConfig::new("Internal", 8, 3));

        Config {
            channels,
            remote: RemoteConfig::default(),
            timing: TimingConfig::default(),
            link: LinkConfig::default(),
        }
    }
}

impl Config {
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;

        let mut file = fs::File::create(path)?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        let loaded: Config = serde_json::from_str(&content)?;
        loaded.validate()?;
        Ok(loaded)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.channels.is_empty() {
            return Err(invalid("no channels configured"));
        }

        let mut projects = HashSet::new();
        let mut pins = HashSet::new();
        for channel in &self.channels {
            if channel.project.is_empty() {
                return Err(invalid("empty project name"));
            }
            if !projects.insert(channel.project.as_str()) {
                return Err(invalid(format!("project {} configured twice", channel.project)));
            }
            for pin in [channel.button_pin, channel.led_pin] {
                if !pins.insert(pin) {
                    return Err(invalid(format!("GPIO {} used twice", pin)));
                }
            }
        }

        let timing = &self.timing;
        if timing.debounce_ms == 0 || timing.snapshot_interval_ms == 0 || timing.tick_ms == 0 {
            return Err(invalid("timing values must be non-zero"));
        }
        if self.remote.timeout_ms == 0 {
            return Err(invalid("remote timeout must be non-zero"));
        }
        if self.link.interface.is_empty() {
            return Err(invalid("link interface must be named"));
        }

        Ok(())
    }

    pub fn button_pins(&self) -> Vec<u8> {
        self.channels.iter().map(|c| c.button_pin).collect()
    }

    pub fn led_pins(&self) -> Vec<u8> {
        self.channels.iter().map(|c| c.led_pin).collect()
    }
}

fn invalid(reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid(reason.into())
}
