use crate::error::{WatchdogError, WatchdogResult};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

static MAC_ADDRESS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^([0-9a-f]{2}:){5}[0-9a-f]{2}$").expect("valid MAC regex"));

// CoreBluetooth hands out per-host UUIDs instead of MAC addresses
static PLATFORM_UUID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}$")
        .expect("valid UUID regex")
});

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryData {
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// A configured device, as the host hands it to the integration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigEntry {
    pub entry_id: String,
    #[serde(default)]
    pub title: String,
    pub data: EntryData,
}

impl ConfigEntry {
    pub fn new(entry_id: impl Into<String>, address: impl Into<String>) -> Self {
        let address = address.into();
        Self {
            entry_id: entry_id.into(),
            title: address.clone(),
            data: EntryData {
                address,
                name: None,
            },
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.title = name.clone();
        self.data.name = Some(name);
        self
    }

    /// Load and validate an entry from a JSON file
    pub fn from_file(path: &Path) -> WatchdogResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        let entry: ConfigEntry = serde_json::from_str(&contents)?;
        entry.validate()?;
        Ok(entry)
    }

    pub fn validate(&self) -> WatchdogResult<()> {
        if self.entry_id.trim().is_empty() {
            return Err(WatchdogError::InvalidConfig {
                message: "entry_id must not be empty".to_string(),
            });
        }
        if !is_valid_address(&self.data.address) {
            return Err(WatchdogError::InvalidConfig {
                message: format!("Invalid device address: {}", self.data.address),
            });
        }
        Ok(())
    }

    pub fn address(&self) -> &str {
        &self.data.address
    }

    /// Name shown for the device; falls back to the title, then the address.
    pub fn device_name(&self) -> &str {
        match self.data.name.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ if !self.title.is_empty() => &self.title,
            _ => &self.data.address,
        }
    }
}

pub fn is_valid_address(address: &str) -> bool {
    MAC_ADDRESS.is_match(address) || PLATFORM_UUID.is_match(address)
}
