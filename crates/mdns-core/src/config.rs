//! Configuration types for the mDNS publisher
//!
//! Configuration is read once at startup and never re-read. The address
//! source mode in particular is fixed for the lifetime of the process.

use serde::{Deserialize, Serialize};

/// Main publisher configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublisherConfig {
    /// Where the device address comes from
    #[serde(default)]
    pub address: AddressSourceConfig,

    /// Identity/address provider connection
    pub identity: IdentityConfig,

    /// Optional engine settings
    #[serde(default)]
    pub engine: EngineConfig,
}

impl PublisherConfig {
    /// Create a configuration in provider mode with default engine settings
    pub fn new(identity: IdentityConfig) -> Self {
        Self {
            address: AddressSourceConfig::default(),
            identity,
            engine: EngineConfig::default(),
        }
    }

    /// Select fixed-interface mode
    pub fn with_interface(mut self, name: impl Into<String>) -> Self {
        self.address = AddressSourceConfig::Interface { name: name.into() };
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        self.address.validate()?;
        self.identity.validate()?;
        self.engine.validate()?;
        Ok(())
    }
}

/// Address source configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AddressSourceConfig {
    /// Read the IPv4 address of a fixed local interface
    Interface {
        /// Network interface name (e.g., "eth0")
        name: String,
    },

    /// Ask the identity provider for the primary-route address
    #[default]
    Provider,
}

impl AddressSourceConfig {
    /// Validate the address source configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            AddressSourceConfig::Interface { name } => {
                if name.trim().is_empty() {
                    return Err(crate::Error::config("Interface name cannot be empty"));
                }
                Ok(())
            }
            AddressSourceConfig::Provider => Ok(()),
        }
    }

    /// The configured interface, if in fixed-interface mode
    pub fn interface(&self) -> Option<&str> {
        match self {
            AddressSourceConfig::Interface { name } => Some(name),
            AddressSourceConfig::Provider => None,
        }
    }
}

/// Identity/address provider configuration
///
/// Required in both address modes: the device name always comes from the
/// provider.
#[derive(Clone, Serialize, Deserialize)]
pub struct IdentityConfig {
    /// Base URL of the supervisor API (e.g., "http://127.0.0.1:48484")
    pub base_url: String,

    /// Supervisor API key
    pub api_key: String,
}

// Custom Debug implementation that hides the API key
impl std::fmt::Debug for IdentityConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"<REDACTED>")
            .finish()
    }
}

impl IdentityConfig {
    /// Create a new identity provider configuration
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    /// Validate the identity provider configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.base_url.is_empty() {
            return Err(crate::Error::config("Supervisor address cannot be empty"));
        }
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(crate::Error::config(format!(
                "Supervisor address must use HTTP or HTTPS scheme. Got: {}",
                self.base_url
            )));
        }
        if self.api_key.is_empty() {
            return Err(crate::Error::config("Supervisor API key cannot be empty"));
        }
        Ok(())
    }
}

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Pause between reconciliation ticks (in seconds)
    #[serde(default = "default_tick_interval_secs")]
    pub tick_interval_secs: u64,

    /// Delay between identity provider retries (in seconds)
    #[serde(default = "default_retry_delay_secs")]
    pub retry_delay_secs: u64,

    /// Domain appended to the device name (`foo` -> `foo.local`)
    #[serde(default = "default_domain")]
    pub domain: String,

    /// Capacity of the reconciler event channel
    ///
    /// When full, events are dropped (with a warning log).
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

impl EngineConfig {
    /// Validate the engine configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.tick_interval_secs == 0 {
            return Err(crate::Error::config("Tick interval must be > 0"));
        }
        if self.retry_delay_secs == 0 {
            return Err(crate::Error::config("Retry delay must be > 0"));
        }
        if self.domain.is_empty() || self.domain.starts_with('.') || self.domain.ends_with('.') {
            return Err(crate::Error::config(format!(
                "Domain must be non-empty without leading or trailing dots. Got: '{}'",
                self.domain
            )));
        }
        if self.event_channel_capacity == 0 {
            return Err(crate::Error::config("Event channel capacity must be > 0"));
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tick_interval_secs: default_tick_interval_secs(),
            retry_delay_secs: default_retry_delay_secs(),
            domain: default_domain(),
            event_channel_capacity: default_event_channel_capacity(),
        }
    }
}

fn default_tick_interval_secs() -> u64 {
    10
}

fn default_retry_delay_secs() -> u64 {
    10
}

fn default_domain() -> String {
    "local".to_string()
}

fn default_event_channel_capacity() -> usize {
    100
}
